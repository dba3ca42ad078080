use rocket::{serde::json::Json, Route, State};

use crate::{
    chatbot::{respond, ChatConfig},
    model::api::chat::{ChatReply, ChatRequest},
};

pub fn routes() -> Vec<Route> {
    routes![chat]
}

/// Answer a help-desk question. Needs no login and never touches the database.
#[post("/chat", data = "<request>", format = "json")]
fn chat(request: Json<ChatRequest>, rules: &State<ChatConfig>) -> Json<ChatReply> {
    let reply = respond(rules, &request.message);
    if !reply.matched {
        debug!("No chatbot rule matched {:?}", request.message);
    }
    Json(reply)
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json::{self, json},
    };

    use super::*;

    async fn ask(client: &Client, message: &str) -> ChatReply {
        let response = client
            .post(uri!(chat))
            .header(ContentType::JSON)
            .body(json!(ChatRequest { message: message.to_string() }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    #[backend_test]
    async fn matched_reply(client: Client) {
        let reply = ask(&client, "How do I VOTE?").await;
        assert!(reply.matched);
        assert!(reply.reply.to_lowercase().contains("vote"));
    }

    #[backend_test]
    async fn fallback_reply(client: Client) {
        let reply = ask(&client, "What is the airspeed velocity of an unladen swallow?").await;
        assert!(!reply.matched);
        let fallback = ChatConfig::default();
        let expected = respond(&fallback, "");
        assert_eq!(reply, expected);
    }

    #[backend_test]
    async fn empty_message(client: Client) {
        let reply = ask(&client, "").await;
        assert!(!reply.matched);
    }
}
