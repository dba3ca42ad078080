use rocket::{http::Status, serde::json::Json, Catcher, Request, Route};

use crate::error::ErrorBody;

mod auth;
mod candidates;
mod chat;
mod clubs;
mod elections;
mod results;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(auth::routes());
    routes.extend(clubs::routes());
    routes.extend(elections::routes());
    routes.extend(candidates::routes());
    routes.extend(voting::routes());
    routes.extend(results::routes());
    routes.extend(chat::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![json_error]
}

/// Give errors raised outside handlers (failed guards, unmatched routes) the same
/// JSON body as handler errors.
#[catch(default)]
fn json_error(status: Status, _req: &Request<'_>) -> (Status, Json<ErrorBody>) {
    let error = match status.code {
        401 => "Not authenticated".to_string(),
        403 => "Not authorized".to_string(),
        _ => status.reason_lossy().to_string(),
    };
    (status, Json(ErrorBody { error }))
}
