use rocket::{http::Status, serde::json::Json, Route};

use crate::{
    error::Result,
    ledger::{cast_vote, MongoStore},
    model::api::{
        auth::{AuthToken, Student},
        ballot::{BallotDescription, VoteRequest},
    },
};

pub fn routes() -> Vec<Route> {
    routes![vote]
}

#[post("/vote", data = "<vote>", format = "json")]
async fn vote(
    token: AuthToken<Student>,
    vote: Json<VoteRequest>,
    store: MongoStore,
) -> Result<(Status, Json<BallotDescription>)> {
    let ballot = cast_vote(
        &store,
        token.id,
        vote.candidate_id,
        vote.election_id,
        vote.position_id,
    )
    .await?;
    Ok((Status::Created, Json(ballot.into())))
}
