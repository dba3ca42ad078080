use chrono::Utc;
use mongodb::{
    bson::{doc, DateTime as BsonDateTime},
    options::FindOptions,
};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    ledger::{completion_for, MongoStore},
    model::{
        api::{
            auth::{Admin, AuthToken, Authenticated},
            election::{
                ActiveElection, ActiveUpdate, ElectionDescription, ElectionSpec, ElectionSummary,
            },
        },
        db::{
            club::Club,
            election::{Election, NewElection},
            position::Position,
        },
        mongodb::{Coll, Id},
    },
};

use super::clubs::club_positions;

pub fn routes() -> Vec<Route> {
    routes![
        get_elections,
        get_active_elections,
        get_election,
        create_election,
        set_active,
    ]
}

#[get("/elections")]
async fn get_elections(elections: Coll<Election>) -> Result<Json<Vec<ElectionSummary>>> {
    let newest_first = FindOptions::builder()
        .sort(doc! { "start_time": -1, "_id": -1 })
        .build();
    let elections = elections
        .find(None, newest_first)
        .await?
        .map_ok(ElectionSummary::from)
        .try_collect()
        .await?;
    Ok(Json(elections))
}

/// Live elections, with the caller's progress through each.
#[get("/elections/active")]
async fn get_active_elections(
    token: AuthToken<Authenticated>,
    elections: Coll<Election>,
    store: MongoStore,
) -> Result<Json<Vec<ActiveElection>>> {
    let now = Utc::now();
    let filter = doc! {
        "active": true,
        "end_time": { "$gt": BsonDateTime::from_chrono(now) },
    };
    let by_end = FindOptions::builder()
        .sort(doc! { "end_time": 1, "_id": 1 })
        .build();
    let live: Vec<Election> = elections
        .find(filter, by_end)
        .await?
        .try_filter(|election| std::future::ready(election.is_live(now)))
        .try_collect()
        .await?;

    let mut active = Vec::with_capacity(live.len());
    for election in live {
        let completion = completion_for(&store, token.id, &election).await?;
        active.push(ActiveElection::new(election, completion));
    }
    Ok(Json(active))
}

#[get("/elections/<election_id>")]
async fn get_election(
    election_id: Id,
    elections: Coll<Election>,
    positions: Coll<Position>,
) -> Result<Json<ElectionDescription>> {
    let election = elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
    let positions = club_positions(&positions, election.club_id).await?;
    Ok(Json(ElectionDescription::new(election, positions)))
}

#[post("/admin/elections", data = "<spec>", format = "json")]
async fn create_election(
    _token: AuthToken<Admin>,
    spec: Json<ElectionSpec>,
    clubs: Coll<Club>,
    new_elections: Coll<NewElection>,
    elections: Coll<Election>,
    positions: Coll<Position>,
) -> Result<(Status, Json<ElectionDescription>)> {
    let election = NewElection::try_from(spec.0)?;
    if clubs.find_one(election.club_id.as_doc(), None).await?.is_none() {
        return Err(Error::not_found(format!("Club {}", election.club_id)));
    }

    let new_id: Id = new_elections
        .insert_one(&election, None)
        .await?
        .inserted_id
        .as_object_id()
        .expect("Inserted IDs are ObjectIds") // Safe because the ID comes directly from the DB.
        .into();
    let election = elections
        .find_one(new_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {new_id}")))?;
    info!("Created election {} ({new_id})", election.title);

    let positions = club_positions(&positions, election.club_id).await?;
    Ok((Status::Created, Json(ElectionDescription::new(election, positions))))
}

/// Open or close an election. The only change ever made to an election.
#[put("/admin/elections/<election_id>/active", data = "<update>", format = "json")]
async fn set_active(
    _token: AuthToken<Admin>,
    election_id: Id,
    update: Json<ActiveUpdate>,
    elections: Coll<Election>,
) -> Result<Json<ElectionSummary>> {
    let result = elections
        .update_one(
            election_id.as_doc(),
            doc! { "$set": { "active": update.active } },
            None,
        )
        .await?;
    if result.matched_count == 0 {
        return Err(Error::not_found(format!("Election {election_id}")));
    }
    info!("Election {election_id} active: {}", update.active);

    let election = elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
    Ok(Json(election.into()))
}
