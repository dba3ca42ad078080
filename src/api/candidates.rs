use std::collections::HashMap;

use chrono::Utc;
use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::{Admin, AuthToken, Student},
            candidate::{CandidateDescription, CandidateRegistration, StatementUpdate},
        },
        db::{
            candidate::{Candidate, NewCandidate},
            election::Election,
            position::Position,
            user::User,
        },
        mongodb::{is_duplicate_key_error, Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        get_candidates,
        register_candidate,
        get_all_candidates,
        approve_candidate,
        update_statement,
    ]
}

/// The approved candidates of an election.
#[get("/elections/<election_id>/candidates")]
async fn get_candidates(
    election_id: Id,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    users: Coll<User>,
) -> Result<Json<Vec<CandidateDescription>>> {
    find_election(&elections, election_id).await?;
    let filter = doc! {
        "election_id": election_id,
        "approved": true,
    };
    Ok(Json(describe(&candidates, filter, &users).await?))
}

/// Every candidacy of an election, approved or not.
#[get("/admin/elections/<election_id>/candidates")]
async fn get_all_candidates(
    _token: AuthToken<Admin>,
    election_id: Id,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    users: Coll<User>,
) -> Result<Json<Vec<CandidateDescription>>> {
    find_election(&elections, election_id).await?;
    let filter = doc! {
        "election_id": election_id,
    };
    Ok(Json(describe(&candidates, filter, &users).await?))
}

/// Stand for a position. The candidacy needs admin approval before it can receive votes.
#[post("/elections/<election_id>/candidates", data = "<registration>", format = "json")]
async fn register_candidate(
    token: AuthToken<Student>,
    election_id: Id,
    registration: Json<CandidateRegistration>,
    elections: Coll<Election>,
    positions: Coll<Position>,
    new_candidates: Coll<NewCandidate>,
    candidates: Coll<Candidate>,
    users: Coll<User>,
) -> Result<(Status, Json<CandidateDescription>)> {
    let election = find_election(&elections, election_id).await?;
    if election.has_ended(Utc::now()) {
        return Err(Error::bad_request(format!(
            "Election {election_id} has ended"
        )));
    }

    // The position must be one the election contests.
    let position_id = registration.position_id;
    let in_club = doc! {
        "_id": position_id,
        "club_id": election.club_id,
    };
    if positions.find_one(in_club, None).await?.is_none() {
        return Err(Error::not_found(format!(
            "Position {position_id} in election {election_id}"
        )));
    }

    let candidate = NewCandidate::new(
        token.id,
        election_id,
        position_id,
        registration.0.statement,
    );
    let new_id: Id = match new_candidates.insert_one(&candidate, None).await {
        Ok(result) => result
            .inserted_id
            .as_object_id()
            .expect("Inserted IDs are ObjectIds") // Safe because the ID comes directly from the DB.
            .into(),
        Err(e) if is_duplicate_key_error(&e) => {
            return Err(Error::Status(
                Status::Conflict,
                format!("Already standing for position {position_id}"),
            ));
        }
        Err(e) => return Err(e.into()),
    };
    info!("User {} registered as candidate {new_id}", token.id);

    let mut described = describe(&candidates, new_id.as_doc(), &users).await?;
    let candidate = described
        .pop()
        .ok_or_else(|| Error::not_found(format!("Candidate {new_id}")))?;
    Ok((Status::Created, Json(candidate)))
}

/// Approve a candidacy. Approving twice is harmless; there is no way to unapprove.
#[post("/admin/candidates/<candidate_id>/approve")]
async fn approve_candidate(
    _token: AuthToken<Admin>,
    candidate_id: Id,
    candidates: Coll<Candidate>,
    users: Coll<User>,
) -> Result<Json<CandidateDescription>> {
    let result = candidates
        .update_one(
            candidate_id.as_doc(),
            doc! { "$set": { "approved": true } },
            None,
        )
        .await?;
    if result.matched_count == 0 {
        return Err(Error::not_found(format!("Candidate {candidate_id}")));
    }
    if result.modified_count > 0 {
        info!("Approved candidate {candidate_id}");
    }

    let mut described = describe(&candidates, candidate_id.as_doc(), &users).await?;
    let candidate = described
        .pop()
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;
    Ok(Json(candidate))
}

/// Edit one's own candidate statement.
#[put("/candidates/<candidate_id>/statement", data = "<update>", format = "json")]
async fn update_statement(
    token: AuthToken<Student>,
    candidate_id: Id,
    update: Json<StatementUpdate>,
    candidates: Coll<Candidate>,
    users: Coll<User>,
) -> Result<Json<CandidateDescription>> {
    let candidate = candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;
    if candidate.user_id != token.id {
        return Err(Error::NotAuthorized(
            "Only the candidate may edit their statement".to_string(),
        ));
    }

    candidates
        .update_one(
            candidate_id.as_doc(),
            doc! { "$set": { "statement": update.0.statement } },
            None,
        )
        .await?;

    let mut described = describe(&candidates, candidate_id.as_doc(), &users).await?;
    let candidate = described
        .pop()
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;
    Ok(Json(candidate))
}

async fn find_election(elections: &Coll<Election>, election_id: Id) -> Result<Election> {
    elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))
}

/// Fetch matching candidates in registration order, with their users' display names.
async fn describe(
    candidates: &Coll<Candidate>,
    filter: mongodb::bson::Document,
    users: &Coll<User>,
) -> Result<Vec<CandidateDescription>> {
    let in_order = FindOptions::builder()
        .sort(doc! { "created_at": 1, "_id": 1 })
        .build();
    let candidates: Vec<Candidate> = candidates
        .find(filter, in_order)
        .await?
        .try_collect()
        .await?;

    let user_ids = candidates.iter().map(|c| c.user_id).collect::<Vec<_>>();
    let names: HashMap<Id, String> = users
        .find(doc! { "_id": { "$in": user_ids } }, None)
        .await?
        .map_ok(|user| (user.id, user.user.display_name))
        .try_collect()
        .await?;

    Ok(candidates
        .into_iter()
        .map(|candidate| {
            let name = names
                .get(&candidate.user_id)
                .cloned()
                .unwrap_or_else(|| candidate.user_id.to_string());
            CandidateDescription::new(candidate, name)
        })
        .collect())
}
