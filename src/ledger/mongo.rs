use std::collections::{HashMap, HashSet};

use mongodb::{
    bson::{doc, from_document, Document},
    options::SessionOptions,
    Client, ClientSession, Database,
};
use rocket::{
    futures::TryStreamExt,
    request::{self, FromRequest, Request},
    State,
};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::{
    db::{
        ballot::Ballot, candidate::Candidate, election::Election, position::Position, user::User,
    },
    mongodb::{is_duplicate_key_error, Coll, Id},
};

use super::{BallotCounts, BallotStore, TallyInputs, VoteError};

/// The production [`BallotStore`], backed by MongoDB.
///
/// Atomicity of [`BallotStore::append`] comes from the unique index on
/// `ballots.(voter_id, election_id, position_id)`.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    users: Coll<User>,
    elections: Coll<Election>,
    positions: Coll<Position>,
    candidates: Coll<Candidate>,
    ballots: Coll<Ballot>,
}

impl MongoStore {
    pub fn new(client: Client, db: &Database) -> Self {
        Self {
            client,
            users: Coll::from_db(db),
            elections: Coll::from_db(db),
            positions: Coll::from_db(db),
            candidates: Coll::from_db(db),
            ballots: Coll::from_db(db),
        }
    }

    fn counts_pipeline(election_id: Id) -> Vec<Document> {
        vec![
            doc! { "$match": { "election_id": election_id } },
            doc! {
                "$group": {
                    "_id": { "position_id": "$position_id", "candidate_id": "$candidate_id" },
                    "count": { "$sum": 1 },
                }
            },
        ]
    }

    /// Read the tally inputs without a session.
    async fn read_tally_inputs(&self, election: &Election) -> Result<TallyInputs> {
        let positions = self
            .positions
            .find(doc! { "club_id": election.club_id }, None)
            .await?
            .try_collect()
            .await?;
        let candidates: Vec<Candidate> = self
            .candidates
            .find(approved_filter(election.id), None)
            .await?
            .try_collect()
            .await?;
        let names = self
            .users
            .find(users_filter(&candidates), None)
            .await?
            .map_ok(|user| (user.id, user.user.display_name))
            .try_collect()
            .await?;
        let counts = self
            .ballots
            .aggregate(Self::counts_pipeline(election.id), None)
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        Ok(TallyInputs {
            positions,
            candidates,
            names,
            counts: into_counts(counts)?,
        })
    }

    /// Read the tally inputs from a single snapshot.
    async fn snapshot_tally_inputs(&self, election: &Election) -> Result<TallyInputs> {
        let options = SessionOptions::builder().snapshot(true).build();
        let mut session = self.client.start_session(Some(options)).await?;

        let positions = collect(
            self.positions
                .find_with_session(doc! { "club_id": election.club_id }, None, &mut session)
                .await?,
            &mut session,
        )
        .await?;
        let candidates = collect(
            self.candidates
                .find_with_session(approved_filter(election.id), None, &mut session)
                .await?,
            &mut session,
        )
        .await?;
        let names = collect(
            self.users
                .find_with_session(users_filter(&candidates), None, &mut session)
                .await?,
            &mut session,
        )
        .await?
        .into_iter()
        .map(|user| (user.id, user.user.display_name))
        .collect();
        let counts = collect(
            self.ballots
                .aggregate_with_session(Self::counts_pipeline(election.id), None, &mut session)
                .await?,
            &mut session,
        )
        .await?;

        Ok(TallyInputs {
            positions,
            candidates,
            names,
            counts: into_counts(counts)?,
        })
    }
}

#[rocket::async_trait]
impl BallotStore for MongoStore {
    async fn election(&self, election_id: Id) -> Result<Option<Election>> {
        Ok(self.elections.find_one(election_id.as_doc(), None).await?)
    }

    async fn candidate(&self, candidate_id: Id) -> Result<Option<Candidate>> {
        Ok(self.candidates.find_one(candidate_id.as_doc(), None).await?)
    }

    async fn has_voted(&self, voter_id: Id, election_id: Id, position_id: Id) -> Result<bool> {
        let filter = doc! {
            "voter_id": voter_id,
            "election_id": election_id,
            "position_id": position_id,
        };
        Ok(self.ballots.count_documents(filter, None).await? > 0)
    }

    async fn append(&self, ballot: &Ballot) -> Result<()> {
        match self.ballots.insert_one(ballot, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key_error(&e) => {
                warn!(
                    "Concurrent duplicate ballot by voter {} for position {}",
                    ballot.voter_id, ballot.position_id
                );
                Err(VoteError::DuplicateVote.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn club_positions(&self, club_id: Id) -> Result<Vec<Position>> {
        Ok(self
            .positions
            .find(doc! { "club_id": club_id }, None)
            .await?
            .try_collect()
            .await?)
    }

    async fn voted_positions(&self, voter_id: Id, election_id: Id) -> Result<HashSet<Id>> {
        let filter = doc! {
            "voter_id": voter_id,
            "election_id": election_id,
        };
        let distinct = self.ballots.distinct("position_id", filter, None).await?;
        Ok(distinct
            .into_iter()
            .filter_map(|id| id.as_object_id().map(Id::from))
            .collect())
    }

    async fn tally_inputs(&self, election: &Election, consistent: bool) -> Result<TallyInputs> {
        if consistent {
            self.snapshot_tally_inputs(election).await
        } else {
            self.read_tally_inputs(election).await
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for MongoStore {
    type Error = ();

    /// Build the store from the managed database state.
    ///
    /// Panics iff the [`Client`] or [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let client = req.guard::<&State<Client>>().await.unwrap();
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(MongoStore::new(Client::clone(client), db))
    }
}

/// A filter for the approved candidates of an election.
fn approved_filter(election_id: Id) -> Document {
    doc! {
        "election_id": election_id,
        "approved": true,
    }
}

/// A filter for the users standing as the given candidates.
fn users_filter(candidates: &[Candidate]) -> Document {
    let user_ids = candidates.iter().map(|c| c.user_id).collect::<Vec<_>>();
    doc! { "_id": { "$in": user_ids } }
}

/// Drain a session cursor.
async fn collect<T>(
    mut cursor: mongodb::SessionCursor<T>,
    session: &mut ClientSession,
) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de> + Unpin + Send + Sync,
{
    let mut items = Vec::new();
    while let Some(item) = cursor.next(session).await {
        items.push(item?);
    }
    Ok(items)
}

/// One row of the `$group` stage.
#[derive(Deserialize)]
struct CountRow {
    #[serde(rename = "_id")]
    key: CountKey,
    count: i64,
}

#[derive(Deserialize)]
struct CountKey {
    position_id: Id,
    candidate_id: Id,
}

fn into_counts(rows: Vec<Document>) -> Result<BallotCounts> {
    let malformed = |reason: String| {
        Error::Status(
            rocket::http::Status::InternalServerError,
            format!("Malformed ballot count: {reason}"),
        )
    };
    let mut counts = HashMap::with_capacity(rows.len());
    for row in rows {
        let row: CountRow = from_document(row).map_err(|e| malformed(e.to_string()))?;
        let count = u64::try_from(row.count).map_err(|_| malformed(row.count.to_string()))?;
        counts.insert((row.key.position_id, row.key.candidate_id), count);
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use rocket::http::Status;

    use super::*;

    fn row(position_id: Id, candidate_id: Id, count: i64) -> Document {
        doc! {
            "_id": { "position_id": position_id, "candidate_id": candidate_id },
            "count": count,
        }
    }

    #[test]
    fn counts_are_keyed_by_position_and_candidate() {
        let (position, first, second) = (Id::new(), Id::new(), Id::new());
        let counts = into_counts(vec![row(position, first, 3), row(position, second, 1)]).unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[&(position, first)], 3);
        assert_eq!(counts[&(position, second)], 1);
    }

    #[test]
    fn negative_count_is_an_error() {
        let result = into_counts(vec![row(Id::new(), Id::new(), -1)]);
        assert!(
            matches!(result, Err(Error::Status(s, _)) if s == Status::InternalServerError)
        );
    }

    #[test]
    fn malformed_row_is_an_error() {
        let result = into_counts(vec![doc! { "_id": "nonsense", "count": 1 }]);
        assert!(
            matches!(result, Err(Error::Status(s, _)) if s == Status::InternalServerError)
        );
    }
}
