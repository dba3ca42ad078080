use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{api::id::ApiId, db::ballot::Ballot, mongodb::Id};

/// A vote submission. The voter is whoever is logged in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub candidate_id: Id,
    pub election_id: Id,
    pub position_id: Id,
}

/// A recorded ballot, returned to the voter who cast it.
#[derive(Debug, Serialize, Deserialize)]
pub struct BallotDescription {
    pub id: ApiId,
    pub candidate_id: ApiId,
    pub election_id: ApiId,
    pub position_id: ApiId,
    pub creation_time: DateTime<Utc>,
}

impl From<Ballot> for BallotDescription {
    fn from(ballot: Ballot) -> Self {
        Self {
            id: ballot.id.into(),
            candidate_id: ballot.candidate_id.into(),
            election_id: ballot.election_id.into(),
            position_id: ballot.position_id.into(),
            creation_time: ballot.creation_time,
        }
    }
}
