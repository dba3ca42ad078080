use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core ballot data, as stored in the database.
///
/// Ballots are append-only: nothing ever updates or deletes one.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct BallotCore {
    /// Foreign Key user ID of the voter.
    pub voter_id: Id,
    /// Foreign Key candidate ID.
    pub candidate_id: Id,
    /// Foreign Key election ID.
    pub election_id: Id,
    /// Foreign Key position ID.
    pub position_id: Id,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub creation_time: DateTime<Utc>,
}

/// A ballot, with its unique ID.
/// IDs are generated here rather than by the database, so a ballot is complete
/// before it is inserted.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Ballot {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub ballot: BallotCore,
}

impl Ballot {
    /// Create a new ballot, timestamped now.
    pub fn new(voter_id: Id, candidate_id: Id, election_id: Id, position_id: Id) -> Self {
        Self {
            id: Id::new(),
            ballot: BallotCore {
                voter_id,
                candidate_id,
                election_id,
                position_id,
                creation_time: Utc::now(),
            },
        }
    }
}

impl Deref for Ballot {
    type Target = BallotCore;

    fn deref(&self) -> &Self::Target {
        &self.ballot
    }
}
