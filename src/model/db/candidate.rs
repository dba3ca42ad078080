use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core candidate data, as stored in the database.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct CandidateCore {
    /// Foreign Key user ID of the student standing.
    pub user_id: Id,
    /// Foreign Key election ID.
    pub election_id: Id,
    /// Foreign Key position ID.
    pub position_id: Id,
    /// Set by an admin; never unset.
    pub approved: bool,
    /// Optional manifesto text.
    pub statement: Option<String>,
    /// Registration time, used to break ties in the tally.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl CandidateCore {
    /// Create a fresh, unapproved candidacy.
    pub fn new(
        user_id: Id,
        election_id: Id,
        position_id: Id,
        statement: Option<String>,
    ) -> Self {
        Self {
            user_id,
            election_id,
            position_id,
            approved: false,
            statement,
            created_at: Utc::now(),
        }
    }

    /// Can this candidate receive a ballot for the given election and position?
    pub fn accepts_votes_for(&self, election_id: Id, position_id: Id) -> bool {
        self.approved && self.election_id == election_id && self.position_id == position_id
    }
}

/// A candidate without an ID.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with its unique ID.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Candidate {
    /// Registration order: creation time, then ID.
    pub fn registration_key(&self) -> (DateTime<Utc>, Id) {
        (self.created_at, self.id)
    }
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}
