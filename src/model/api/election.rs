use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ledger::{Completion, CompletionStatus};
use crate::model::{
    api::{club::PositionDescription, id::ApiId},
    db::{
        election::{Election, NewElection},
        position::Position,
    },
    mongodb::Id,
};

/// An election specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionSpec {
    /// The club whose positions are contested.
    pub club_id: Id,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Elections are created inactive unless specified.
    #[serde(default)]
    pub active: bool,
}

impl TryFrom<ElectionSpec> for NewElection {
    type Error = Error;

    fn try_from(spec: ElectionSpec) -> Result<Self> {
        let title = spec.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::bad_request("Election title must not be empty"));
        }
        if spec.end_time <= spec.start_time {
            return Err(Error::bad_request("Election must end after it starts"));
        }
        Ok(Self {
            club_id: spec.club_id,
            title,
            start_time: spec.start_time,
            end_time: spec.end_time,
            active: spec.active,
            created_at: Utc::now(),
        })
    }
}

/// Change to an election's activity flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActiveUpdate {
    pub active: bool,
}

/// Top-level election information.
#[derive(Debug, Serialize, Deserialize)]
pub struct ElectionSummary {
    pub id: ApiId,
    pub club_id: ApiId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub active: bool,
    /// Accepting ballots right now.
    pub live: bool,
}

impl From<Election> for ElectionSummary {
    fn from(election: Election) -> Self {
        let live = election.is_live(Utc::now());
        Self {
            id: election.id.into(),
            club_id: election.club_id.into(),
            title: election.election.title,
            start_time: election.election.start_time,
            end_time: election.election.end_time,
            active: election.election.active,
            live,
        }
    }
}

/// An election with the positions being contested.
#[derive(Debug, Serialize, Deserialize)]
pub struct ElectionDescription {
    #[serde(flatten)]
    pub election: ElectionSummary,
    pub positions: Vec<PositionDescription>,
}

impl ElectionDescription {
    pub fn new(election: Election, positions: Vec<Position>) -> Self {
        Self {
            election: election.into(),
            positions: positions.into_iter().map(Into::into).collect(),
        }
    }
}

/// A position, and whether the current voter has voted for it.
#[derive(Debug, Serialize, Deserialize)]
pub struct PositionProgress {
    pub id: ApiId,
    pub name: String,
    pub voted: bool,
}

/// A live election, with the current voter's progress through it.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveElection {
    #[serde(flatten)]
    pub election: ElectionSummary,
    pub status: CompletionStatus,
    pub positions: Vec<PositionProgress>,
}

impl ActiveElection {
    pub fn new(election: Election, completion: Completion) -> Self {
        Self {
            election: election.into(),
            status: completion.status,
            positions: completion
                .positions
                .into_iter()
                .map(|(position, voted)| PositionProgress {
                    id: position.id.into(),
                    name: position.position.name,
                    voted,
                })
                .collect(),
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use chrono::Duration;

    use super::*;

    impl ElectionSpec {
        pub fn current_example(club_id: Id) -> Self {
            let now = Utc::now();
            Self {
                club_id,
                title: "Committee 2024".to_string(),
                start_time: now - Duration::days(1),
                end_time: now + Duration::days(7),
                active: true,
            }
        }

        pub fn past_example(club_id: Id) -> Self {
            let now = Utc::now();
            Self {
                club_id,
                title: "Committee 2023".to_string(),
                start_time: now - Duration::days(14),
                end_time: now - Duration::days(7),
                active: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_backwards_interval() {
        let mut spec = ElectionSpec::current_example(Id::new());
        spec.end_time = spec.start_time;
        assert!(NewElection::try_from(spec).is_err());
    }

    #[test]
    fn rejects_blank_title() {
        let mut spec = ElectionSpec::current_example(Id::new());
        spec.title = "\t".to_string();
        assert!(NewElection::try_from(spec).is_err());
    }

    #[test]
    fn summary_reports_liveness() {
        let mut election = Election {
            id: Id::new(),
            election: NewElection::try_from(ElectionSpec::current_example(Id::new())).unwrap(),
        };
        assert!(ElectionSummary::from(election.clone()).live);
        election.active = false;
        assert!(!ElectionSummary::from(election).live);
    }
}
