use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core election data, as stored in the database.
///
/// Only `active` is ever modified after creation.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ElectionCore {
    /// Foreign Key club ID; the club's positions are what is being voted on.
    pub club_id: Id,
    /// Election title.
    pub title: String,
    /// Election start time.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_time: DateTime<Utc>,
    /// Election end time (exclusive).
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_time: DateTime<Utc>,
    /// Admin-controlled switch; an inactive election accepts no ballots.
    pub active: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl ElectionCore {
    /// Is the election accepting ballots at the given time?
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active && now < self.end_time
    }

    /// Has the election's end time passed?
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_time
    }
}

/// An election without an ID.
pub type NewElection = ElectionCore;

/// An election from the database, with its unique ID.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub election: ElectionCore,
}

impl Deref for Election {
    type Target = ElectionCore;

    fn deref(&self) -> &Self::Target {
        &self.election
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.election
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    use chrono::Duration;

    impl Election {
        pub fn current_example(club_id: Id) -> Self {
            let now = Utc::now();
            Self::example(club_id, now - Duration::days(1), now + Duration::days(7), true)
        }

        pub fn past_example(club_id: Id) -> Self {
            let now = Utc::now();
            Self::example(club_id, now - Duration::days(14), now - Duration::days(7), true)
        }

        pub fn inactive_example(club_id: Id) -> Self {
            let now = Utc::now();
            Self::example(club_id, now - Duration::days(1), now + Duration::days(7), false)
        }

        fn example(
            club_id: Id,
            start_time: DateTime<Utc>,
            end_time: DateTime<Utc>,
            active: bool,
        ) -> Self {
            Self {
                id: Id::new(),
                election: ElectionCore {
                    club_id,
                    title: "Quidditch Club Committee".to_string(),
                    start_time,
                    end_time,
                    active,
                    created_at: start_time,
                },
            }
        }
    }
}
