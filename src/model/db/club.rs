use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core club data, as stored in the database.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ClubCore {
    /// Club name, unique across all clubs.
    pub name: String,
    /// Free-text description.
    pub description: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// A club without an ID.
pub type NewClub = ClubCore;

/// A club from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Club {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub club: ClubCore,
}

impl Deref for Club {
    type Target = ClubCore;

    fn deref(&self) -> &Self::Target {
        &self.club
    }
}

impl DerefMut for Club {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.club
    }
}
