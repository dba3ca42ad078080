use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    api::id::ApiId,
    db::{
        club::{Club, NewClub},
        position::{NewPosition, Position},
    },
    mongodb::Id,
};

/// A club to create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl TryFrom<ClubSpec> for NewClub {
    type Error = Error;

    fn try_from(spec: ClubSpec) -> Result<Self> {
        let name = spec.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::bad_request("Club name must not be empty"));
        }
        Ok(Self {
            name,
            description: spec.description,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClubDescription {
    pub id: ApiId,
    pub name: String,
    pub description: String,
}

impl From<Club> for ClubDescription {
    fn from(club: Club) -> Self {
        Self {
            id: club.id.into(),
            name: club.club.name,
            description: club.club.description,
        }
    }
}

/// A position to create within a club.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSpec {
    pub name: String,
}

impl PositionSpec {
    pub fn into_position(self, club_id: Id) -> Result<NewPosition> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::bad_request("Position name must not be empty"));
        }
        Ok(NewPosition {
            club_id,
            name,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PositionDescription {
    pub id: ApiId,
    pub club_id: ApiId,
    pub name: String,
}

impl From<Position> for PositionDescription {
    fn from(position: Position) -> Self {
        Self {
            id: position.id.into(),
            club_id: position.club_id.into(),
            name: position.position.name,
        }
    }
}
