use serde::{Deserialize, Serialize};

use crate::model::{api::id::ApiId, db::candidate::Candidate, mongodb::Id};

/// A student standing for a position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRegistration {
    pub position_id: Id,
    #[serde(default)]
    pub statement: Option<String>,
}

/// A candidate's new statement. `None` clears it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementUpdate {
    pub statement: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CandidateDescription {
    pub id: ApiId,
    pub user_id: ApiId,
    pub display_name: String,
    pub election_id: ApiId,
    pub position_id: ApiId,
    pub approved: bool,
    pub statement: Option<String>,
}

impl CandidateDescription {
    pub fn new(candidate: Candidate, display_name: String) -> Self {
        Self {
            id: candidate.id.into(),
            user_id: candidate.user_id.into(),
            display_name,
            election_id: candidate.election_id.into(),
            position_id: candidate.position_id.into(),
            approved: candidate.approved,
            statement: candidate.candidate.statement,
        }
    }
}
