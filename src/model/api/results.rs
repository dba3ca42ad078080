use serde::{Deserialize, Serialize};

use crate::ledger::{Tally, TallyRow, Winners};
use crate::model::api::id::ApiId;

/// One line of a tally.
#[derive(Debug, Serialize, Deserialize)]
pub struct TallyRowDescription {
    pub position_id: ApiId,
    pub position_name: String,
    pub candidate_id: ApiId,
    pub candidate_name: String,
    pub vote_count: u64,
}

impl From<TallyRow> for TallyRowDescription {
    fn from(row: TallyRow) -> Self {
        Self {
            position_id: row.position_id.into(),
            position_name: row.position_name,
            candidate_id: row.candidate_id.into(),
            candidate_name: row.candidate_name,
            vote_count: row.vote_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WinnerDescription {
    pub candidate_id: ApiId,
    pub candidate_name: String,
}

/// The winners of one position.
#[derive(Debug, Serialize, Deserialize)]
pub struct PositionWinners {
    pub position_id: ApiId,
    pub position_name: String,
    pub vote_count: u64,
    pub tie: bool,
    pub winners: Vec<WinnerDescription>,
}

impl From<Winners> for PositionWinners {
    fn from(winners: Winners) -> Self {
        Self {
            position_id: winners.position_id.into(),
            position_name: winners.position_name,
            vote_count: winners.vote_count,
            tie: winners.candidates.len() > 1,
            winners: winners
                .candidates
                .into_iter()
                .map(|(id, name)| WinnerDescription {
                    candidate_id: id.into(),
                    candidate_name: name,
                })
                .collect(),
        }
    }
}

/// Results of an election.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResultsDescription {
    pub election_id: ApiId,
    /// The election has ended, so these results will not change.
    pub is_final: bool,
    pub rows: Vec<TallyRowDescription>,
    pub winners: Vec<PositionWinners>,
}

impl From<Tally> for ResultsDescription {
    fn from(tally: Tally) -> Self {
        let winners = tally.winners().into_iter().map(Into::into).collect();
        Self {
            election_id: tally.election_id.into(),
            is_final: tally.is_final,
            rows: tally.rows.into_iter().map(Into::into).collect(),
            winners,
        }
    }
}
