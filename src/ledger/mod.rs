//! The ballot ledger: accepting ballots, and the read-side views built on them.
//!
//! Nothing here depends on Rocket routing; handlers pass in a [`BallotStore`]
//! (normally a [`MongoStore`]).

use rocket::http::Status;
use thiserror::Error;

mod cast;
mod completion;
#[cfg(test)]
mod memory;
mod mongo;
mod store;
mod tally;

pub use cast::{cast_vote, has_voted};
pub use completion::{completion_for, completion_status, Completion, CompletionStatus};
pub use mongo::MongoStore;
pub use store::{BallotCounts, BallotStore, TallyInputs};
pub use tally::{tally, Tally, TallyRow, Winners};

/// Reasons a ballot is refused.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum VoteError {
    #[error("The election is not open for voting")]
    ElectionClosed,
    #[error("The candidate is not standing for this position in this election")]
    InvalidCandidate,
    #[error("You have already voted for this position")]
    DuplicateVote,
}

impl VoteError {
    pub fn status(&self) -> Status {
        match self {
            Self::ElectionClosed => Status::Forbidden,
            Self::InvalidCandidate => Status::BadRequest,
            Self::DuplicateVote => Status::Conflict,
        }
    }
}
