use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::model::{
    db::{ballot::Ballot, candidate::Candidate, election::Election, position::Position},
    mongodb::Id,
};

/// Number of ballots per (position ID, candidate ID).
pub type BallotCounts = HashMap<(Id, Id), u64>;

/// Everything needed to tally an election, read together.
#[derive(Debug, Clone, Default)]
pub struct TallyInputs {
    /// Positions of the election's club.
    pub positions: Vec<Position>,
    /// Approved candidates of the election.
    pub candidates: Vec<Candidate>,
    /// Display names of the candidates' users, by user ID.
    pub names: HashMap<Id, String>,
    /// Ballot counts.
    pub counts: BallotCounts,
}

/// Storage used by the ballot ledger.
///
/// Implementations must make [`BallotStore::append`] atomic with respect to the
/// (voter, election, position) triple: of any number of concurrent appends
/// sharing a triple, at most one may succeed.
#[rocket::async_trait]
pub trait BallotStore: Send + Sync {
    /// Look up an election.
    async fn election(&self, election_id: Id) -> Result<Option<Election>>;

    /// Look up a candidate.
    async fn candidate(&self, candidate_id: Id) -> Result<Option<Candidate>>;

    /// Does any ballot exist for this triple?
    async fn has_voted(&self, voter_id: Id, election_id: Id, position_id: Id) -> Result<bool>;

    /// Append a ballot, failing with [`VoteError::DuplicateVote`](super::VoteError::DuplicateVote)
    /// if its triple is already recorded.
    async fn append(&self, ballot: &Ballot) -> Result<()>;

    /// All positions of a club.
    async fn club_positions(&self, club_id: Id) -> Result<Vec<Position>>;

    /// IDs of the positions the voter holds a ballot for in this election.
    async fn voted_positions(&self, voter_id: Id, election_id: Id) -> Result<HashSet<Id>>;

    /// Read the roster and ballot counts for an election.
    /// If `consistent` is set, all reads must come from a single snapshot.
    async fn tally_inputs(&self, election: &Election, consistent: bool) -> Result<TallyInputs>;
}
