use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    db::{election::Election, position::Position},
    mongodb::Id,
};

use super::BallotStore;

/// How far a voter has got through an election.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionStatus {
    NotStarted,
    Partial,
    Completed,
}

impl CompletionStatus {
    /// Status given the number of positions voted for out of the total.
    pub fn from_counts(voted: usize, total: usize) -> Self {
        if voted == 0 {
            Self::NotStarted
        } else if voted >= total {
            Self::Completed
        } else {
            Self::Partial
        }
    }
}

/// A voter's progress through one election.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub status: CompletionStatus,
    /// Every position of the election's club, with whether the voter has voted for it.
    pub positions: Vec<(Position, bool)>,
}

/// Compute a voter's progress through the given election.
pub async fn completion_for<S>(store: &S, voter_id: Id, election: &Election) -> Result<Completion>
where
    S: BallotStore + ?Sized,
{
    let mut positions = store.club_positions(election.club_id).await?;
    positions.sort_by_key(|p| (p.created_at, p.id));
    let voted: HashSet<Id> = store.voted_positions(voter_id, election.id).await?;

    let positions = positions
        .into_iter()
        .map(|p| {
            let done = voted.contains(&p.id);
            (p, done)
        })
        .collect::<Vec<_>>();
    let voted_count = positions.iter().filter(|(_, done)| *done).count();
    Ok(Completion {
        status: CompletionStatus::from_counts(voted_count, positions.len()),
        positions,
    })
}

/// Compute a voter's completion status for an election.
pub async fn completion_status<S>(
    store: &S,
    voter_id: Id,
    election_id: Id,
) -> Result<CompletionStatus>
where
    S: BallotStore + ?Sized,
{
    let election = store
        .election(election_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
    Ok(completion_for(store, voter_id, &election).await?.status)
}
