use chrono::Utc;

use crate::error::Result;
use crate::model::{db::ballot::Ballot, mongodb::Id};

use super::{BallotStore, VoteError};

/// Has the voter already cast a ballot for this position in this election?
pub async fn has_voted<S>(store: &S, voter_id: Id, election_id: Id, position_id: Id) -> Result<bool>
where
    S: BallotStore + ?Sized,
{
    store.has_voted(voter_id, election_id, position_id).await
}

/// Cast a vote, appending a new ballot to the ledger.
///
/// Checks, in order: the election is live, the candidate is approved for this
/// election and position, and the voter has not already voted for the position.
/// The final check is re-done atomically by [`BallotStore::append`], so racing
/// submissions for the same triple produce exactly one ballot.
pub async fn cast_vote<S>(
    store: &S,
    voter_id: Id,
    candidate_id: Id,
    election_id: Id,
    position_id: Id,
) -> Result<Ballot>
where
    S: BallotStore + ?Sized,
{
    let live = store
        .election(election_id)
        .await?
        .map_or(false, |election| election.is_live(Utc::now()));
    if !live {
        debug!("Rejected vote by {voter_id}: election {election_id} is closed");
        return Err(VoteError::ElectionClosed.into());
    }

    let valid = store
        .candidate(candidate_id)
        .await?
        .map_or(false, |candidate| {
            candidate.accepts_votes_for(election_id, position_id)
        });
    if !valid {
        debug!("Rejected vote by {voter_id}: candidate {candidate_id} not valid for position {position_id}");
        return Err(VoteError::InvalidCandidate.into());
    }

    // Cheap early exit; `append` is the real arbiter.
    if has_voted(store, voter_id, election_id, position_id).await? {
        debug!("Rejected vote by {voter_id}: already voted for position {position_id}");
        return Err(VoteError::DuplicateVote.into());
    }

    let ballot = Ballot::new(voter_id, candidate_id, election_id, position_id);
    store.append(&ballot).await?;
    info!(
        "Recorded ballot {} for election {election_id}, position {position_id}",
        ballot.id
    );
    Ok(ballot)
}
