use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::error::Result;
use crate::model::{
    db::{ballot::Ballot, candidate::Candidate, election::Election, position::Position},
    mongodb::Id,
};

use super::{BallotCounts, BallotStore, TallyInputs, VoteError};

#[derive(Default)]
struct State {
    elections: HashMap<Id, Election>,
    positions: Vec<Position>,
    candidates: HashMap<Id, Candidate>,
    names: HashMap<Id, String>,
    ballots: Vec<Ballot>,
}

/// A [`BallotStore`] held entirely in memory.
/// Every operation takes the one lock, and never holds it across an `await`.
#[derive(Default)]
pub struct MemoryStore(Mutex<State>);

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_election(&self, election: Election) {
        self.0.lock().unwrap().elections.insert(election.id, election);
    }

    pub fn add_position(&self, position: Position) {
        self.0.lock().unwrap().positions.push(position);
    }

    /// Add a candidate whose user has the given display name.
    pub fn add_candidate(&self, candidate: Candidate, name: &str) {
        let mut state = self.0.lock().unwrap();
        state.names.insert(candidate.user_id, name.to_string());
        state.candidates.insert(candidate.id, candidate);
    }

    pub fn approve(&self, candidate_id: Id) {
        if let Some(candidate) = self.0.lock().unwrap().candidates.get_mut(&candidate_id) {
            candidate.approved = true;
        }
    }

    pub fn ballot_count(&self) -> usize {
        self.0.lock().unwrap().ballots.len()
    }
}

#[rocket::async_trait]
impl BallotStore for MemoryStore {
    async fn election(&self, election_id: Id) -> Result<Option<Election>> {
        Ok(self.0.lock().unwrap().elections.get(&election_id).cloned())
    }

    async fn candidate(&self, candidate_id: Id) -> Result<Option<Candidate>> {
        Ok(self.0.lock().unwrap().candidates.get(&candidate_id).cloned())
    }

    async fn has_voted(&self, voter_id: Id, election_id: Id, position_id: Id) -> Result<bool> {
        Ok(self.0.lock().unwrap().ballots.iter().any(|b| {
            b.voter_id == voter_id && b.election_id == election_id && b.position_id == position_id
        }))
    }

    async fn append(&self, ballot: &Ballot) -> Result<()> {
        let mut state = self.0.lock().unwrap();
        let duplicate = state.ballots.iter().any(|b| {
            b.voter_id == ballot.voter_id
                && b.election_id == ballot.election_id
                && b.position_id == ballot.position_id
        });
        if duplicate {
            return Err(VoteError::DuplicateVote.into());
        }
        state.ballots.push(ballot.clone());
        Ok(())
    }

    async fn club_positions(&self, club_id: Id) -> Result<Vec<Position>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .positions
            .iter()
            .filter(|p| p.club_id == club_id)
            .cloned()
            .collect())
    }

    async fn voted_positions(&self, voter_id: Id, election_id: Id) -> Result<HashSet<Id>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .ballots
            .iter()
            .filter(|b| b.voter_id == voter_id && b.election_id == election_id)
            .map(|b| b.position_id)
            .collect())
    }

    async fn tally_inputs(&self, election: &Election, _consistent: bool) -> Result<TallyInputs> {
        let state = self.0.lock().unwrap();
        let positions = state
            .positions
            .iter()
            .filter(|p| p.club_id == election.club_id)
            .cloned()
            .collect();
        let candidates: Vec<Candidate> = state
            .candidates
            .values()
            .filter(|c| c.election_id == election.id && c.approved)
            .cloned()
            .collect();
        let names = candidates
            .iter()
            .filter_map(|c| Some((c.user_id, state.names.get(&c.user_id)?.clone())))
            .collect();
        let mut counts = BallotCounts::new();
        for ballot in state.ballots.iter().filter(|b| b.election_id == election.id) {
            *counts
                .entry((ballot.position_id, ballot.candidate_id))
                .or_default() += 1;
        }
        Ok(TallyInputs {
            positions,
            candidates,
            names,
            counts,
        })
    }
}
