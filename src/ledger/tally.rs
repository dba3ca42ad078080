use std::cmp::Reverse;

use chrono::Utc;

use crate::error::{Error, Result};
use crate::model::mongodb::Id;

use super::{BallotStore, TallyInputs};

/// Vote count for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyRow {
    pub position_id: Id,
    pub position_name: String,
    pub candidate_id: Id,
    pub candidate_name: String,
    pub vote_count: u64,
}

/// The candidates holding the top count for a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winners {
    pub position_id: Id,
    pub position_name: String,
    pub vote_count: u64,
    /// More than one entry means a tie.
    pub candidates: Vec<(Id, String)>,
}

/// The tally of an election.
///
/// Rows are grouped by position, in position creation order. Within a position,
/// candidates are ordered by descending vote count, ties broken by registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    pub election_id: Id,
    /// True if the election had ended when this was computed.
    pub is_final: bool,
    pub rows: Vec<TallyRow>,
}

impl Tally {
    /// Build a tally from its inputs. Every approved candidate gets a row,
    /// including those with no ballots.
    pub fn aggregate(election_id: Id, is_final: bool, inputs: &TallyInputs) -> Self {
        let mut positions = inputs.positions.iter().collect::<Vec<_>>();
        positions.sort_by_key(|p| (p.created_at, p.id));

        let mut rows = Vec::new();
        for position in positions {
            let mut roster = inputs
                .candidates
                .iter()
                .filter(|c| c.approved && c.position_id == position.id)
                .collect::<Vec<_>>();
            roster.sort_by_key(|c| c.registration_key());

            let mut group = roster
                .into_iter()
                .map(|candidate| TallyRow {
                    position_id: position.id,
                    position_name: position.name.clone(),
                    candidate_id: candidate.id,
                    candidate_name: inputs
                        .names
                        .get(&candidate.user_id)
                        .cloned()
                        .unwrap_or_else(|| candidate.user_id.to_string()),
                    vote_count: inputs
                        .counts
                        .get(&(position.id, candidate.id))
                        .copied()
                        .unwrap_or(0),
                })
                .collect::<Vec<_>>();
            // Stable, so equal counts keep registration order.
            group.sort_by_key(|row| Reverse(row.vote_count));
            rows.extend(group);
        }

        Self {
            election_id,
            is_final,
            rows,
        }
    }

    /// The winners of each position that received at least one vote.
    pub fn winners(&self) -> Vec<Winners> {
        let mut winners: Vec<Winners> = Vec::new();
        for row in &self.rows {
            if row.vote_count == 0 {
                continue;
            }
            match winners.last_mut() {
                Some(w) if w.position_id == row.position_id => {
                    if row.vote_count == w.vote_count {
                        w.candidates.push((row.candidate_id, row.candidate_name.clone()));
                    }
                }
                _ => winners.push(Winners {
                    position_id: row.position_id,
                    position_name: row.position_name.clone(),
                    vote_count: row.vote_count,
                    candidates: vec![(row.candidate_id, row.candidate_name.clone())],
                }),
            }
        }
        winners
    }
}

/// Tally an election.
///
/// Once the election has ended the tally is read from a consistent snapshot,
/// which is therefore taken after the end time.
pub async fn tally<S>(store: &S, election_id: Id) -> Result<Tally>
where
    S: BallotStore + ?Sized,
{
    let election = store
        .election(election_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
    let is_final = election.has_ended(Utc::now());
    let inputs = store.tally_inputs(&election, is_final).await?;
    Ok(Tally::aggregate(election_id, is_final, &inputs))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::ledger::{cast_vote, memory::MemoryStore, tests::block_on};
    use crate::model::db::{candidate::Candidate, election::Election, position::Position};

    fn candidate_at(election: Id, position: Id, offset_secs: i64) -> Candidate {
        let mut candidate = Candidate::example(election, position, true);
        candidate.created_at = Utc::now() - Duration::days(1) + Duration::seconds(offset_secs);
        candidate
    }

    fn vote(store: &MemoryStore, candidate: &Candidate, voters: usize) {
        block_on(async {
            for _ in 0..voters {
                cast_vote(
                    store,
                    Id::new(),
                    candidate.id,
                    candidate.election_id,
                    candidate.position_id,
                )
                .await
                .unwrap();
            }
        });
    }

    fn summary(tally: &Tally) -> Vec<(&str, &str, u64)> {
        tally
            .rows
            .iter()
            .map(|r| (r.position_name.as_str(), r.candidate_name.as_str(), r.vote_count))
            .collect()
    }

    #[test]
    fn orders_by_count_then_registration_and_keeps_zero_counts() {
        let club = Id::new();
        let election = Election::current_example(club);
        let president = Position::example(club, "President");
        let c1 = candidate_at(election.id, president.id, 0);
        let c2 = candidate_at(election.id, president.id, 10);
        let c3 = candidate_at(election.id, president.id, 20);

        let store = MemoryStore::new();
        store.add_election(election.clone());
        store.add_position(president);
        // Insert out of registration order to show storage order doesn't matter.
        store.add_candidate(c3.clone(), "C3");
        store.add_candidate(c1.clone(), "C1");
        store.add_candidate(c2.clone(), "C2");
        vote(&store, &c3, 3);
        vote(&store, &c2, 3);

        let result = block_on(tally(&store, election.id)).unwrap();
        assert!(!result.is_final);
        assert_eq!(
            summary(&result),
            vec![
                ("President", "C2", 3),
                ("President", "C3", 3),
                ("President", "C1", 0),
            ]
        );

        let winners = result.winners();
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].vote_count, 3);
        assert_eq!(
            winners[0].candidates,
            vec![(c2.id, "C2".to_string()), (c3.id, "C3".to_string())]
        );
    }

    #[test]
    fn groups_positions_in_creation_order() {
        let club = Id::new();
        let election = Election::current_example(club);
        let mut president = Position::example(club, "President");
        let mut secretary = Position::example(club, "Secretary");
        president.position.created_at = Utc::now() - Duration::days(2);
        secretary.position.created_at = Utc::now() - Duration::days(3);
        let p1 = candidate_at(election.id, president.id, 0);
        let p2 = candidate_at(election.id, president.id, 1);
        let s1 = candidate_at(election.id, secretary.id, 2);

        let store = MemoryStore::new();
        store.add_election(election.clone());
        store.add_position(president);
        store.add_position(secretary);
        store.add_candidate(p1.clone(), "Ginny");
        store.add_candidate(p2.clone(), "Ron");
        store.add_candidate(s1.clone(), "Luna");
        vote(&store, &p2, 2);
        vote(&store, &p1, 1);

        let result = block_on(tally(&store, election.id)).unwrap();
        assert_eq!(
            summary(&result),
            vec![
                ("Secretary", "Luna", 0),
                ("President", "Ron", 2),
                ("President", "Ginny", 1),
            ]
        );
        // Secretary got no votes, so only the president has a winner.
        let winners = result.winners();
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].candidates, vec![(p2.id, "Ron".to_string())]);
    }

    #[test]
    fn excludes_unapproved_candidates_until_approved() {
        let club = Id::new();
        let election = Election::current_example(club);
        let president = Position::example(club, "President");
        let mut pending = candidate_at(election.id, president.id, 0);
        pending.approved = false;

        let store = MemoryStore::new();
        store.add_election(election.clone());
        store.add_position(president);
        store.add_candidate(pending.clone(), "Neville");

        let result = block_on(tally(&store, election.id)).unwrap();
        assert!(result.rows.is_empty());
        assert!(result.winners().is_empty());

        store.approve(pending.id);
        let result = block_on(tally(&store, election.id)).unwrap();
        assert_eq!(summary(&result), vec![("President", "Neville", 0)]);
    }

    #[test]
    fn reads_are_idempotent() {
        let club = Id::new();
        let election = Election::current_example(club);
        let president = Position::example(club, "President");
        let c1 = candidate_at(election.id, president.id, 0);
        let store = MemoryStore::new();
        store.add_election(election.clone());
        store.add_position(president);
        store.add_candidate(c1.clone(), "Fred");
        vote(&store, &c1, 2);

        let first = block_on(tally(&store, election.id)).unwrap();
        let second = block_on(tally(&store, election.id)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn ended_election_is_final() {
        let club = Id::new();
        let election = Election::past_example(club);
        let store = MemoryStore::new();
        store.add_election(election.clone());

        let result = block_on(tally(&store, election.id)).unwrap();
        assert!(result.is_final);
    }

    #[test]
    fn unknown_election_is_not_found() {
        let store = MemoryStore::new();
        let result = block_on(tally(&store, Id::new()));
        assert!(matches!(result, Err(Error::Status(s, _)) if s == rocket::http::Status::NotFound));
    }
}
