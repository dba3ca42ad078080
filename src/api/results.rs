use rocket::{serde::json::Json, Route};

use crate::{
    error::Result,
    ledger::{tally, MongoStore},
    model::{
        api::{
            auth::{Admin, AuthToken},
            results::ResultsDescription,
        },
        mongodb::Id,
    },
};

pub fn routes() -> Vec<Route> {
    routes![get_results]
}

/// Running results while an election is open, final results once it has ended.
#[get("/admin/elections/<election_id>/results")]
async fn get_results(
    _token: AuthToken<Admin>,
    election_id: Id,
    store: MongoStore,
) -> Result<Json<ResultsDescription>> {
    let tally = tally(&store, election_id).await?;
    debug!(
        "Tallied {} rows for election {election_id} (final: {})",
        tally.rows.len(),
        tally.is_final
    );
    Ok(Json(tally.into()))
}

#[cfg(test)]
mod tests {
    use mongodb::Database;
    use rocket::{
        http::Status,
        local::asynchronous::Client,
        serde::json::serde_json,
    };
    use serde::Serialize;

    use crate::model::{
        api::{
            club::{ClubSpec, PositionSpec},
            election::ElectionSpec,
        },
        db::{
            ballot::Ballot,
            candidate::NewCandidate,
            club::NewClub,
            election::NewElection,
            user::NewUser,
        },
        mongodb::{Coll, MongoCollection},
    };

    use super::*;

    async fn insert<T: Serialize + MongoCollection>(db: &Database, item: T) -> Id {
        Coll::<T>::from_db(db)
            .insert_one(item, None)
            .await
            .unwrap()
            .inserted_id
            .as_object_id()
            .unwrap()
            .into()
    }

    /// An approved candidate, registered under a fresh student account.
    async fn stand(db: &Database, username: &str, name: &str, election: Id, position: Id) -> Id {
        let mut user = NewUser::example_student();
        user.username = username.to_string();
        user.display_name = name.to_string();
        let user_id = insert(db, user).await;
        let mut candidate = NewCandidate::new(user_id, election, position, None);
        candidate.approved = true;
        insert(db, candidate).await
    }

    async fn votes(db: &Database, candidate: Id, election: Id, position: Id, count: usize) {
        let ballots = Coll::<Ballot>::from_db(db);
        for _ in 0..count {
            ballots
                .insert_one(Ballot::new(Id::new(), candidate, election, position), None)
                .await
                .unwrap();
        }
    }

    /// A club with one position and an election of the given kind.
    async fn setup(db: &Database, spec: fn(Id) -> ElectionSpec) -> (Id, Id) {
        let club_id = insert(db, NewClub::try_from(ClubSpec::example()).unwrap()).await;
        let position = PositionSpec::president().into_position(club_id).unwrap();
        let president = insert(db, position).await;
        let election_id = insert(db, NewElection::try_from(spec(club_id)).unwrap()).await;
        (election_id, president)
    }

    async fn fetch(client: &Client, election_id: Id) -> ResultsDescription {
        let response = client.get(uri!(get_results(election_id))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    #[backend_test(admin)]
    async fn running_results(client: Client, db: Database) {
        let (election_id, president) = setup(&db, ElectionSpec::current_example).await;
        let ginny = stand(&db, "gweasley", "Ginny Weasley", election_id, president).await;
        let ron = stand(&db, "rweasley", "Ron Weasley", election_id, president).await;
        let fred = stand(&db, "fweasley", "Fred Weasley", election_id, president).await;
        votes(&db, ginny, election_id, president, 2).await;
        votes(&db, ron, election_id, president, 3).await;

        let results = fetch(&client, election_id).await;
        assert!(!results.is_final);
        assert_eq!(*results.election_id, election_id);
        let rows = results
            .rows
            .iter()
            .map(|row| (*row.candidate_id, row.candidate_name.as_str(), row.vote_count))
            .collect::<Vec<_>>();
        assert_eq!(
            rows,
            vec![
                (ron, "Ron Weasley", 3),
                (ginny, "Ginny Weasley", 2),
                (fred, "Fred Weasley", 0),
            ]
        );

        assert_eq!(results.winners.len(), 1);
        let winners = &results.winners[0];
        assert_eq!(winners.position_name, "President");
        assert!(!winners.tie);
        assert_eq!(*winners.winners[0].candidate_id, ron);
    }

    #[backend_test(admin)]
    async fn tied_results(client: Client, db: Database) {
        let (election_id, president) = setup(&db, ElectionSpec::current_example).await;
        let ginny = stand(&db, "gweasley", "Ginny Weasley", election_id, president).await;
        let ron = stand(&db, "rweasley", "Ron Weasley", election_id, president).await;
        votes(&db, ginny, election_id, president, 2).await;
        votes(&db, ron, election_id, president, 2).await;

        let results = fetch(&client, election_id).await;
        let winners = &results.winners[0];
        assert!(winners.tie);
        assert_eq!(winners.vote_count, 2);
        let ids = winners
            .winners
            .iter()
            .map(|w| *w.candidate_id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![ginny, ron]);
    }

    #[backend_test(admin)]
    async fn ended_election_is_final(client: Client, db: Database) {
        let (election_id, president) = setup(&db, ElectionSpec::past_example).await;
        let ginny = stand(&db, "gweasley", "Ginny Weasley", election_id, president).await;
        votes(&db, ginny, election_id, president, 1).await;

        let results = fetch(&client, election_id).await;
        assert!(results.is_final);
        assert_eq!(results.rows.len(), 1);
        assert_eq!(results.rows[0].vote_count, 1);
    }

    #[backend_test(admin)]
    async fn no_votes_no_winners(client: Client, db: Database) {
        let (election_id, president) = setup(&db, ElectionSpec::current_example).await;
        stand(&db, "gweasley", "Ginny Weasley", election_id, president).await;

        let results = fetch(&client, election_id).await;
        assert_eq!(results.rows.len(), 1);
        assert!(results.winners.is_empty());
    }

    #[backend_test(admin)]
    async fn missing_election(client: Client) {
        let response = client.get(uri!(get_results(Id::new()))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(student)]
    async fn students_cannot_see_results(client: Client, db: Database) {
        let (election_id, _) = setup(&db, ElectionSpec::current_example).await;
        let response = client.get(uri!(get_results(election_id))).dispatch().await;
        assert_eq!(Status::Forbidden, response.status());
    }
}
