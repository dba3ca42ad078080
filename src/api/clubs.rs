use mongodb::{
    bson::doc,
    options::FindOptions,
};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::{Admin, AuthToken},
            club::{ClubDescription, ClubSpec, PositionDescription, PositionSpec},
        },
        db::{
            club::{Club, NewClub},
            position::{NewPosition, Position},
        },
        mongodb::{is_duplicate_key_error, Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![get_clubs, create_club, get_positions, create_position]
}

#[get("/clubs")]
async fn get_clubs(clubs: Coll<Club>) -> Result<Json<Vec<ClubDescription>>> {
    let by_name = FindOptions::builder().sort(doc! { "name": 1 }).build();
    let clubs = clubs
        .find(None, by_name)
        .await?
        .map_ok(ClubDescription::from)
        .try_collect()
        .await?;
    Ok(Json(clubs))
}

#[post("/admin/clubs", data = "<spec>", format = "json")]
async fn create_club(
    _token: AuthToken<Admin>,
    spec: Json<ClubSpec>,
    new_clubs: Coll<NewClub>,
    clubs: Coll<Club>,
) -> Result<(Status, Json<ClubDescription>)> {
    let club = NewClub::try_from(spec.0)?;
    let new_id: Id = match new_clubs.insert_one(&club, None).await {
        Ok(result) => result
            .inserted_id
            .as_object_id()
            .expect("Inserted IDs are ObjectIds") // Safe because the ID comes directly from the DB.
            .into(),
        Err(e) if is_duplicate_key_error(&e) => {
            return Err(Error::Status(
                Status::Conflict,
                format!("Club name already in use: {}", club.name),
            ));
        }
        Err(e) => return Err(e.into()),
    };
    let club = clubs
        .find_one(new_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Club {new_id}")))?;
    info!("Created club {} ({new_id})", club.name);
    Ok((Status::Created, Json(club.into())))
}

#[get("/clubs/<club_id>/positions")]
async fn get_positions(
    club_id: Id,
    clubs: Coll<Club>,
    positions: Coll<Position>,
) -> Result<Json<Vec<PositionDescription>>> {
    if clubs.find_one(club_id.as_doc(), None).await?.is_none() {
        return Err(Error::not_found(format!("Club {club_id}")));
    }
    let positions = club_positions(&positions, club_id).await?;
    Ok(Json(positions.into_iter().map(Into::into).collect()))
}

#[post("/admin/clubs/<club_id>/positions", data = "<spec>", format = "json")]
async fn create_position(
    _token: AuthToken<Admin>,
    club_id: Id,
    spec: Json<PositionSpec>,
    clubs: Coll<Club>,
    new_positions: Coll<NewPosition>,
    positions: Coll<Position>,
) -> Result<(Status, Json<PositionDescription>)> {
    if clubs.find_one(club_id.as_doc(), None).await?.is_none() {
        return Err(Error::not_found(format!("Club {club_id}")));
    }
    let position = spec.0.into_position(club_id)?;
    let new_id: Id = match new_positions.insert_one(&position, None).await {
        Ok(result) => result
            .inserted_id
            .as_object_id()
            .expect("Inserted IDs are ObjectIds") // Safe because the ID comes directly from the DB.
            .into(),
        Err(e) if is_duplicate_key_error(&e) => {
            return Err(Error::Status(
                Status::Conflict,
                format!("Club already has a position named {}", position.name),
            ));
        }
        Err(e) => return Err(e.into()),
    };
    let position = positions
        .find_one(new_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Position {new_id}")))?;
    Ok((Status::Created, Json(position.into())))
}

/// All positions of a club, in creation order.
pub(super) async fn club_positions(positions: &Coll<Position>, club_id: Id) -> Result<Vec<Position>> {
    let in_order = FindOptions::builder()
        .sort(doc! { "created_at": 1, "_id": 1 })
        .build();
    Ok(positions
        .find(doc! { "club_id": club_id }, in_order)
        .await?
        .try_collect()
        .await?)
}
