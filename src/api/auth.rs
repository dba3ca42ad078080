use mongodb::bson::doc;
use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    error::{Error, Result},
    model::{
        api::auth::{AuthToken, Authenticated, Credentials, Registration, UserDescription, AUTH_TOKEN_COOKIE},
        db::user::{NewUser, User},
        mongodb::{is_duplicate_key_error, Coll, Id},
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![register, login, logout, me]
}

#[post("/auth/register", data = "<registration>", format = "json")]
async fn register(
    cookies: &CookieJar<'_>,
    registration: Json<Registration>,
    users: Coll<User>,
    new_users: Coll<NewUser>,
    config: &State<Config>,
) -> Result<(Status, Json<UserDescription>)> {
    let user = registration.0.into_student()?;
    let username = user.username.clone();

    let new_id: Id = match new_users.insert_one(&user, None).await {
        Ok(result) => result
            .inserted_id
            .as_object_id()
            .expect("Inserted IDs are ObjectIds") // Safe because the ID comes directly from the DB.
            .into(),
        Err(e) if is_duplicate_key_error(&e) => {
            return Err(Error::Status(
                Status::Conflict,
                format!("Username already in use: {username}"),
            ));
        }
        Err(e) => return Err(e.into()),
    };
    let user = users
        .find_one(new_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("User {new_id}")))?;
    info!("Registered student {username}");

    cookies.add(AuthToken::<Authenticated>::new(&user).into_cookie(config));
    Ok((Status::Created, Json(user.into())))
}

#[post("/auth/login", data = "<credentials>", format = "json")]
async fn login(
    cookies: &CookieJar<'_>,
    credentials: Json<Credentials>,
    users: Coll<User>,
    config: &State<Config>,
) -> Result<Json<UserDescription>> {
    let with_username = doc! {
        "username": credentials.username.trim(),
    };

    let user = users
        .find_one(with_username, None)
        .await?
        .filter(|user| user.verify_password(&credentials.password))
        .ok_or_else(|| {
            Error::Status(
                Status::Unauthorized,
                "No user found with the provided username and password combination.".to_string(),
            )
        })?;

    cookies.add(AuthToken::<Authenticated>::new(&user).into_cookie(config));
    Ok(Json(user.into()))
}

#[delete("/auth")]
fn logout(cookies: &CookieJar<'_>) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}

#[get("/auth/me")]
async fn me(token: AuthToken<Authenticated>, users: Coll<User>) -> Result<Json<UserDescription>> {
    let user = users
        .find_one(token.id.as_doc(), None)
        .await?
        .ok_or(Error::NotAuthenticated)?;
    Ok(Json(user.into()))
}
