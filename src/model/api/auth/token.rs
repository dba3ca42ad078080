use std::marker::PhantomData;

use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use mongodb::Database;
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{FromRequest, Outcome},
    time::Duration,
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::model::{
    db::user::{Role, User},
    mongodb::{Coll, Id},
};

use super::capability::Capability;

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// An authentication token for a specific user, checked to hold capability `C`.
#[derive(Serialize, Deserialize)]
pub struct AuthToken<C> {
    pub id: Id,
    pub role: Role,
    #[serde(skip)]
    phantom: PhantomData<C>,
}

impl<C> AuthToken<C> {
    /// Create a new [`AuthToken`] for the given user.
    pub fn new(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            phantom: PhantomData,
        }
    }

    #[allow(clippy::missing_panics_doc)]
    /// Serialize this token into a cookie.
    pub fn into_cookie(self, config: &Config) -> Cookie<'static> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .expect("JWT encoding is infallible with default settings");

        Cookie::build(AUTH_TOKEN_COOKIE, token)
            .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish()
    }

    /// Deserialize a token from a cookie, checking its signature and expiry.
    pub fn from_cookie(cookie: &Cookie<'static>, config: &Config) -> Result<Self, Error> {
        let token = jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims<C>>| claims.claims.token)?;
        Ok(token)
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims<C> {
    #[serde(flatten, bound = "")]
    token: AuthToken<C>,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r, C> FromRequest<'r> for AuthToken<C>
where
    C: Capability + Send,
{
    type Error = Error;

    /// Get an [`AuthToken`] from the cookie, check the user still exists with the
    /// same role, and that the role holds capability `C`.
    ///
    /// Fails with 401 if there is no valid login, and 403 if the user lacks the capability.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        let Some(cookie) = req.cookies().get(AUTH_TOKEN_COOKIE) else {
            return Outcome::Failure((Status::Unauthorized, Error::NotAuthenticated));
        };
        let token: Self = match Self::from_cookie(cookie, config) {
            Ok(token) => token,
            Err(e) => {
                debug!("Rejected auth token: {e}");
                return Outcome::Failure((Status::Unauthorized, Error::NotAuthenticated));
            }
        };

        // Check the user actually exists, and hasn't changed role.
        let db = req.guard::<&State<Database>>().await.unwrap();
        match Coll::<User>::from_db(db)
            .find_one(token.id.as_doc(), None)
            .await
        {
            Ok(Some(user)) if user.role == token.role => {}
            Ok(_) => return Outcome::Failure((Status::Unauthorized, Error::NotAuthenticated)),
            Err(e) => return Outcome::Failure((Status::InternalServerError, e.into())),
        }

        if !C::permits(token.role) {
            return Outcome::Failure((
                Status::Forbidden,
                Error::NotAuthorized(format!("{} rights required", C::NAME)),
            ));
        }
        Outcome::Success(token)
    }
}

#[cfg(test)]
mod tests {
    use rocket::figment::Figment;

    use super::*;
    use crate::model::api::auth::{Admin, Student};
    use crate::model::db::user::NewUser;

    fn config(jwt_secret: &str) -> Config {
        Figment::new()
            .merge(("jwt_secret", jwt_secret))
            .merge(("auth_ttl", 60))
            .merge(("default_admin_password", "irrelevant"))
            .extract()
            .unwrap()
    }

    fn student() -> User {
        User {
            id: Id::new(),
            user: NewUser::example_student(),
        }
    }

    #[test]
    fn cookie_round_trip() {
        let config = config("felix felicis");
        let user = student();
        let cookie = AuthToken::<Student>::new(&user).into_cookie(&config);
        assert_eq!(cookie.name(), AUTH_TOKEN_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));

        let token = AuthToken::<Admin>::from_cookie(&cookie, &config).unwrap();
        assert_eq!(token.id, user.id);
        assert_eq!(token.role, Role::Student);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let user = student();
        let cookie = AuthToken::<Student>::new(&user).into_cookie(&config("felix felicis"));
        assert!(AuthToken::<Student>::from_cookie(&cookie, &config("polyjuice")).is_err());
    }
}
