use argon2::Config;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    api::id::ApiId,
    db::user::{NewUser, Role, User},
};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Raw login credentials, received from a user. These are never stored directly,
/// since the password is in plaintext.
#[derive(Clone, Deserialize, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Convert to a new user by hashing the password.
    /// This enforces that the username is non-empty, and the password meets minimum length.
    pub fn into_user(self, display_name: String, role: Role) -> Result<NewUser> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(Error::bad_request("Username must not be empty"));
        }
        if self.password.len() < MIN_PASSWORD_LENGTH {
            return Err(Error::bad_request(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        // 16 bytes is recommended for password hashing:
        //  https://en.wikipedia.org/wiki/Argon2
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let password_hash =
            argon2::hash_encoded(self.password.as_bytes(), &salt, &Config::default())?;
        Ok(NewUser {
            username: username.to_string(),
            display_name,
            password_hash,
            role,
            created_at: Utc::now(),
        })
    }
}

/// A student signing up.
#[derive(Clone, Deserialize, Serialize)]
pub struct Registration {
    pub username: String,
    pub display_name: String,
    pub password: String,
}

impl Registration {
    /// Validate and hash into a new student account.
    pub fn into_student(self) -> Result<NewUser> {
        let display_name = self.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(Error::bad_request("Display name must not be empty"));
        }
        Credentials {
            username: self.username,
            password: self.password,
        }
        .into_user(display_name, Role::Student)
    }
}

/// A user as shown to themselves.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserDescription {
    pub id: ApiId,
    pub username: String,
    pub display_name: String,
    pub role: Role,
}

impl From<User> for UserDescription {
    fn from(user: User) -> Self {
        Self {
            id: user.id.into(),
            username: user.user.username,
            display_name: user.user.display_name,
            role: user.user.role,
        }
    }
}
