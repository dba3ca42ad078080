use std::fmt::Display;
use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::{doc, serde_helpers::chrono_datetime_as_bson_datetime, to_bson, Bson};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::error::Result;
use crate::model::mongodb::{Coll, Id};

/// The username of the admin account created when the database has none.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// What kind of account a user holds.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Role {
    Student = 0,
    Admin = 1,
}

impl Display for Role {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Student => "student",
                Self::Admin => "admin",
            }
        )
    }
}

impl From<Role> for Bson {
    fn from(role: Role) -> Self {
        to_bson(&role).expect("Serialisation is infallible")
    }
}

/// Core user data, as stored in the database.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct UserCore {
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl UserCore {
    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        // A malformed hash can only come from outside this application; treat it as a mismatch.
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap_or(false)
    }
}

/// A user without an ID.
pub type NewUser = UserCore;

/// A user from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub user: UserCore,
}

impl Deref for User {
    type Target = UserCore;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl DerefMut for User {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.user
    }
}

/// Ensure there is at least one admin, creating the default one if needed.
pub async fn ensure_admin_exists(users: &Coll<NewUser>, default_password: &str) -> Result<()> {
    let filter = doc! {
        "role": Role::Admin,
    };
    if users.count_documents(filter, None).await? > 0 {
        return Ok(());
    }

    let admin = crate::model::api::auth::Credentials {
        username: DEFAULT_ADMIN_USERNAME.to_string(),
        password: default_password.to_string(),
    }
    .into_user(DEFAULT_ADMIN_USERNAME.to_string(), Role::Admin)?;
    users.insert_one(admin, None).await?;
    warn!("No admin account found; created default admin '{DEFAULT_ADMIN_USERNAME}'");
    Ok(())
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    use crate::model::api::auth::Credentials;

    impl UserCore {
        pub fn example_student() -> Self {
            Credentials::example_student()
                .into_user("Harry Potter".to_string(), Role::Student)
                .unwrap()
        }

        pub fn example_admin() -> Self {
            Credentials::example_admin()
                .into_user("Albus Dumbledore".to_string(), Role::Admin)
                .unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::api::auth::Credentials;

    #[test]
    fn hashed_password_verifies() {
        let user = Credentials {
            username: "hgranger".to_string(),
            password: "wingardium".to_string(),
        }
        .into_user("Hermione Granger".to_string(), Role::Student)
        .unwrap();
        assert!(user.verify_password("wingardium"));
        assert!(!user.verify_password("leviosa"));
        assert_ne!(user.password_hash, "wingardium");
    }

    #[test]
    fn malformed_hash_does_not_verify() {
        let mut user = NewUser::example_student();
        user.password_hash = "not a hash".to_string();
        assert!(!user.verify_password("anything"));
    }
}
