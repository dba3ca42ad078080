mod capability;
mod credentials;
mod token;

pub use capability::{Admin, Authenticated, Capability, Student};
pub use credentials::{Credentials, Registration, UserDescription, MIN_PASSWORD_LENGTH};
pub use token::{AuthToken, AUTH_TOKEN_COOKIE};
