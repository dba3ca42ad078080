use argon2::Error as Argon2Error;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use mongodb::error::Error as DbError;
use rocket::{
    http::{Status, StatusClass},
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::VoteError;
use crate::logging::RequestId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error(transparent)]
    Vote(#[from] VoteError),
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Not authorized: {0}")]
    NotAuthorized(String),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    /// A 404 for the described entity.
    pub fn not_found(what: String) -> Self {
        Self::Status(Status::NotFound, format!("{what} not found"))
    }

    /// A 400 with the given reason.
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::Status(Status::BadRequest, reason.into())
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) | Self::Argon2(_) => Status::InternalServerError,
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    Status::Unauthorized
                }
                _ => Status::BadRequest,
            },
            Self::Vote(err) => err.status(),
            Self::NotAuthenticated => Status::Unauthorized,
            Self::NotAuthorized(_) => Status::Forbidden,
            Self::Status(status, _) => *status,
        }
    }
}

/// The JSON body sent with every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        // Internal details stay in the log.
        let id = RequestId::of(req);
        let reason = if status.class() == StatusClass::ServerError {
            error!("{id} {} {}: {self}", req.method(), req.uri());
            status.reason_lossy().to_string()
        } else {
            debug!("{id} {} {}: {self}", req.method(), req.uri());
            self.to_string()
        };
        (status, Json(ErrorBody { error: reason })).respond_to(req)
    }
}
