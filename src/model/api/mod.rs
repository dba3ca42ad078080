//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings.
//! - Datetimes are serialised as RFC 3339 strings.
//!
//! Request types deserialize IDs directly into [`Id`](crate::model::mongodb::Id),
//! which accepts a hex string.

pub mod auth;
pub mod ballot;
pub mod candidate;
pub mod chat;
pub mod club;
pub mod election;
pub mod id;
pub mod results;
