//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in a DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.

pub mod ballot;
pub mod candidate;
pub mod club;
pub mod election;
pub mod position;
pub mod user;
