//! Data types, split by where they live.
//!
//! - [`db`]: documents as stored in MongoDB.
//! - [`api`]: request and response bodies, plus authentication.
//! - [`mongodb`]: helpers for talking to the database.

pub mod api;
pub mod db;
pub mod mongodb;
