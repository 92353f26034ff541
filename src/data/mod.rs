//! Data layer module
//!
//! Handles all data persistence:
//! - User documents with embedded follower/following sets
//! - Notifications

mod database;
mod models;

pub use database::Database;
pub use models::*;
