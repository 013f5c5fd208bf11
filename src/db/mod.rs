//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization and migrations
//! - SQLite pragma configuration
//! - Repository layer for player documents

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::{is_unique_violation, CreditedReferrer, RefereeRow, Repository};
pub(crate) use repo::to_sql_int;
