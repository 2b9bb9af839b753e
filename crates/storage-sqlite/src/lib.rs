//! SQLite storage implementation for the bandwatch collection service.
//!
//! This crate provides all database-related functionality using Diesel ORM
//! with SQLite. It implements the repository traits defined in
//! `bandwatch-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for the instrument universe, the band
//!   history log, and spot history
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel
//! dependencies exist. The `core` crate is database-agnostic and works
//! with traits.
//!
//! All writes funnel through a single writer actor holding one
//! connection; each submitted job runs inside one immediate transaction,
//! which is what makes a batch save atomic.

pub mod db;
pub mod errors;
pub mod schema;

// Repository implementations
pub mod band_history;
pub mod instruments;
pub mod spot_history;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from bandwatch-core for convenience
pub use bandwatch_core::errors::{DatabaseError, Error, Result};
