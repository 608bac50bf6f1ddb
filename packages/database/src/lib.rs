#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Database connection, queries, and migrations for the fence registry.
//!
//! Uses `switchy_database` for queries and `switchy_schema` for embedded
//! SQL migrations. Fence geometry and trail points are stored as JSON
//! text columns; the registry's only post-creation mutation is the
//! single-field `is_active` update performed by the activation pass.

pub mod db;
pub mod queries;

use std::sync::Arc;

use async_trait::async_trait;
use hazard_fence_activator::{FenceFlagStore, FlagStoreError};
use include_dir::{Dir, include_dir};
use switchy_database::Database;
use switchy_schema::discovery::embedded::EmbeddedMigrationSource;
use switchy_schema::runner::MigrationRunner;

/// Embedded SQL migrations from the `migrations/` directory.
static MIGRATIONS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/../../migrations");

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] switchy_schema::MigrationError),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Runs all pending database migrations.
///
/// # Errors
///
/// Returns [`DbError`] if any migration fails to apply.
pub async fn run_migrations(db: &dyn Database) -> Result<(), DbError> {
    let source = EmbeddedMigrationSource::new(&MIGRATIONS_DIR);
    let runner = MigrationRunner::new(Box::new(source));
    runner.run(db).await?;
    log::info!("Database migrations completed successfully");
    Ok(())
}

/// [`FenceFlagStore`] backed by the registry database, used by the
/// activation pass to persist flags one fence at a time.
pub struct DatabaseFenceStore {
    db: Arc<dyn Database>,
}

impl DatabaseFenceStore {
    /// Wraps a database connection.
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FenceFlagStore for DatabaseFenceStore {
    async fn set_active(&self, fence_id: i64, is_active: bool) -> Result<(), FlagStoreError> {
        queries::set_fence_active(self.db.as_ref(), fence_id, is_active)
            .await
            .map_err(|e| FlagStoreError::new(e.to_string()))
    }
}
