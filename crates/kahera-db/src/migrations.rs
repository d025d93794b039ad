//! # Database Migrations
//!
//! The schema ships inside the binary. [`Database::new`](crate::Database::new)
//! applies anything pending before a register takes its first sale.
//!
//! ```text
//! migrations/sqlite/
//! └── 001_initial_schema.sql   products, sales, sale_lines, drafts, settings
//!
//! Database::new ── run_migrations ── _sqlx_migrations up to date? ── yes ──► ready
//!                                           │ no
//!                                           ▼
//!                                  apply pending files in order
//! ```
//!
//! Applied files are checksummed by sqlx. Schema changes go in a new
//! numbered file; editing `001_initial_schema.sql` breaks existing
//! databases.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Embedded versus applied migration counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    pub embedded: usize,
    pub applied: usize,
}

impl MigrationStatus {
    /// Migrations embedded in the binary but not yet applied.
    pub fn pending(&self) -> usize {
        self.embedded.saturating_sub(self.applied)
    }

    /// True when the database schema matches this build.
    pub fn is_current(&self) -> bool {
        self.pending() == 0
    }
}

/// Applies all pending migrations. Safe to call repeatedly.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let before = migration_status(pool).await?;
    if before.is_current() {
        debug!(applied = before.applied, "Schema is current");
        return Ok(());
    }

    MIGRATOR.run(pool).await?;

    info!(
        applied = before.pending(),
        total = before.embedded,
        "Migrations applied"
    );
    Ok(())
}

/// Reads how many embedded migrations the database has applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    // _sqlx_migrations is created by the first run
    let applied: i64 = match sqlx::query_scalar(
        "SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1",
    )
    .fetch_one(pool)
    .await
    {
        Ok(count) => count,
        Err(sqlx::Error::Database(_)) => 0,
        Err(e) => return Err(e.into()),
    };

    Ok(MigrationStatus {
        embedded: MIGRATOR.migrations.len(),
        applied: applied.max(0) as usize,
    })
}
