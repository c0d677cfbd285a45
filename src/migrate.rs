use sqlx::migrate::{Migrate, MigrateError as SqlxMigrateError, Migrator};
use sqlx::{Connection, PgConnection};
use thiserror::Error;
use tracing::info;

use crate::database::handle::{redact_url, resolve_database_url, DatabaseError};

/// Migrations from `migrations/`, embedded at build time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error(transparent)]
    Config(#[from] DatabaseError),

    #[error("Failed to connect: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Migration failed: {0}")]
    Apply(#[from] SqlxMigrateError),

    #[error("Failed to close connection: {0}")]
    Close(#[source] sqlx::Error),
}

/// What a successful run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub known: usize,
    pub newly_applied: usize,
}

/// Apply every pending migration over one dedicated connection, then close it.
///
/// Single attempt: the first error ends the run.
pub async fn run_migrations(lookup: &dyn Fn(&str) -> Option<String>) -> Result<MigrationReport, MigrateError> {
    let url = resolve_database_url(lookup)?;
    info!("Running migrations against {}", redact_url(&url));

    let mut conn = PgConnection::connect(&url).await.map_err(MigrateError::Connect)?;

    let applied_before = applied_count(&mut conn).await?;
    MIGRATOR.run(&mut conn).await?;
    let applied_after = applied_count(&mut conn).await?;

    conn.close().await.map_err(MigrateError::Close)?;

    let report = MigrationReport {
        known: MIGRATOR.iter().count(),
        newly_applied: applied_after.saturating_sub(applied_before),
    };
    info!(
        "Migrations complete: {} known, {} newly applied",
        report.known, report.newly_applied
    );
    Ok(report)
}

async fn applied_count(conn: &mut PgConnection) -> Result<usize, MigrateError> {
    conn.ensure_migrations_table().await?;
    Ok(conn.list_applied_migrations().await?.len())
}
