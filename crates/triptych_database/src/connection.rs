//! Connection pooling and migrations.

use crate::DatabaseResult;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info};
use triptych_error::{DatabaseError, DatabaseErrorKind};

/// Pooled Postgres connections.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Default number of pooled connections.
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Read `DATABASE_URL` from the environment.
///
/// # Errors
///
/// Returns a connection error if the variable is not set.
pub fn database_url_from_env() -> DatabaseResult<String> {
    std::env::var("DATABASE_URL").map_err(|_| {
        DatabaseError::new(DatabaseErrorKind::Connection(
            "DATABASE_URL environment variable not set".to_string(),
        ))
    })
}

/// Build a connection pool and check out one connection to prove it works.
///
/// # Errors
///
/// Returns a pool error if the pool cannot be built or the first connection
/// cannot be established.
pub fn establish_pool(database_url: &str, pool_size: u32) -> DatabaseResult<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(pool_size.max(1))
        .build(manager)
        .map_err(|e| {
            DatabaseError::new(DatabaseErrorKind::Pool(format!(
                "Failed to create connection pool: {e}"
            )))
        })?;

    {
        let _conn = pool.get().map_err(|e| {
            DatabaseError::new(DatabaseErrorKind::Pool(format!(
                "Failed to warm up connection pool: {e}"
            )))
        })?;
    }

    debug!(pool_size, "Connection pool ready");
    Ok(pool)
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns a migration error if any migration fails.
pub fn run_migrations(conn: &mut PgConnection) -> DatabaseResult<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Migration(e.to_string())))?;
    if !applied.is_empty() {
        info!(count = applied.len(), "Applied database migrations");
    }
    Ok(())
}
