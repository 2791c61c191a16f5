//! # entigraph-db
//!
//! PostgreSQL database layer for entigraph.
//!
//! This crate provides:
//! - Connection pool management
//! - The entity repository (pgvector candidate matching, atomic name-keyed
//!   upsert, the transactional two-entity merge)
//! - The idempotent entity↔document link repository
//!
//! ## Example
//!
//! ```rust,ignore
//! use entigraph_db::Database;
//! use entigraph_core::EntityRepository;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/entigraph").await?;
//!     let entities = db.entities.list(user_id).await?;
//!     Ok(())
//! }
//! ```

pub mod entities;
pub mod links;
pub mod pool;

// Test fixtures for integration tests.
// Note: always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL.
pub mod test_fixtures;

// Re-export core types
pub use entigraph_core::*;

pub use entities::PgEntityRepository;
pub use links::PgEntityLinkRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Entity repository: matching, upsert, merge.
    pub entities: PgEntityRepository,
    /// Entity↔document link repository.
    pub links: PgEntityLinkRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            entities: PgEntityRepository::new(pool.clone()),
            links: PgEntityLinkRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
