//! Database layer for AutoInven
//!
//! Provides the PostgreSQL pool and the store queries used by alerts and
//! the HTTP API.

mod postgres;

pub use postgres::{InventoryRepository, PostgresPool};

use crate::config::Config;
use crate::error::Result;

/// Database connections bundle
#[derive(Clone)]
pub struct Database {
    /// PostgreSQL connection pool
    pub postgres: PostgresPool,
}

impl Database {
    /// Connect using application config
    pub async fn new(config: &Config) -> Result<Self> {
        let postgres = PostgresPool::new(&config.database).await?;

        Ok(Self { postgres })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        self.postgres.migrate().await
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<()> {
        self.postgres.health_check().await
    }

    /// Repository over this database
    pub fn inventory(&self) -> InventoryRepository {
        InventoryRepository::new(&self.postgres)
    }
}
