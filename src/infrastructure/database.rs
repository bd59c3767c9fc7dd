//! Pooled SQLite connection

use crate::config::AppConfig;
use di::{Ref, inject, injectable};
use log::info;
use sqlx::SqlitePool;
use sqlx::migrate::MigrateError;
use sqlx::sqlite::SqlitePoolOptions;
use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

/// Pool handed to every `DatabaseConnection` created while set.
///
/// The DI container builds connections itself, so tests swap the database
/// through this slot instead of through the container.
static TEST_POOL: Mutex<Option<SqlitePool>> = Mutex::new(None);

pub struct DatabaseConnection {
    connection: SqlitePool,
}

#[injectable]
impl DatabaseConnection {
    #[inject]
    pub fn create(config: Ref<AppConfig>) -> DatabaseConnection {
        if let Some(pool) = Self::test_pool() {
            return DatabaseConnection { connection: pool };
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_lazy_with(config.database.clone());

        DatabaseConnection { connection: pool }
    }
}

impl DatabaseConnection {
    pub fn from_pool(pool: SqlitePool) -> Self {
        DatabaseConnection { connection: pool }
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!().run(&self.connection).await?;
        info!("database migrations applied");
        Ok(())
    }

    pub fn set_test_pool(pool: SqlitePool) {
        *TEST_POOL.lock().unwrap_or_else(|e| e.into_inner()) = Some(pool);
    }

    pub fn clear_test_pool() {
        TEST_POOL.lock().unwrap_or_else(|e| e.into_inner()).take();
    }

    fn test_pool() -> Option<SqlitePool> {
        TEST_POOL.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Deref for DatabaseConnection {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}

impl DerefMut for DatabaseConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.connection
    }
}
