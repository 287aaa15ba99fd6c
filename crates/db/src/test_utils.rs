//! Helpers for integration tests that need a real `PostgreSQL` server.
//!
//! Tests either reuse a pre-created database (`TestDatabase::with_config`)
//! or get a throwaway one with a random name (`TestDatabase::create_unique`)
//! that they drop when done.

use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use tracing::debug;

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

/// Connection settings for the test server, read from `TEST_DB_*` variables.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: env_or("TEST_DB_HOST", "localhost"),
            port: env_or("TEST_DB_PORT", "5433").parse().unwrap_or(5433),
            username: env_or("TEST_DB_USER", "plaza_test"),
            password: env_or("TEST_DB_PASSWORD", "plaza_test"),
            database: env_or("TEST_DB_NAME", "plaza_test"),
        }
    }
}

impl TestDbConfig {
    /// URL of the test database itself.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    /// URL of the maintenance `postgres` database, used to create and
    /// drop test databases.
    #[must_use]
    pub fn admin_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/postgres",
            self.username, self.password, self.host, self.port
        )
    }
}

/// A connected test database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: DatabaseConnection,
    /// Settings the connection was opened with.
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect to the shared test database named in the environment.
    pub async fn new() -> Result<Self, DbErr> {
        Self::with_config(TestDbConfig::default()).await
    }

    /// Connect with explicit settings.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        debug!(database = %config.database, "connected to test database");
        Ok(Self { conn, config })
    }

    /// Create a randomly named database so parallel tests never collide.
    ///
    /// The caller owns the database and should finish with
    /// [`drop_database`](Self::drop_database).
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        config.database = format!("plaza_test_{}", &suffix[..8]);

        let admin = Database::connect(&config.admin_url()).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{}\"", config.database),
            ))
            .await?;
        admin.close().await?;

        debug!(database = %config.database, "created test database");
        Self::with_config(config).await
    }

    /// Get the database connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Truncate every application table, keeping the schema and the
    /// migration bookkeeping intact.
    pub async fn truncate_all(&self) -> Result<(), DbErr> {
        let rows = self
            .conn
            .query_all(Statement::from_string(
                DatabaseBackend::Postgres,
                "SELECT tablename FROM pg_tables WHERE schemaname = 'public'".to_string(),
            ))
            .await?;

        for row in rows {
            let Ok(table) = row.try_get::<String>("", "tablename") else {
                continue;
            };
            if table == "seaql_migrations" {
                continue;
            }
            self.conn
                .execute(Statement::from_string(
                    DatabaseBackend::Postgres,
                    format!("TRUNCATE TABLE \"{table}\" CASCADE"),
                ))
                .await?;
        }

        Ok(())
    }

    /// Drop the database created by [`create_unique`](Self::create_unique).
    ///
    /// Consumes self so the connection is closed before the drop; any
    /// straggler backends are terminated first.
    pub async fn drop_database(self) -> Result<(), DbErr> {
        self.conn.close().await?;

        let admin = Database::connect(&self.config.admin_url()).await?;
        let _ = admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!(
                    "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}'",
                    self.config.database
                ),
            ))
            .await;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("DROP DATABASE IF EXISTS \"{}\"", self.config.database),
            ))
            .await?;
        admin.close().await?;

        debug!(database = %self.config.database, "dropped test database");
        Ok(())
    }
}
