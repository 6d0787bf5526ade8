use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Args;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::range::DateWindow;

/// Settings shared by every subcommand. Each flag can also come from the
/// environment.
#[derive(Debug, Clone, Args)]
pub struct DashboardConfig {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Upper bound on pooled connections; further requests wait for a free one
    #[arg(long, env = "JOBFAIR_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,

    /// Seconds a request waits for a pooled connection before failing
    #[arg(long, env = "JOBFAIR_ACQUIRE_TIMEOUT_SECS", default_value_t = 30)]
    pub acquire_timeout_secs: u64,

    /// First day used when a request omits its start date
    #[arg(long, env = "JOBFAIR_DEFAULT_START", default_value = "2025-04-08")]
    pub default_start: NaiveDate,

    /// Last day used when a request omits its end date
    #[arg(long, env = "JOBFAIR_DEFAULT_END", default_value = "2025-04-15")]
    pub default_end: NaiveDate,
}

impl DashboardConfig {
    pub fn default_window(&self) -> DateWindow {
        DateWindow {
            start: self.default_start,
            end: self.default_end,
        }
    }

    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        let database_url = self
            .database_url
            .as_deref()
            .context("DATABASE_URL must be set to a production Postgres instance")?;

        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .connect(database_url)
            .await
            .context("failed to connect to Postgres")?;

        tracing::info!(
            max_connections = self.max_connections,
            "connected to Postgres"
        );
        Ok(pool)
    }
}
