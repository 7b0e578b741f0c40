use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use shared::domain::FunnelState;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};

/// Key the serialized funnel state is stored under.
pub const STATE_KEY: &str = "funnelState";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        let storage = Self { pool };
        storage.ensure_schema().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS funnel_state (
                state_key  TEXT PRIMARY KEY,
                payload    TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure funnel_state table exists")?;
        Ok(())
    }

    /// Serializes the full state as one flat JSON object and upserts it
    /// under [`STATE_KEY`].
    pub async fn save_funnel_state(&self, state: &FunnelState) -> Result<()> {
        let payload = serde_json::to_string(state).context("failed to serialize funnel state")?;
        sqlx::query(
            "INSERT INTO funnel_state (state_key, payload, updated_at)
             VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(state_key) DO UPDATE SET payload = excluded.payload, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(STATE_KEY)
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// `Ok(None)` when no state has been saved yet. A payload that exists but
    /// no longer parses is an `Err`; the caller decides whether that is fatal.
    pub async fn load_funnel_state(&self) -> Result<Option<FunnelState>> {
        let row = sqlx::query("SELECT payload FROM funnel_state WHERE state_key = ?")
            .bind(STATE_KEY)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let payload: String = row.get(0);
        let state = serde_json::from_str(&payload)
            .with_context(|| format!("corrupt funnel state payload under key '{STATE_KEY}'"))?;
        Ok(Some(state))
    }

    pub async fn clear_funnel_state(&self) -> Result<()> {
        sqlx::query("DELETE FROM funnel_state WHERE state_key = ?")
            .bind(STATE_KEY)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Update time of the persisted row, for operator tooling.
    pub async fn last_saved_at(&self) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT updated_at FROM funnel_state WHERE state_key = ?")
            .bind(STATE_KEY)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.get(0);
        let parsed = DateTime::parse_from_rfc3339(&raw)
            .map(|timestamp| timestamp.with_timezone(&Utc))
            .or_else(|_| {
                // CURRENT_TIMESTAMP writes "YYYY-MM-DD HH:MM:SS" in UTC.
                chrono::NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S")
                    .map(|naive| naive.and_utc())
            })
            .with_context(|| format!("unparseable updated_at '{raw}' in funnel_state"))?;
        Ok(Some(parsed))
    }

    /// Test and tooling hook: writes a raw payload under [`STATE_KEY`]
    /// without validating it.
    pub async fn save_raw_payload(&self, payload: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO funnel_state (state_key, payload, updated_at)
             VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(state_key) DO UPDATE SET payload = excluded.payload, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(STATE_KEY)
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
