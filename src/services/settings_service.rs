use crate::error::{AppError, AppResult};
use sqlx::SqlitePool;
use std::collections::HashMap;

#[derive(Clone)]
pub struct SettingsService {
    pool: SqlitePool,
}

impl SettingsService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_all(&self) -> AppResult<HashMap<String, String>> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().collect())
    }

    /// Per-key insert-or-replace. The batch is deliberately not atomic: keys
    /// that fail mid-batch are collected and reported, the rest stay applied.
    pub async fn upsert(&self, entries: &HashMap<String, String>) -> AppResult<()> {
        let mut failed_keys = Vec::new();

        for (key, value) in entries {
            let result = sqlx::query(
                "INSERT INTO settings (key, value) VALUES (?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            )
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await;

            if let Err(e) = result {
                log::error!("Failed to upsert setting {key}: {e}");
                failed_keys.push(key.clone());
            }
        }

        if failed_keys.is_empty() {
            Ok(())
        } else {
            failed_keys.sort();
            Err(AppError::SettingsUpdateFailed(failed_keys))
        }
    }
}
