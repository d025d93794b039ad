//! # Settings Repository
//!
//! Key/value settings stored as JSON text. The cost code mapping lives
//! here under [`COST_CODE_MAPPING_KEY`].
//!
//! ```text
//! save_cost_code_mapping(m) ── m.validate() ── ✗ → DbError::InvalidMapping
//!                                   │ ✓
//!                                   ▼
//!                     settings(cost_code_mapping) = JSON(m)
//!
//! load_cost_code_mapping() ── row? ── none → CostCodeMapping::default()
//!                                │
//!                                ▼
//!                     parse JSON ── validate() ── ✗ → DbError::InvalidMapping
//! ```

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use kahera_core::CostCodeMapping;

use crate::error::DbResult;

/// Settings key of the cost code mapping.
pub const COST_CODE_MAPPING_KEY: &str = "cost_code_mapping";

/// Repository for JSON settings values.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Reads and deserializes a setting.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        let raw: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serializes and writes a setting, replacing any previous value.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> DbResult<()> {
        let raw = serde_json::to_string(value)?;

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT (key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(raw)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The active cost code mapping, or the default when none was saved.
    ///
    /// A stored mapping that no longer validates is an error rather than a
    /// silent fallback, since codes already printed depend on it.
    pub async fn load_cost_code_mapping(&self) -> DbResult<CostCodeMapping> {
        match self.get::<CostCodeMapping>(COST_CODE_MAPPING_KEY).await? {
            Some(mapping) => {
                if let Err(e) = mapping.validate() {
                    warn!(error = %e, "Stored cost code mapping is invalid");
                    return Err(e.into());
                }
                Ok(mapping)
            }
            None => Ok(CostCodeMapping::default()),
        }
    }

    /// Validates and stores a cost code mapping.
    pub async fn save_cost_code_mapping(&self, mapping: &CostCodeMapping) -> DbResult<()> {
        mapping.validate()?;
        self.set(COST_CODE_MAPPING_KEY, mapping).await?;
        info!("Cost code mapping saved");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
