// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::Utc;
use sqlx::sqlite::SqlitePool;

use crate::models::{normalize_code, RatesPayload};

/// Cached payloads are valid for 24 hours from their fetch time.
pub const CACHE_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// One stored snapshot per base currency, TTL-windowed on read. All
/// persistence failures are swallowed here; callers never see them.
#[derive(Clone)]
pub struct CacheStore {
    pool: SqlitePool,
}

impl CacheStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Return the stored payload for `base` if it parses and is still
    /// within the TTL window. Staleness and parse failures are absence.
    pub async fn read(&self, base: &str) -> Option<RatesPayload> {
        self.read_at(base, Utc::now().timestamp_millis()).await
    }

    pub(crate) async fn read_at(&self, base: &str, now_ms: i64) -> Option<RatesPayload> {
        let base = normalize_code(base);
        let row: Option<(String, i64)> = sqlx::query_as(
            r#"
            SELECT payload, last_updated
            FROM rates_cache
            WHERE base = ?
            "#,
        )
        .bind(&base)
        .fetch_optional(&self.pool)
        .await
        .ok()?;

        let (payload, last_updated) = row?;
        if now_ms - last_updated >= CACHE_TTL_MS {
            return None;
        }

        serde_json::from_str(&payload).ok()
    }

    /// Upsert the payload under its base key. The guard on `last_updated`
    /// keeps the stored timestamp non-decreasing. Failures are logged and
    /// dropped so a full disk or locked database never breaks a refresh.
    pub async fn write(&self, payload: &RatesPayload) {
        let base = normalize_code(&payload.base);
        let json = match serde_json::to_string(payload) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("⚠️  Failed to serialize rates cache for {}: {}", base, e);
                return;
            }
        };

        let result = sqlx::query(
            r#"
            INSERT INTO rates_cache (base, payload, last_updated)
            VALUES (?, ?, ?)
            ON CONFLICT(base) DO UPDATE SET
                payload = excluded.payload,
                last_updated = excluded.last_updated,
                updated_at = CURRENT_TIMESTAMP
            WHERE excluded.last_updated >= rates_cache.last_updated
            "#,
        )
        .bind(&base)
        .bind(&json)
        .bind(payload.last_updated)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            eprintln!("⚠️  Failed to write rates cache for {}: {}", base, e);
        }
    }
}
