use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::inference::pipeline::PredictionResult;

/// One persisted inference outcome. Append-only; rows are never
/// updated or deleted by this service.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PredictionRecord {
    pub id: i64,
    pub image_reference: String,
    pub label: String,
    pub real_confidence: f64,
    pub fake_confidence: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PredictionRepository {
    pool: SqlitePool,
}

impl PredictionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends one row and returns its surrogate id.
    pub async fn record(
        &self,
        result: &PredictionResult,
        image_reference: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO predictions (image_reference, label, real_confidence, fake_confidence, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(image_reference)
        .bind(result.label.to_string())
        .bind(result.real_confidence)
        .bind(result.fake_confidence)
        .bind(timestamp)
        .execute(&self.pool)
        .await?;
        Ok(inserted.last_insert_rowid())
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<PredictionRecord>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT id, image_reference, label, real_confidence, fake_confidence, timestamp
            FROM predictions
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}
