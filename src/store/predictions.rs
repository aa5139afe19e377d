//! Prediction repository: an append-only, per-user history.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{Instrument, info_span};

use crate::classifier::FEATURE_COUNT;
use crate::clock;
use crate::error::{Error, is_foreign_key_violation};

pub const DEFAULT_HISTORY_LIMIT: i64 = 10;

/// One immutable history row. `created_at` is already rendered for display.
#[derive(Debug, Clone)]
pub struct PredictionRecord {
    pub id: i64,
    pub user_id: i64,
    pub sepal_length: f64,
    pub sepal_width: f64,
    pub petal_length: f64,
    pub petal_width: f64,
    pub prediction_id: i64,
    pub label: String,
    pub created_at: String,
}

fn map_record(row: &SqliteRow) -> PredictionRecord {
    let created_at: String = row.get("created_at");
    PredictionRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        sepal_length: row.get("sepal_length"),
        sepal_width: row.get("sepal_width"),
        petal_length: row.get("petal_length"),
        petal_width: row.get("petal_width"),
        prediction_id: row.get("prediction_id"),
        label: row.get("label"),
        created_at: clock::format_wib(&created_at),
    }
}

/// Append one history row. Rows are never updated afterwards; a missing
/// owner surfaces as `NotFound` via the foreign-key constraint.
pub async fn append(
    pool: &SqlitePool,
    user_id: i64,
    features: [f64; FEATURE_COUNT],
    prediction_id: i64,
    label: &str,
) -> Result<PredictionRecord, Error> {
    let query = r"
        INSERT INTO predictions (
            user_id, sepal_length, sepal_width, petal_length, petal_width,
            prediction_id, label, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id, user_id, sepal_length, sepal_width, petal_length, petal_width,
                  prediction_id, label, created_at
    ";
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .bind(features[0])
        .bind(features[1])
        .bind(features[2])
        .bind(features[3])
        .bind(prediction_id)
        .bind(label)
        .bind(clock::now_wib())
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(map_record(&row)),
        Err(err) if is_foreign_key_violation(&err) => {
            Err(Error::NotFound("No such user.".to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

/// The user's most recent records, newest first. Ordered by insertion (`id`),
/// not by timestamp: two rows can share a timestamp to the second.
pub async fn recent_for_user(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<PredictionRecord>, Error> {
    let query = r"
        SELECT id, user_id, sepal_length, sepal_width, petal_length, petal_width,
               prediction_id, label, created_at
        FROM predictions
        WHERE user_id = ?
        ORDER BY id DESC
        LIMIT ?
    ";
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .instrument(span)
        .await?;
    Ok(rows.iter().map(map_record).collect())
}
