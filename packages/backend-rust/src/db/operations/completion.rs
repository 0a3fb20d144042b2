use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct JourneyCompletion {
    pub id: i64,
    pub journey_id: i64,
    pub user_id: i64,
    pub enrolling_times: i32,
    pub enrollments_at: DateTime<Utc>,
    pub last_enrolled_at: DateTime<Utc>,
    /// Accumulated minutes; only ever grows.
    pub study_duration: i32,
    pub avg_submission_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCompletion {
    pub journey_id: i64,
    pub user_id: i64,
    pub study_duration: i32,
    pub enrolled_at: DateTime<Utc>,
}

/// Per-user activity totals for one aggregation window. This is the wire
/// shape sent to the prediction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMetric {
    pub user_id: i64,
    pub module_count: i64,
    pub total_study_duration: i64,
    pub avg_study_per_module: f64,
    pub avg_submission_rating: f64,
    pub avg_completion_ratio: f64,
}

impl UserMetric {
    pub fn from_totals(
        user_id: i64,
        module_count: i64,
        total_study_duration: i64,
        avg_submission_rating: f64,
        avg_completion_ratio: f64,
    ) -> Self {
        let avg_study_per_module = if module_count > 0 {
            total_study_duration as f64 / module_count as f64
        } else {
            0.0
        };

        Self {
            user_id,
            module_count,
            total_study_duration,
            avg_study_per_module,
            avg_submission_rating: finite_or_zero(avg_submission_rating),
            avg_completion_ratio: finite_or_zero(avg_completion_ratio),
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

const COMPLETION_COLUMNS: &str = r#""id", "journey_id", "user_id", "enrolling_times", "enrollments_at",
    "last_enrolled_at", "study_duration", "avg_submission_rating", "created_at""#;

pub async fn select_completion(
    pool: &PgPool,
    journey_id: i64,
    user_id: i64,
) -> Result<Option<JourneyCompletion>, sqlx::Error> {
    sqlx::query_as::<_, JourneyCompletion>(&format!(
        r#"SELECT {COMPLETION_COLUMNS} FROM "developer_journey_completions"
           WHERE "journey_id" = $1 AND "user_id" = $2"#
    ))
    .bind(journey_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_completion(
    pool: &PgPool,
    completion: &NewCompletion,
) -> Result<JourneyCompletion, sqlx::Error> {
    sqlx::query_as::<_, JourneyCompletion>(&format!(
        r#"
        INSERT INTO "developer_journey_completions" (
            "journey_id", "user_id", "enrolling_times", "enrollments_at",
            "last_enrolled_at", "study_duration", "created_at"
        ) VALUES ($1, $2, 1, $3, $3, $4, $3)
        RETURNING {COMPLETION_COLUMNS}
        "#
    ))
    .bind(completion.journey_id)
    .bind(completion.user_id)
    .bind(completion.enrolled_at)
    .bind(completion.study_duration)
    .fetch_one(pool)
    .await
}

/// Adds minutes in place so concurrent reports never lose time.
pub async fn add_study_minutes(
    pool: &PgPool,
    id: i64,
    minutes: i32,
    at: DateTime<Utc>,
) -> Result<Option<JourneyCompletion>, sqlx::Error> {
    sqlx::query_as::<_, JourneyCompletion>(&format!(
        r#"
        UPDATE "developer_journey_completions"
        SET "study_duration" = "study_duration" + $2, "last_enrolled_at" = $3
        WHERE "id" = $1
        RETURNING {COMPLETION_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(minutes)
    .bind(at)
    .fetch_optional(pool)
    .await
}

#[derive(Debug, sqlx::FromRow)]
struct AggregateRow {
    user_id: i64,
    module_count: i64,
    total_study_duration: i64,
    avg_submission_rating: f64,
    avg_completion_ratio: f64,
}

/// Groups completion rows created inside `[start, end]` by user. Users with
/// no qualifying row do not appear. A journey without a target duration
/// contributes a ratio of 0.
pub async fn aggregate_learning_metrics(
    pool: &PgPool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<UserMetric>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AggregateRow>(
        r#"
        SELECT
            djc."user_id" AS user_id,
            COUNT(DISTINCT djc."journey_id")::BIGINT AS module_count,
            COALESCE(SUM(djc."study_duration"), 0)::BIGINT AS total_study_duration,
            COALESCE(AVG(djc."avg_submission_rating"), 0)::FLOAT8 AS avg_submission_rating,
            COALESCE(AVG(
                COALESCE(CAST(djc."study_duration" AS FLOAT8) / NULLIF(dj."duration", 0), 0)
            ), 0)::FLOAT8 AS avg_completion_ratio
        FROM "developer_journey_completions" djc
        JOIN "developer_journeys" dj ON djc."journey_id" = dj."id"
        WHERE djc."created_at" >= $1 AND djc."created_at" <= $2
        GROUP BY djc."user_id"
        ORDER BY djc."user_id"
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            UserMetric::from_totals(
                row.user_id,
                row.module_count,
                row.total_study_duration,
                row.avg_submission_rating,
                row.avg_completion_ratio,
            )
        })
        .collect())
}
