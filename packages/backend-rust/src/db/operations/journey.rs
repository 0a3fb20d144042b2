use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Journey {
    pub id: i64,
    pub name: String,
    pub summary: Option<String>,
    pub point: i32,
    pub required_point: i32,
    pub xp: i32,
    pub required_xp: i32,
    pub status: i32,
    pub listed: i32,
    pub dead_line: Option<DateTime<Utc>>,
    /// Target study time in minutes; the completion ratio is measured against it.
    pub duration: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewJourney {
    pub name: String,
    pub summary: Option<String>,
    pub point: i32,
    pub required_point: i32,
    pub xp: i32,
    pub required_xp: i32,
    pub status: i32,
    pub listed: i32,
    pub dead_line: Option<DateTime<Utc>>,
    pub duration: i32,
}

const JOURNEY_COLUMNS: &str = r#""id", "name", "summary", "point", "required_point", "xp", "required_xp",
    "status", "listed", "dead_line", "duration", "created_at", "updated_at""#;

pub async fn select_journeys(pool: &PgPool) -> Result<Vec<Journey>, sqlx::Error> {
    sqlx::query_as::<_, Journey>(&format!(
        r#"SELECT {JOURNEY_COLUMNS} FROM "developer_journeys" ORDER BY "id""#
    ))
    .fetch_all(pool)
    .await
}

pub async fn select_journey(pool: &PgPool, id: i64) -> Result<Option<Journey>, sqlx::Error> {
    sqlx::query_as::<_, Journey>(&format!(
        r#"SELECT {JOURNEY_COLUMNS} FROM "developer_journeys" WHERE "id" = $1"#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn select_journey_by_name(
    pool: &PgPool,
    name: &str,
) -> Result<Option<Journey>, sqlx::Error> {
    sqlx::query_as::<_, Journey>(&format!(
        r#"SELECT {JOURNEY_COLUMNS} FROM "developer_journeys" WHERE "name" = $1 LIMIT 1"#
    ))
    .bind(name)
    .fetch_optional(pool)
    .await
}

pub async fn insert_journey(pool: &PgPool, journey: &NewJourney) -> Result<Journey, sqlx::Error> {
    sqlx::query_as::<_, Journey>(&format!(
        r#"
        INSERT INTO "developer_journeys" (
            "name", "summary", "point", "required_point", "xp", "required_xp",
            "status", "listed", "dead_line", "duration"
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {JOURNEY_COLUMNS}
        "#
    ))
    .bind(&journey.name)
    .bind(&journey.summary)
    .bind(journey.point)
    .bind(journey.required_point)
    .bind(journey.xp)
    .bind(journey.required_xp)
    .bind(journey.status)
    .bind(journey.listed)
    .bind(journey.dead_line)
    .bind(journey.duration)
    .fetch_one(pool)
    .await
}

pub async fn update_journey_row(pool: &PgPool, journey: &Journey) -> Result<Journey, sqlx::Error> {
    sqlx::query_as::<_, Journey>(&format!(
        r#"
        UPDATE "developer_journeys" SET
            "name" = $2, "summary" = $3, "point" = $4, "required_point" = $5,
            "xp" = $6, "required_xp" = $7, "status" = $8, "listed" = $9,
            "dead_line" = $10, "duration" = $11, "updated_at" = NOW()
        WHERE "id" = $1
        RETURNING {JOURNEY_COLUMNS}
        "#
    ))
    .bind(journey.id)
    .bind(&journey.name)
    .bind(&journey.summary)
    .bind(journey.point)
    .bind(journey.required_point)
    .bind(journey.xp)
    .bind(journey.required_xp)
    .bind(journey.status)
    .bind(journey.listed)
    .bind(journey.dead_line)
    .bind(journey.duration)
    .fetch_one(pool)
    .await
}

pub async fn delete_journey_row(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM "developer_journeys" WHERE "id" = $1"#)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
