use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tutorial {
    pub id: i64,
    pub journey_id: i64,
    pub title: String,
    pub position: i32,
    pub status: i32,
    pub author_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTutorial {
    pub journey_id: i64,
    pub title: String,
    pub position: i32,
    pub status: i32,
    pub author_id: Option<i64>,
}

const TUTORIAL_COLUMNS: &str =
    r#""id", "journey_id", "title", "position", "status", "author_id", "created_at", "updated_at""#;

pub async fn select_tutorials(pool: &PgPool, journey_id: i64) -> Result<Vec<Tutorial>, sqlx::Error> {
    sqlx::query_as::<_, Tutorial>(&format!(
        r#"SELECT {TUTORIAL_COLUMNS} FROM "developer_journey_tutorials"
           WHERE "journey_id" = $1 ORDER BY "position", "id""#
    ))
    .bind(journey_id)
    .fetch_all(pool)
    .await
}

pub async fn select_tutorial(pool: &PgPool, id: i64) -> Result<Option<Tutorial>, sqlx::Error> {
    sqlx::query_as::<_, Tutorial>(&format!(
        r#"SELECT {TUTORIAL_COLUMNS} FROM "developer_journey_tutorials" WHERE "id" = $1"#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Another tutorial of the same journey with this title and position.
pub async fn select_duplicate_tutorial(
    pool: &PgPool,
    journey_id: i64,
    title: &str,
    position: i32,
    exclude_id: Option<i64>,
) -> Result<Option<Tutorial>, sqlx::Error> {
    sqlx::query_as::<_, Tutorial>(&format!(
        r#"SELECT {TUTORIAL_COLUMNS} FROM "developer_journey_tutorials"
           WHERE "journey_id" = $1 AND "title" = $2 AND "position" = $3
             AND ($4::BIGINT IS NULL OR "id" <> $4)
           LIMIT 1"#
    ))
    .bind(journey_id)
    .bind(title)
    .bind(position)
    .bind(exclude_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_tutorial(pool: &PgPool, tutorial: &NewTutorial) -> Result<Tutorial, sqlx::Error> {
    sqlx::query_as::<_, Tutorial>(&format!(
        r#"
        INSERT INTO "developer_journey_tutorials" ("journey_id", "title", "position", "status", "author_id")
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {TUTORIAL_COLUMNS}
        "#
    ))
    .bind(tutorial.journey_id)
    .bind(&tutorial.title)
    .bind(tutorial.position)
    .bind(tutorial.status)
    .bind(tutorial.author_id)
    .fetch_one(pool)
    .await
}

pub async fn update_tutorial_row(pool: &PgPool, tutorial: &Tutorial) -> Result<Tutorial, sqlx::Error> {
    sqlx::query_as::<_, Tutorial>(&format!(
        r#"
        UPDATE "developer_journey_tutorials"
        SET "title" = $2, "position" = $3, "status" = $4, "updated_at" = NOW()
        WHERE "id" = $1
        RETURNING {TUTORIAL_COLUMNS}
        "#
    ))
    .bind(tutorial.id)
    .bind(&tutorial.title)
    .bind(tutorial.position)
    .bind(tutorial.status)
    .fetch_one(pool)
    .await
}

pub async fn delete_tutorial_row(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM "developer_journey_tutorials" WHERE "id" = $1"#)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
