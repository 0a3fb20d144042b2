use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::user::UserIdentity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LearningStyleRecord {
    pub id: i64,
    pub user_id: i64,
    /// First day of the month the classification covers.
    pub period: NaiveDate,
    pub learning_style: String,
    pub description: String,
    pub recommendations: Vec<String>,
    pub avg_completion_ratio: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LearningStyleUpsert {
    pub user_id: i64,
    pub period: NaiveDate,
    pub learning_style: String,
    pub description: String,
    pub recommendations: Vec<String>,
    pub avg_completion_ratio: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningStyleWithUser {
    #[serde(flatten)]
    pub record: LearningStyleRecord,
    pub user: UserIdentity,
}

#[derive(Debug, sqlx::FromRow)]
struct JoinedRow {
    id: i64,
    user_id: i64,
    period: NaiveDate,
    learning_style: String,
    description: String,
    recommendations: Vec<String>,
    avg_completion_ratio: f64,
    created_at: DateTime<Utc>,
    display_name: String,
    name: String,
    email: String,
}

impl From<JoinedRow> for LearningStyleWithUser {
    fn from(row: JoinedRow) -> Self {
        Self {
            user: UserIdentity {
                id: row.user_id,
                display_name: row.display_name,
                name: row.name,
                email: row.email,
            },
            record: LearningStyleRecord {
                id: row.id,
                user_id: row.user_id,
                period: row.period,
                learning_style: row.learning_style,
                description: row.description,
                recommendations: row.recommendations,
                avg_completion_ratio: row.avg_completion_ratio,
                created_at: row.created_at,
            },
        }
    }
}

const STYLE_COLUMNS: &str = r#""id", "user_id", "period", "learning_style", "description",
    "recommendations", "avg_completion_ratio", "created_at""#;

const JOINED_SELECT: &str = r#"
    SELECT ls."id", ls."user_id", ls."period", ls."learning_style", ls."description",
           ls."recommendations", ls."avg_completion_ratio", ls."created_at",
           u."display_name", u."name", u."email"
    FROM "user_learning_styles" ls
    JOIN "users" u ON u."id" = ls."user_id"
"#;

/// Inserts or overwrites the record for `(user_id, period)`.
pub async fn upsert_learning_style(
    pool: &PgPool,
    upsert: &LearningStyleUpsert,
) -> Result<LearningStyleRecord, sqlx::Error> {
    sqlx::query_as::<_, LearningStyleRecord>(&format!(
        r#"
        INSERT INTO "user_learning_styles" (
            "user_id", "period", "learning_style", "description",
            "recommendations", "avg_completion_ratio", "created_at"
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT ("user_id", "period") DO UPDATE SET
            "learning_style" = EXCLUDED."learning_style",
            "description" = EXCLUDED."description",
            "recommendations" = EXCLUDED."recommendations",
            "avg_completion_ratio" = EXCLUDED."avg_completion_ratio",
            "created_at" = EXCLUDED."created_at"
        RETURNING {STYLE_COLUMNS}
        "#
    ))
    .bind(upsert.user_id)
    .bind(upsert.period)
    .bind(&upsert.learning_style)
    .bind(&upsert.description)
    .bind(&upsert.recommendations)
    .bind(upsert.avg_completion_ratio)
    .bind(upsert.created_at)
    .fetch_one(pool)
    .await
}

pub async fn select_learning_style(
    pool: &PgPool,
    user_id: i64,
    period: Option<NaiveDate>,
) -> Result<Option<LearningStyleRecord>, sqlx::Error> {
    sqlx::query_as::<_, LearningStyleRecord>(&format!(
        r#"
        SELECT {STYLE_COLUMNS} FROM "user_learning_styles"
        WHERE "user_id" = $1 AND ($2::DATE IS NULL OR "period" = $2)
        ORDER BY "created_at" DESC
        LIMIT 1
        "#
    ))
    .bind(user_id)
    .bind(period)
    .fetch_optional(pool)
    .await
}

pub async fn select_latest_learning_style(
    pool: &PgPool,
    user_id: i64,
) -> Result<Option<LearningStyleWithUser>, sqlx::Error> {
    let row = sqlx::query_as::<_, JoinedRow>(&format!(
        r#"{JOINED_SELECT}
        WHERE ls."user_id" = $1
        ORDER BY ls."period" DESC, ls."created_at" DESC
        LIMIT 1"#
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Into::into))
}

pub async fn select_learning_styles_by_period(
    pool: &PgPool,
    period: NaiveDate,
) -> Result<Vec<LearningStyleWithUser>, sqlx::Error> {
    let rows = sqlx::query_as::<_, JoinedRow>(&format!(
        r#"{JOINED_SELECT}
        WHERE ls."period" = $1
        ORDER BY ls."created_at" DESC, ls."id" DESC"#
    ))
    .bind(period)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}
