use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TutorialQuestion {
    pub id: i64,
    pub tutorial_id: i64,
    pub question_text: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub tutorial_id: i64,
    pub question_text: String,
    pub position: i32,
}

const QUESTION_COLUMNS: &str = r#""id", "tutorial_id", "question_text", "position", "created_at""#;

pub async fn select_questions(
    pool: &PgPool,
    tutorial_id: i64,
) -> Result<Vec<TutorialQuestion>, sqlx::Error> {
    sqlx::query_as::<_, TutorialQuestion>(&format!(
        r#"SELECT {QUESTION_COLUMNS} FROM "developer_journey_tutorial_questions"
           WHERE "tutorial_id" = $1 ORDER BY "position", "id""#
    ))
    .bind(tutorial_id)
    .fetch_all(pool)
    .await
}

pub async fn select_question(pool: &PgPool, id: i64) -> Result<Option<TutorialQuestion>, sqlx::Error> {
    sqlx::query_as::<_, TutorialQuestion>(&format!(
        r#"SELECT {QUESTION_COLUMNS} FROM "developer_journey_tutorial_questions" WHERE "id" = $1"#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn select_duplicate_question(
    pool: &PgPool,
    tutorial_id: i64,
    question_text: &str,
    position: i32,
    exclude_id: Option<i64>,
) -> Result<Option<TutorialQuestion>, sqlx::Error> {
    sqlx::query_as::<_, TutorialQuestion>(&format!(
        r#"SELECT {QUESTION_COLUMNS} FROM "developer_journey_tutorial_questions"
           WHERE "tutorial_id" = $1 AND "question_text" = $2 AND "position" = $3
             AND ($4::BIGINT IS NULL OR "id" <> $4)
           LIMIT 1"#
    ))
    .bind(tutorial_id)
    .bind(question_text)
    .bind(position)
    .bind(exclude_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_question(
    pool: &PgPool,
    question: &NewQuestion,
) -> Result<TutorialQuestion, sqlx::Error> {
    sqlx::query_as::<_, TutorialQuestion>(&format!(
        r#"
        INSERT INTO "developer_journey_tutorial_questions" ("tutorial_id", "question_text", "position")
        VALUES ($1, $2, $3)
        RETURNING {QUESTION_COLUMNS}
        "#
    ))
    .bind(question.tutorial_id)
    .bind(&question.question_text)
    .bind(question.position)
    .fetch_one(pool)
    .await
}

pub async fn update_question_row(
    pool: &PgPool,
    question: &TutorialQuestion,
) -> Result<TutorialQuestion, sqlx::Error> {
    sqlx::query_as::<_, TutorialQuestion>(&format!(
        r#"
        UPDATE "developer_journey_tutorial_questions"
        SET "question_text" = $2, "position" = $3
        WHERE "id" = $1
        RETURNING {QUESTION_COLUMNS}
        "#
    ))
    .bind(question.id)
    .bind(&question.question_text)
    .bind(question.position)
    .fetch_one(pool)
    .await
}

pub async fn delete_question_row(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM "developer_journey_tutorial_questions" WHERE "id" = $1"#)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
