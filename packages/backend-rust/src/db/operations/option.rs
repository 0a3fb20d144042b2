use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TutorialOption {
    pub id: i64,
    pub question_id: i64,
    pub option_label: String,
    pub option_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOption {
    pub question_id: i64,
    pub option_label: String,
    pub option_text: String,
}

pub async fn select_options(pool: &PgPool, question_id: i64) -> Result<Vec<TutorialOption>, sqlx::Error> {
    sqlx::query_as::<_, TutorialOption>(
        r#"SELECT "id", "question_id", "option_label", "option_text" FROM "tutorial_options"
           WHERE "question_id" = $1 ORDER BY "option_label", "id""#,
    )
    .bind(question_id)
    .fetch_all(pool)
    .await
}

pub async fn select_option(pool: &PgPool, id: i64) -> Result<Option<TutorialOption>, sqlx::Error> {
    sqlx::query_as::<_, TutorialOption>(
        r#"SELECT "id", "question_id", "option_label", "option_text" FROM "tutorial_options" WHERE "id" = $1"#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Matches on text, and on label too when one is given.
pub async fn select_duplicate_option(
    pool: &PgPool,
    question_id: i64,
    option_label: Option<&str>,
    option_text: &str,
    exclude_id: Option<i64>,
) -> Result<Option<TutorialOption>, sqlx::Error> {
    sqlx::query_as::<_, TutorialOption>(
        r#"SELECT "id", "question_id", "option_label", "option_text" FROM "tutorial_options"
           WHERE "question_id" = $1 AND "option_text" = $2
             AND ($3::TEXT IS NULL OR "option_label" = $3)
             AND ($4::BIGINT IS NULL OR "id" <> $4)
           LIMIT 1"#,
    )
    .bind(question_id)
    .bind(option_text)
    .bind(option_label)
    .bind(exclude_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_option(pool: &PgPool, option: &NewOption) -> Result<TutorialOption, sqlx::Error> {
    sqlx::query_as::<_, TutorialOption>(
        r#"
        INSERT INTO "tutorial_options" ("question_id", "option_label", "option_text")
        VALUES ($1, $2, $3)
        RETURNING "id", "question_id", "option_label", "option_text"
        "#,
    )
    .bind(option.question_id)
    .bind(&option.option_label)
    .bind(&option.option_text)
    .fetch_one(pool)
    .await
}

pub async fn update_option_text_row(
    pool: &PgPool,
    id: i64,
    option_text: &str,
) -> Result<Option<TutorialOption>, sqlx::Error> {
    sqlx::query_as::<_, TutorialOption>(
        r#"
        UPDATE "tutorial_options" SET "option_text" = $2 WHERE "id" = $1
        RETURNING "id", "question_id", "option_label", "option_text"
        "#,
    )
    .bind(id)
    .bind(option_text)
    .fetch_optional(pool)
    .await
}

pub async fn delete_option_row(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM "tutorial_options" WHERE "id" = $1"#)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_options_for_question_rows(pool: &PgPool, question_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM "tutorial_options" WHERE "question_id" = $1"#)
        .bind(question_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
