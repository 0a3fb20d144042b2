use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub display_name: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub phone: Option<String>,
    pub user_role: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub display_name: String,
    pub name: String,
    pub email: String,
    /// Already hashed by the caller.
    pub password: String,
    pub phone: Option<String>,
    pub user_role: i32,
}

/// Identity fields joined onto administrative listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: i64,
    pub display_name: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserIdentity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: i64,
    pub token: String,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

const USER_COLUMNS: &str =
    r#""id", "display_name", "name", "email", "password", "phone", "user_role", "created_at""#;

pub async fn select_user(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(r#"SELECT {USER_COLUMNS} FROM "users" WHERE "id" = $1"#))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_user(pool: &PgPool, user: &NewUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO "users" ("display_name", "name", "email", "password", "phone", "user_role")
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&user.display_name)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password)
    .bind(&user.phone)
    .bind(user.user_role)
    .fetch_one(pool)
    .await
}

pub async fn insert_refresh_token(
    pool: &PgPool,
    token: &str,
    user_id: Option<i64>,
) -> Result<RefreshToken, sqlx::Error> {
    sqlx::query_as::<_, RefreshToken>(
        r#"
        INSERT INTO "refresh_tokens" ("token", "user_id") VALUES ($1, $2)
        RETURNING "id", "token", "user_id", "created_at"
        "#,
    )
    .bind(token)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn select_refresh_token(pool: &PgPool, token: &str) -> Result<Option<RefreshToken>, sqlx::Error> {
    sqlx::query_as::<_, RefreshToken>(
        r#"SELECT "id", "token", "user_id", "created_at" FROM "refresh_tokens" WHERE "token" = $1"#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await
}

pub async fn delete_refresh_token_row(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM "refresh_tokens" WHERE "token" = $1"#)
        .bind(token)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
