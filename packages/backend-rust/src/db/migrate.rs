use sqlx::PgPool;

/// Ordered schema files; names are recorded in `_migrations` once applied.
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_init_schema",
    include_str!("../../sql/001_init_schema.sql"),
)];

pub async fn run_migrations(pool: &PgPool) -> Result<usize, MigrationError> {
    tracing::info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS "_migrations" (
            "id" SERIAL PRIMARY KEY,
            "name" TEXT NOT NULL UNIQUE,
            "applied_at" TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    let applied: Vec<String> =
        sqlx::query_scalar(r#"SELECT "name" FROM "_migrations" ORDER BY "id""#)
            .fetch_all(pool)
            .await?;

    let pending = pending_migrations(&applied);
    for &(name, sql) in &pending {
        tracing::info!(migration = name, "Applying migration...");

        sqlx::raw_sql(sql)
            .execute(pool)
            .await
            .map_err(|e| MigrationError::Migration {
                name: name.to_string(),
                source: e,
            })?;

        sqlx::query(r#"INSERT INTO "_migrations" ("name") VALUES ($1)"#)
            .bind(name)
            .execute(pool)
            .await?;
    }

    if pending.is_empty() {
        tracing::info!("Database is up to date, no migrations needed");
    } else {
        tracing::info!(count = pending.len(), "Database migrations completed");
    }

    Ok(pending.len())
}

fn pending_migrations(applied: &[String]) -> Vec<(&'static str, &'static str)> {
    MIGRATIONS
        .iter()
        .filter(|(name, _)| !applied.iter().any(|a| a == name))
        .copied()
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Migration '{name}' failed: {source}")]
    Migration {
        name: String,
        #[source]
        source: sqlx::Error,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_applied_migrations() {
        assert_eq!(pending_migrations(&[]).len(), MIGRATIONS.len());
        assert!(pending_migrations(&["001_init_schema".to_string()]).is_empty());
    }

    #[test]
    fn init_schema_declares_unique_learning_style_period() {
        let (_, sql) = MIGRATIONS[0];
        assert!(sql.contains(r#"UNIQUE ("user_id", "period")"#));
        assert!(sql.contains(r#"UNIQUE ("journey_id", "user_id")"#));
    }
}
