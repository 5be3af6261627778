use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Applies schema migrations in order, recording each in `schema_migrations`.
///
/// - v1: content tables (categories, questions) and their indexes.
/// - v2: player preferences.
/// - v3: category image references.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    async fn mark_applied(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        version: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(version)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        tracing::info!(version = 1, "applying content schema migration");
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS categories (
                    id TEXT PRIMARY KEY,
                    slug TEXT NOT NULL,
                    parent_id TEXT,
                    color TEXT,
                    icon TEXT,
                    display_order INTEGER NOT NULL DEFAULT 0,
                    time_limit_secs INTEGER CHECK (time_limit_secs >= 0),
                    title TEXT NOT NULL,
                    description TEXT,
                    FOREIGN KEY (parent_id) REFERENCES categories(id) ON DELETE SET NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS questions (
                    id TEXT PRIMARY KEY,
                    category_id TEXT NOT NULL,
                    text TEXT NOT NULL,
                    answers TEXT NOT NULL,
                    correct_answer_index INTEGER NOT NULL CHECK (correct_answer_index >= 0),
                    explanation TEXT,
                    image_url TEXT,
                    time_limit_secs INTEGER CHECK (time_limit_secs >= 0),
                    FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_categories_parent_order
                    ON categories (parent_id, display_order, id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_questions_category
                    ON questions (category_id, id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        mark_applied(&mut tx, 1).await?;
        tx.commit().await?;
    }

    if !is_applied(pool, 2).await? {
        tracing::info!(version = 2, "applying preferences schema migration");
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS preferences (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        mark_applied(&mut tx, 2).await?;
        tx.commit().await?;
    }

    if !is_applied(pool, 3).await? {
        tracing::info!(version = 3, "applying category image migration");
        let mut tx = pool.begin().await?;

        sqlx::query("ALTER TABLE categories ADD COLUMN image_url TEXT;")
            .execute(&mut *tx)
            .await?;

        mark_applied(&mut tx, 3).await?;
        tx.commit().await?;
    }

    Ok(())
}
