use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use trivia_core::model::{Category, CategoryDocument, CategoryId, Locale, Question, QuestionDocument};

use super::SqliteRepository;
use super::mapping::{
    category_limit, db_err, map_category_row, map_question_row, to_json, u32_to_i64, usize_to_i64,
};
use crate::repository::{
    CategoryRepository, ContentWriter, QuestionRepository, StorageError, check_category,
    check_question, localize_category, localize_question,
};

const CATEGORY_COLUMNS: &str = r"
    id, slug, parent_id, color, icon, display_order, time_limit_secs, title, description, image_url
";

fn question_from_row(row: &SqliteRow, locale: Locale) -> Result<Question, StorageError> {
    let doc = map_question_row(row)?;
    localize_question(&doc, locale, category_limit(row)?)
}

impl SqliteRepository {
    async fn category_docs_where(
        &self,
        filter: &str,
        parent_id: Option<&CategoryId>,
    ) -> Result<Vec<CategoryDocument>, StorageError> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE {filter} ORDER BY display_order ASC, id ASC"
        );
        let mut query = sqlx::query(&sql);
        if let Some(parent) = parent_id {
            query = query.bind(parent.as_str().to_owned());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(map_category_row).collect()
    }
}

#[async_trait]
impl QuestionRepository for SqliteRepository {
    async fn questions_for_category(
        &self,
        category_id: &CategoryId,
        locale: Locale,
    ) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                q.id, q.category_id, q.text, q.answers, q.correct_answer_index,
                q.explanation, q.image_url, q.time_limit_secs,
                c.time_limit_secs AS category_time_limit_secs
            FROM questions q
            JOIN categories c ON c.id = q.category_id
            WHERE q.category_id = ?1
            ORDER BY q.id ASC
            ",
        )
        .bind(category_id.as_str().to_owned())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        // A row that no longer decodes is dropped so the rest stay playable.
        Ok(rows
            .iter()
            .filter_map(|row| match question_from_row(row, locale) {
                Ok(question) => Some(question),
                Err(err) => {
                    let question_id: String = row.try_get("id").unwrap_or_default();
                    tracing::warn!(question_id = %question_id, error = %err, "skipping invalid question row");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl CategoryRepository for SqliteRepository {
    async fn top_level_categories(&self, locale: Locale) -> Result<Vec<Category>, StorageError> {
        self.category_docs_where("parent_id IS NULL", None)
            .await?
            .iter()
            .map(|doc| localize_category(doc, locale))
            .collect()
    }

    async fn subcategories(
        &self,
        parent_id: &CategoryId,
        locale: Locale,
    ) -> Result<Vec<Category>, StorageError> {
        self.category_docs_where("parent_id = ?1", Some(parent_id))
            .await?
            .iter()
            .map(|doc| localize_category(doc, locale))
            .collect()
    }

    async fn get_category(
        &self,
        id: &CategoryId,
        locale: Locale,
    ) -> Result<Option<Category>, StorageError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id.as_str().to_owned())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.map(|row| {
            let doc = map_category_row(&row)?;
            localize_category(&doc, locale)
        })
        .transpose()
    }
}

#[async_trait]
impl ContentWriter for SqliteRepository {
    async fn upsert_category(&self, category: &CategoryDocument) -> Result<(), StorageError> {
        check_category(category)?;

        sqlx::query(
            r"
            INSERT INTO categories (
                id, slug, parent_id, color, icon, display_order, time_limit_secs, title, description,
                image_url
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                slug = excluded.slug,
                parent_id = excluded.parent_id,
                color = excluded.color,
                icon = excluded.icon,
                display_order = excluded.display_order,
                time_limit_secs = excluded.time_limit_secs,
                title = excluded.title,
                description = excluded.description,
                image_url = excluded.image_url
            ",
        )
        .bind(category.id.as_str().to_owned())
        .bind(category.slug.clone())
        .bind(category.parent_id.as_ref().map(|p| p.as_str().to_owned()))
        .bind(category.color.clone())
        .bind(category.icon.clone())
        .bind(i64::from(category.order))
        .bind(u32_to_i64(category.time_limit_secs))
        .bind(to_json(&category.title)?)
        .bind(category.description.as_ref().map(to_json).transpose()?)
        .bind(category.image_url.clone())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn upsert_question(&self, question: &QuestionDocument) -> Result<(), StorageError> {
        check_question(question)?;

        sqlx::query(
            r"
            INSERT INTO questions (
                id, category_id, text, answers, correct_answer_index,
                explanation, image_url, time_limit_secs
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                category_id = excluded.category_id,
                text = excluded.text,
                answers = excluded.answers,
                correct_answer_index = excluded.correct_answer_index,
                explanation = excluded.explanation,
                image_url = excluded.image_url,
                time_limit_secs = excluded.time_limit_secs
            ",
        )
        .bind(question.id.as_str().to_owned())
        .bind(question.category_id.as_str().to_owned())
        .bind(to_json(&question.text)?)
        .bind(to_json(&question.answers)?)
        .bind(usize_to_i64("correct_answer_index", question.correct_answer_index)?)
        .bind(question.explanation.as_ref().map(to_json).transpose()?)
        .bind(question.image_url.clone())
        .bind(u32_to_i64(question.time_limit_secs))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }
}
