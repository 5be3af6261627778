use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use trivia_core::model::{CategoryDocument, CategoryId, QuestionDocument, QuestionId};

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

fn from_json<T: DeserializeOwned>(field: &'static str, raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw)
        .map_err(|e| StorageError::Serialization(format!("{field}: {e}")))
}

fn optional_json<T: DeserializeOwned>(
    field: &'static str,
    raw: Option<String>,
) -> Result<Option<T>, StorageError> {
    raw.map(|raw| from_json(field, &raw)).transpose()
}

pub(crate) fn u32_to_i64(v: Option<u32>) -> Option<i64> {
    v.map(i64::from)
}

fn i64_to_u32(field: &'static str, v: Option<i64>) -> Result<Option<u32>, StorageError> {
    v.map(|v| {
        u32::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} out of range")))
    })
    .transpose()
}

pub(crate) fn usize_to_i64(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn map_category_row(row: &SqliteRow) -> Result<CategoryDocument, StorageError> {
    let display_order: i64 = row.try_get("display_order").map_err(ser)?;
    Ok(CategoryDocument {
        id: CategoryId::new(row.try_get::<String, _>("id").map_err(ser)?),
        title: from_json("title", &row.try_get::<String, _>("title").map_err(ser)?)?,
        slug: row.try_get("slug").map_err(ser)?,
        description: optional_json("description", row.try_get("description").map_err(ser)?)?,
        parent_id: row
            .try_get::<Option<String>, _>("parent_id")
            .map_err(ser)?
            .map(CategoryId::new),
        color: row.try_get("color").map_err(ser)?,
        icon: row.try_get("icon").map_err(ser)?,
        order: i32::try_from(display_order)
            .map_err(|_| StorageError::Serialization("display_order out of range".into()))?,
        time_limit_secs: i64_to_u32("time_limit_secs", row.try_get("time_limit_secs").map_err(ser)?)?,
        image_url: row.try_get("image_url").map_err(ser)?,
    })
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<QuestionDocument, StorageError> {
    let correct: i64 = row.try_get("correct_answer_index").map_err(ser)?;
    Ok(QuestionDocument {
        id: QuestionId::new(row.try_get::<String, _>("id").map_err(ser)?),
        category_id: CategoryId::new(row.try_get::<String, _>("category_id").map_err(ser)?),
        text: from_json("text", &row.try_get::<String, _>("text").map_err(ser)?)?,
        answers: from_json("answers", &row.try_get::<String, _>("answers").map_err(ser)?)?,
        correct_answer_index: usize::try_from(correct).map_err(|_| {
            StorageError::Serialization("correct_answer_index out of range".into())
        })?,
        explanation: optional_json("explanation", row.try_get("explanation").map_err(ser)?)?,
        image_url: row.try_get("image_url").map_err(ser)?,
        time_limit_secs: i64_to_u32("time_limit_secs", row.try_get("time_limit_secs").map_err(ser)?)?,
    })
}

/// Category limit joined onto question rows as `category_time_limit_secs`.
pub(crate) fn category_limit(row: &SqliteRow) -> Result<Option<u32>, StorageError> {
    i64_to_u32(
        "category_time_limit_secs",
        row.try_get("category_time_limit_secs").map_err(ser)?,
    )
}

pub(crate) fn db_err(err: sqlx::Error) -> StorageError {
    let is_fk = err
        .as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation());
    if is_fk {
        StorageError::Conflict(err.to_string())
    } else {
        StorageError::Connection(err.to_string())
    }
}
