use rusqlite::OptionalExtension;

use crate::db::models::{ObjectMeta, PutObject};
use crate::db::{parse_datetime, Database, DbError};

const META_COLUMNS: &str = "path, size, content_type, metadata_json, created_at, updated_at";

fn row_to_meta(row: &rusqlite::Row) -> rusqlite::Result<ObjectMeta> {
    let metadata_json: String = row.get(3)?;
    Ok(ObjectMeta {
        path: row.get(0)?,
        size: row.get(1)?,
        content_type: row.get(2)?,
        metadata: serde_json::from_str(&metadata_json).unwrap_or(serde_json::json!({})),
        created_at: parse_datetime(row.get(4)?),
        updated_at: parse_datetime(row.get(5)?),
    })
}

impl Database {
    /// Create or overwrite an object.
    pub fn put_object(&self, input: &PutObject<'_>) -> Result<ObjectMeta, DbError> {
        let metadata_json = serde_json::to_string(&input.metadata)?;
        self.with_conn(|conn| {
            let now = chrono::Utc::now().to_rfc3339();
            conn.execute(
                r#"INSERT INTO objects (path, data, size, content_type, metadata_json, created_at, updated_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                   ON CONFLICT(path) DO UPDATE SET
                       data = ?2, size = ?3, content_type = ?4, metadata_json = ?5, updated_at = ?6"#,
                rusqlite::params![
                    input.path,
                    input.data,
                    input.data.len() as i64,
                    input.content_type,
                    metadata_json,
                    now,
                ],
            )?;
            conn.query_row(
                &format!("SELECT {} FROM objects WHERE path = ?", META_COLUMNS),
                [input.path],
                row_to_meta,
            )
            .map_err(DbError::from)
        })
    }

    pub fn object_exists(&self, path: &str) -> Result<bool, DbError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM objects WHERE path = ?",
                [path],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    pub fn get_object_meta(&self, path: &str) -> Result<Option<ObjectMeta>, DbError> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {} FROM objects WHERE path = ?", META_COLUMNS),
                    [path],
                    row_to_meta,
                )
                .optional()?)
        })
    }

    pub fn get_object(&self, path: &str) -> Result<Option<(ObjectMeta, Vec<u8>)>, DbError> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {}, data FROM objects WHERE path = ?", META_COLUMNS),
                    [path],
                    |row| Ok((row_to_meta(row)?, row.get::<_, Vec<u8>>(6)?)),
                )
                .optional()?)
        })
    }

    /// Returns false when nothing was stored at `path`.
    pub fn delete_object(&self, path: &str) -> Result<bool, DbError> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM objects WHERE path = ?", [path])?;
            Ok(affected > 0)
        })
    }

    /// Objects whose path starts with `prefix`, sorted by path.
    pub fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectMeta>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM objects WHERE substr(path, 1, length(?1)) = ?1 ORDER BY path",
                META_COLUMNS
            ))?;
            let objects = stmt
                .query_map([prefix], row_to_meta)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(objects)
        })
    }
}
