use crate::bolt::FileMap;
use crate::db::models::WorkspaceFile;
use crate::db::{parse_datetime, Database, DbError};

impl Database {
    /// Write the latest content of one file. New paths are appended after
    /// the existing ones.
    pub fn upsert_workspace_file(&self, chat_id: &str, path: &str, content: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let now = chrono::Utc::now().to_rfc3339();
            conn.execute(
                r#"INSERT INTO workspace_files (chat_id, path, content, position, updated_at)
                   VALUES (?1, ?2, ?3,
                           (SELECT COALESCE(MAX(position), -1) + 1 FROM workspace_files WHERE chat_id = ?1),
                           ?4)
                   ON CONFLICT(chat_id, path) DO UPDATE SET content = ?3, updated_at = ?4"#,
                rusqlite::params![chat_id, path, content, now],
            )?;
            Ok(())
        })
    }

    pub fn list_workspace_files(&self, chat_id: &str) -> Result<Vec<WorkspaceFile>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"SELECT chat_id, path, content, position, updated_at
                   FROM workspace_files WHERE chat_id = ? ORDER BY position"#,
            )?;
            let files = stmt
                .query_map([chat_id], |row| {
                    Ok(WorkspaceFile {
                        chat_id: row.get(0)?,
                        path: row.get(1)?,
                        content: row.get(2)?,
                        position: row.get(3)?,
                        updated_at: parse_datetime(row.get(4)?),
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(files)
        })
    }

    /// The stored snapshot as a file map, in first-write order.
    pub fn workspace_file_map(&self, chat_id: &str) -> Result<FileMap, DbError> {
        Ok(self
            .list_workspace_files(chat_id)?
            .into_iter()
            .map(|f| (f.path, f.content))
            .collect())
    }

    pub fn clear_workspace(&self, chat_id: &str) -> Result<usize, DbError> {
        self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM workspace_files WHERE chat_id = ?", [chat_id])?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_keeps_first_position() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_workspace_file("c1", "b.txt", "1").unwrap();
        db.upsert_workspace_file("c1", "a.txt", "1").unwrap();
        db.upsert_workspace_file("c1", "b.txt", "2").unwrap();

        let map = db.workspace_file_map("c1").unwrap();
        assert_eq!(map.paths().collect::<Vec<_>>(), vec!["b.txt", "a.txt"]);
        assert_eq!(map.get("b.txt"), Some("2"));
    }

    #[test]
    fn chats_are_isolated() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_workspace_file("c1", "a.txt", "1").unwrap();
        db.upsert_workspace_file("c2", "a.txt", "2").unwrap();

        assert_eq!(db.clear_workspace("c1").unwrap(), 1);
        assert!(db.list_workspace_files("c1").unwrap().is_empty());
        assert_eq!(db.list_workspace_files("c2").unwrap().len(), 1);
    }
}
