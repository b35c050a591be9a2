use rusqlite::OptionalExtension;

use crate::db::models::{ChatRecord, SaveChat};
use crate::db::{parse_datetime, Database, DbError};

const CHAT_COLUMNS: &str =
    "id, title, user_id, project_id, messages_json, created_at, updated_at";

fn row_to_chat(row: &rusqlite::Row) -> rusqlite::Result<(ChatRecord, String)> {
    let messages_json: String = row.get(4)?;
    Ok((
        ChatRecord {
            id: row.get(0)?,
            title: row.get(1)?,
            user_id: row.get(2)?,
            project_id: row.get(3)?,
            messages: Vec::new(),
            created_at: parse_datetime(row.get(5)?),
            updated_at: parse_datetime(row.get(6)?),
        },
        messages_json,
    ))
}

fn with_messages((mut chat, json): (ChatRecord, String)) -> ChatRecord {
    chat.messages = serde_json::from_str(&json).unwrap_or_else(|e| {
        tracing::warn!(chat_id = %chat.id, "Unreadable stored messages: {}", e);
        Vec::new()
    });
    chat
}

impl Database {
    /// Insert or replace a chat's history. The title defaults to the first
    /// user message that is not a replayed artifact.
    pub fn save_chat(&self, input: &SaveChat) -> Result<ChatRecord, DbError> {
        let title = input.title.clone().unwrap_or_else(|| default_title(input));
        let messages_json = serde_json::to_string(&input.messages)?;

        self.with_conn(|conn| {
            let now = chrono::Utc::now().to_rfc3339();
            conn.execute(
                r#"INSERT INTO chats (id, title, user_id, project_id, messages_json, created_at, updated_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                   ON CONFLICT(id) DO UPDATE SET
                       title = ?2,
                       user_id = COALESCE(?3, user_id),
                       project_id = COALESCE(?4, project_id),
                       messages_json = ?5,
                       updated_at = ?6"#,
                rusqlite::params![
                    input.id,
                    title,
                    input.user_id,
                    input.project_id,
                    messages_json,
                    now,
                ],
            )?;
            Ok(())
        })?;

        tracing::debug!(chat_id = %input.id, messages = input.messages.len(), "Saved chat");
        self.get_chat(&input.id)?
            .ok_or_else(|| DbError::NotFound(format!("Chat {}", input.id)))
    }

    pub fn get_chat(&self, chat_id: &str) -> Result<Option<ChatRecord>, DbError> {
        let row = self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {} FROM chats WHERE id = ?", CHAT_COLUMNS),
                    [chat_id],
                    row_to_chat,
                )
                .optional()?)
        })?;
        Ok(row.map(with_messages))
    }

    pub fn list_chats(&self, user_id: Option<&str>) -> Result<Vec<ChatRecord>, DbError> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM chats WHERE (?1 IS NULL OR user_id = ?1) ORDER BY updated_at DESC",
                CHAT_COLUMNS
            ))?;
            let rows = stmt
                .query_map([user_id], row_to_chat)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;
        Ok(rows.into_iter().map(with_messages).collect())
    }

    pub fn delete_chat(&self, chat_id: &str) -> Result<(), DbError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let affected = tx.execute("DELETE FROM chats WHERE id = ?", [chat_id])?;
            if affected == 0 {
                return Err(DbError::NotFound(format!("Chat {}", chat_id)));
            }
            tx.execute("DELETE FROM workspace_files WHERE chat_id = ?", [chat_id])?;
            tx.commit()?;
            Ok(())
        })
    }
}

fn default_title(input: &SaveChat) -> String {
    input
        .messages
        .iter()
        .find(|m| m.role == crate::session::Role::User && !m.content.contains("<boltArtifact"))
        .map(|m| m.content.chars().take(50).collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "New Chat".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ChatMessage;

    fn save(db: &Database, id: &str, user: Option<&str>, messages: Vec<ChatMessage>) -> ChatRecord {
        db.save_chat(&SaveChat {
            id: id.to_string(),
            title: None,
            user_id: user.map(String::from),
            project_id: None,
            messages,
        })
        .unwrap()
    }

    #[test]
    fn save_then_get_round_trips_messages() {
        let db = Database::open_in_memory().unwrap();
        let saved = save(
            &db,
            "c1",
            Some("u1"),
            vec![ChatMessage::user("Build a todo app"), ChatMessage::assistant("ok")],
        );
        assert_eq!(saved.title, "Build a todo app");

        let loaded = db.get_chat("c1").unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 2);
        assert_eq!(loaded.messages[1].content, "ok");
        assert!(db.get_chat("missing").unwrap().is_none());
    }

    #[test]
    fn saving_again_replaces_messages_and_keeps_owner() {
        let db = Database::open_in_memory().unwrap();
        save(&db, "c1", Some("u1"), vec![ChatMessage::user("a")]);
        let updated = save(&db, "c1", None, vec![ChatMessage::user("a"), ChatMessage::assistant("b")]);

        assert_eq!(updated.messages.len(), 2);
        assert_eq!(updated.user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn title_skips_replayed_artifacts() {
        let db = Database::open_in_memory().unwrap();
        let artifact = ChatMessage::user("<boltArtifact id=\"project-files\" title=\"the current file\">\n</boltArtifact>");
        let saved = save(&db, "c1", None, vec![artifact.clone(), ChatMessage::user("x".repeat(80))]);
        assert_eq!(saved.title.len(), 50);

        let saved = save(&db, "c2", None, vec![artifact]);
        assert_eq!(saved.title, "New Chat");
    }

    #[test]
    fn list_filters_by_user() {
        let db = Database::open_in_memory().unwrap();
        save(&db, "c1", Some("u1"), vec![]);
        save(&db, "c2", Some("u2"), vec![]);

        assert_eq!(db.list_chats(Some("u1")).unwrap().len(), 1);
        assert_eq!(db.list_chats(None).unwrap().len(), 2);
    }

    #[test]
    fn delete_removes_workspace_too() {
        let db = Database::open_in_memory().unwrap();
        save(&db, "c1", None, vec![]);
        db.upsert_workspace_file("c1", "a.txt", "x").unwrap();

        db.delete_chat("c1").unwrap();
        assert!(db.get_chat("c1").unwrap().is_none());
        assert!(db.list_workspace_files("c1").unwrap().is_empty());
        assert!(matches!(db.delete_chat("c1"), Err(DbError::NotFound(_))));
    }
}
