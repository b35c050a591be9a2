use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::ChatMessage;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    pub id: String,
    pub title: String,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveChat {
    pub id: String,
    pub title: Option<String>,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceFile {
    pub chat_id: String,
    pub path: String,
    pub content: String,
    pub position: i64,
    pub updated_at: DateTime<Utc>,
}

/// Object metadata without the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub path: String,
    pub size: i64,
    pub content_type: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PutObject<'a> {
    pub path: &'a str,
    pub data: &'a [u8],
    pub content_type: &'a str,
    pub metadata: serde_json::Value,
}
