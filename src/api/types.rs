use serde::{Deserialize, Serialize};

use crate::bolt::FileMap;
use crate::project::ProjectModel;
use crate::prompt::OtherConfig;
use crate::session::{ChatMessage, FileStatus};
use crate::storage::UploadResult;

// ===== Chat Types =====

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    Chat,
    #[default]
    Builder,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub model: String,
    #[serde(default)]
    pub mode: ChatMode,
    #[serde(default)]
    pub other_config: OtherConfig,
    /// Tool definitions. Accepted for client compatibility; the streaming
    /// completion request does not forward them.
    #[serde(default)]
    pub tools: Option<serde_json::Value>,
    #[serde(default)]
    pub project_data: Option<ProjectModel>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    /// Local edits made since the last request.
    #[serde(default)]
    pub files: Option<FileMap>,
}

/// Payloads of the chat SSE stream; the variant name is the event name.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ChatEvent {
    Token { text: String },
    File { path: String, content: String },
    Done { files: FileMap },
    Error { error: String },
}

impl ChatEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::Token { .. } => "token",
            ChatEvent::File { .. } => "file",
            ChatEvent::Done { .. } => "done",
            ChatEvent::Error { .. } => "error",
        }
    }
}

// ===== Session Types =====

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFilesResponse {
    pub chat_id: String,
    pub files: FileMap,
    pub states: Vec<FileStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFilesRequest {
    pub files: FileMap,
    /// Register as the project's starting files rather than edits.
    #[serde(default)]
    pub initial: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFilesResponse {
    pub chat_id: String,
    pub changed: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlushResponse {
    pub message: Option<ChatMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadHistoryResponse {
    pub chat_id: String,
    pub messages: Vec<ChatMessage>,
    pub files: FileMap,
    pub old_files: FileMap,
}

// ===== Storage Types =====

/// `{success: true, data}` envelope used by the storage routes.
#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Success<T> {
    pub fn new(data: T) -> Self {
        Self { success: true, data }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub file_path: String,
    pub file_name: String,
    #[serde(rename = "downloadURL")]
    pub download_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub project_id: String,
    pub files: Vec<StoredFile>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    #[serde(default)]
    pub file_paths: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub deleted_count: usize,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateZipsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend: Option<UploadResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<UploadResult>,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateZipsRequest {
    pub project_id: Option<String>,
    #[serde(default)]
    pub frontend: Option<FileMap>,
    #[serde(default)]
    pub backend: Option<FileMap>,
    #[serde(default)]
    pub frontend_file_path: Option<String>,
    #[serde(default)]
    pub backend_file_path: Option<String>,
}
