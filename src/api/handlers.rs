use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use super::auth::AuthUser;
use super::error::{ApiResult, AppError};
use super::state::AppState;
use super::types::*;
use crate::db::ChatRecord;
use crate::llm::ModelEntry;

pub async fn health() -> &'static str {
    "ok"
}

pub async fn list_models(State(state): State<AppState>) -> Json<Vec<ModelEntry>> {
    Json(state.models.entries().to_vec())
}

/// Reject access to a stored chat owned by someone else. Unknown chats are
/// allowed; they are created on first use.
pub(crate) fn ensure_chat_access(state: &AppState, user: &AuthUser, chat_id: &str) -> ApiResult<Option<ChatRecord>> {
    let chat = state.db.get_chat(chat_id)?;
    if let Some(owner) = chat.as_ref().and_then(|c| c.user_id.as_deref()) {
        if owner != user.user_id {
            tracing::warn!(chat_id, user_id = %user.user_id, "Chat belongs to another user");
            return Err(AppError::forbidden("Chat belongs to another user"));
        }
    }
    Ok(chat)
}

pub async fn list_chats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<ChatRecord>>> {
    let chats = state.db.list_chats(Some(&user.user_id))?;
    Ok(Json(chats))
}

pub async fn get_chat(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<ChatRecord>> {
    let chat = ensure_chat_access(&state, &user, &chat_id)?.ok_or_else(|| AppError::not_found("Chat not found"))?;
    Ok(Json(chat))
}

pub async fn delete_chat(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(chat_id): Path<String>,
) -> ApiResult<StatusCode> {
    let chat = ensure_chat_access(&state, &user, &chat_id)?;
    state.generations.stop(&chat_id);
    let had_session = state.sessions.remove(&chat_id);
    if chat.is_some() {
        state.db.delete_chat(&chat_id)?;
    } else {
        state.db.clear_workspace(&chat_id)?;
        if !had_session {
            return Err(AppError::not_found("Chat not found"));
        }
    }
    tracing::info!(chat_id = %chat_id, "Chat deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_session_files(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<SessionFilesResponse>> {
    ensure_chat_access(&state, &user, &chat_id)?;
    let shared = state
        .sessions
        .get(&chat_id)
        .ok_or_else(|| AppError::not_found("Chat session not found"))?;
    let session = shared.lock().expect("session mutex poisoned");

    Ok(Json(SessionFilesResponse {
        chat_id,
        files: session.files().clone(),
        states: session.file_states(),
    }))
}

pub async fn update_session_files(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(chat_id): Path<String>,
    Json(req): Json<UpdateFilesRequest>,
) -> ApiResult<Json<UpdateFilesResponse>> {
    ensure_chat_access(&state, &user, &chat_id)?;
    let shared = state.sessions.get_or_create(&chat_id);
    let mut session = shared.lock().expect("session mutex poisoned");

    let changed: Vec<String> = if req.initial {
        session.load_initial(req.files.clone());
        req.files
            .paths()
            .filter(|p| session.files().contains(p))
            .map(str::to_string)
            .collect()
    } else {
        req.files
            .iter()
            .filter(|(path, content)| session.update_file(path, content))
            .map(|(path, _)| path.to_string())
            .collect()
    };

    for path in changed.iter() {
        if let Some(content) = req.files.get(path) {
            state.sync_queue.enqueue(&chat_id, path, content);
        }
    }

    tracing::debug!(chat_id = %chat_id, changed = changed.len(), initial = req.initial, "Updated session files");
    Ok(Json(UpdateFilesResponse { chat_id, changed }))
}

/// Rebuild a session from the stored chat, then re-apply workspace edits
/// made after the last reply.
pub async fn load_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<LoadHistoryResponse>> {
    let chat = ensure_chat_access(&state, &user, &chat_id)?.ok_or_else(|| AppError::not_found("Chat not found"))?;
    let workspace = state.db.workspace_file_map(&chat_id)?;

    let shared = state.sessions.get_or_create(&chat_id);
    let mut session = shared.lock().expect("session mutex poisoned");
    session.load_history(chat.messages);
    for (path, content) in workspace.iter() {
        session.update_file(path, content);
    }

    Ok(Json(LoadHistoryResponse {
        chat_id,
        messages: session.messages().to_vec(),
        files: session.files().clone(),
        old_files: session.old_files().clone(),
    }))
}

pub async fn flush_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<FlushResponse>> {
    ensure_chat_access(&state, &user, &chat_id)?;
    let message = state
        .sessions
        .get(&chat_id)
        .and_then(|shared| shared.lock().expect("session mutex poisoned").flush());
    Ok(Json(FlushResponse { message }))
}

/// Last saved generation of a project, read through from the project API.
pub async fn get_project_generation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let generation = state
        .projects
        .fetch_generation(&project_id, &user.token)
        .await?
        .ok_or_else(|| AppError::not_found("Generation not found"))?;
    Ok(Json(generation))
}
