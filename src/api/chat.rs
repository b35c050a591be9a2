//! `POST /api/chat`: streams a completion as server-sent events while
//! extracting the files it writes.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use futures::stream::{Stream, StreamExt};
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;

use super::auth::AuthUser;
use super::error::{ApiResult, AppError};
use super::handlers::ensure_chat_access;
use super::state::AppState;
use super::types::{ChatEvent, ChatMode, ChatRequest};
use crate::bolt::{FileMap, StreamParser};
use crate::db::SaveChat;
use crate::llm::{CompletionRequest, TokenStream};
use crate::prompt::{builder_system_prompt, chat_system_prompt};
use crate::session::{ChatMessage, Flushed, Role};

pub async fn chat(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let model = state.models.resolve(&req.model)?.clone();

    if let Some(chat_id) = &req.chat_id {
        ensure_chat_access(&state, &user, chat_id)?;
    }

    let project = match (&req.project_data, &req.project_id) {
        (Some(project), _) => Some(project.clone()),
        (None, Some(project_id)) if req.mode == ChatMode::Builder => {
            state.projects.fetch_project(project_id, &user.token).await?
        }
        _ => None,
    };

    if req.tools.is_some() {
        tracing::debug!(model = %model.model_key, "Ignoring tool definitions on chat request");
    }

    let system = match req.mode {
        ChatMode::Builder => builder_system_prompt(project.as_ref(), &req.other_config),
        ChatMode::Chat => chat_system_prompt(),
    };

    let conversation = match &req.chat_id {
        Some(chat_id) => prepare_session(&state, chat_id, &req),
        None => req.messages.clone(),
    };
    if conversation.is_empty() {
        return Err(AppError::bad_request("messages must not be empty"));
    }

    let mut messages = Vec::with_capacity(conversation.len() + 1);
    messages.push(ChatMessage::system(system));
    messages.extend(conversation.into_iter().filter(|m| m.role != Role::System));

    tracing::info!(
        user_id = %user.user_id,
        chat_id = ?req.chat_id,
        model = %model.model_key,
        mode = ?req.mode,
        messages = messages.len(),
        "Starting generation"
    );
    let tokens = state.llm.stream_chat(CompletionRequest::new(model.clone(), messages)).await?;

    let (tx, rx) = mpsc::channel::<ChatEvent>(64);
    let (token_tx, token_rx) = oneshot::channel::<u64>();
    let job = Generation {
        state: state.clone(),
        user,
        chat_id: req.chat_id.clone(),
        project_id: req.project_id.clone(),
        project_name: project.map(|p| p.name),
        model_key: model.model_key,
    };
    let task = tokio::spawn(job.run(tokens, tx, token_rx));
    if let Some(chat_id) = &req.chat_id {
        let _ = token_tx.send(state.generations.start(chat_id, task.abort_handle()));
    }

    let stream = ReceiverStream::new(rx).map(|event| Ok(to_sse_event(&event)));
    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    ))
}

pub async fn stop_generation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    ensure_chat_access(&state, &user, &chat_id)?;
    let stopped = state.generations.stop(&chat_id);
    Ok(Json(json!({ "success": true, "stopped": stopped })))
}

/// Apply the request's local edits, replay pending files and adopt the
/// client's conversation. Returns the messages to send to the model.
fn prepare_session(state: &AppState, chat_id: &str, req: &ChatRequest) -> Vec<ChatMessage> {
    let shared = state.sessions.get_or_create(chat_id);
    let mut session = shared.lock().expect("session mutex poisoned");

    if let Some(files) = &req.files {
        for (path, content) in files.iter() {
            if session.update_file(path, content) {
                state.sync_queue.enqueue(chat_id, path, content);
            }
        }
    }

    let flushed = session.flush_replacing();
    if !req.messages.is_empty() {
        let mut conversation = req.messages.clone();
        if let Some(Flushed { message, replaced }) = flushed {
            // The client may echo the message a previous flush handed out.
            conversation.retain(|m| m.id != message.id && Some(&m.id) != replaced.as_ref());
            let at = conversation
                .iter()
                .rposition(|m| m.role == Role::User)
                .unwrap_or(conversation.len());
            conversation.insert(at, message);
        }
        session.set_messages(conversation);
    }
    session.messages().to_vec()
}

fn to_sse_event(event: &ChatEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_else(|e| {
        tracing::error!("Failed to serialize chat event: {}", e);
        "{}".to_string()
    });
    Event::default().event(event.name()).data(data)
}

/// One running completion and what to do with its output.
struct Generation {
    state: AppState,
    user: AuthUser,
    chat_id: Option<String>,
    project_id: Option<String>,
    project_name: Option<String>,
    model_key: String,
}

impl Generation {
    async fn run(self, mut tokens: TokenStream, tx: mpsc::Sender<ChatEvent>, token_rx: oneshot::Receiver<u64>) {
        let mut parser = StreamParser::new(self.state.sessions.exclude().clone());
        let mut text = String::new();

        while let Some(item) = tokens.next().await {
            match item {
                Ok(delta) => {
                    text.push_str(&delta);
                    let completed = parser.push(&delta);
                    let _ = tx.send(ChatEvent::Token { text: delta }).await;
                    for file in completed {
                        self.record_file(&file.path, &file.content);
                        let _ = tx
                            .send(ChatEvent::File {
                                path: file.path,
                                content: file.content,
                            })
                            .await;
                    }
                }
                Err(e) => {
                    tracing::error!(chat_id = ?self.chat_id, "Generation failed: {}", e);
                    let _ = tx.send(ChatEvent::Error { error: e.to_string() }).await;
                    self.release(token_rx).await;
                    return;
                }
            }
        }

        let files = parser.finish();
        if let Err(e) = self.complete(&text, &files).await {
            tracing::error!(chat_id = ?self.chat_id, "Failed to store generation: {}", e);
            let _ = tx.send(ChatEvent::Error { error: e.body.error }).await;
        }
        tracing::info!(chat_id = ?self.chat_id, files = files.len(), chars = text.len(), "Generation finished");
        let _ = tx.send(ChatEvent::Done { files }).await;
        self.release(token_rx).await;
    }

    /// Files land in the session as they complete so a stopped generation
    /// keeps them.
    fn record_file(&self, path: &str, content: &str) {
        let Some(chat_id) = &self.chat_id else { return };
        let shared = self.state.sessions.get_or_create(chat_id);
        let changed = shared
            .lock()
            .expect("session mutex poisoned")
            .update_file(path, content);
        if changed {
            self.state.sync_queue.enqueue(chat_id, path, content);
        }
    }

    async fn complete(&self, text: &str, files: &FileMap) -> ApiResult<()> {
        let Some(chat_id) = &self.chat_id else { return Ok(()) };

        let (messages, all_files) = {
            let shared = self.state.sessions.get_or_create(chat_id);
            let mut session = shared.lock().expect("session mutex poisoned");
            session.apply_assistant_message(text);
            (session.messages().to_vec(), session.files().clone())
        };

        self.state.db.save_chat(&SaveChat {
            id: chat_id.clone(),
            title: None,
            user_id: Some(self.user.user_id.clone()),
            project_id: self.project_id.clone(),
            messages: messages.clone(),
        })?;

        if let Some(project_id) = &self.project_id {
            let generation = json!({
                "chatId": chat_id,
                "model": self.model_key,
                "messages": messages,
                "files": all_files,
                "newFiles": files,
                "timestamp": chrono::Utc::now().timestamp_millis(),
                "projectName": self.project_name,
            });
            self.state
                .projects
                .save_generation(project_id, &self.user.token, &generation)
                .await?;
            tracing::info!(project_id = %project_id, "Generation saved for project");
        }
        Ok(())
    }

    async fn release(&self, token_rx: oneshot::Receiver<u64>) {
        if let (Some(chat_id), Ok(token)) = (&self.chat_id, token_rx.await) {
            self.state.generations.finish(chat_id, token);
        }
    }
}
