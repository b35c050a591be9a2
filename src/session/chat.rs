use std::collections::HashMap;

use serde::Serialize;

use super::message::{ChatMessage, Role};
use super::state::{can_transition, FileSendState, TransitionPermission};
use crate::bolt::{
    extract_files, render_file_actions, wrap_artifact, ExcludeList, FileMap, ARTIFACT_ID,
    CURRENT_FILE_TITLE, MODIFIED_FILES_TITLE,
};

/// Id of the synthetic message carrying the initial file set.
pub const INITIAL_FILES_MESSAGE_ID: &str = "files-initial";

/// Prefix of synthetic messages carrying modified files.
pub const UPDATE_FILES_MESSAGE_PREFIX: &str = "files-update-";

/// Per-file send state. Files never seen are `Unsent`.
#[derive(Debug, Clone, Default)]
pub struct SendTracker {
    states: HashMap<String, FileSendState>,
}

impl SendTracker {
    pub fn state(&self, path: &str) -> FileSendState {
        self.states.get(path).copied().unwrap_or(FileSendState::Unsent)
    }

    /// Apply a transition if the rule table allows it.
    pub fn transition(&mut self, path: &str, to: FileSendState) -> TransitionPermission {
        let from = self.state(path);
        let permission = can_transition(from, to);
        match &permission {
            TransitionPermission::Allowed => {
                self.states.insert(path.to_string(), to);
            }
            TransitionPermission::Denied(reason) => {
                tracing::warn!(path, "{}", reason);
            }
        }
        permission
    }

    pub fn is_pending(&self, path: &str) -> bool {
        self.state(path).is_pending()
    }

    fn forget(&mut self) {
        self.states.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStatus {
    pub path: String,
    pub state: FileSendState,
}

/// Result of a flush: the new synthetic message and the id of the one it
/// superseded, if any.
#[derive(Debug, Clone)]
pub struct Flushed {
    pub message: ChatMessage,
    pub replaced: Option<String>,
}

/// One conversation: its messages, the reconstructed file map and what the
/// model has already been told about each file.
#[derive(Debug, Clone)]
pub struct ChatSession {
    chat_id: String,
    files: FileMap,
    old_files: FileMap,
    tracker: SendTracker,
    messages: Vec<ChatMessage>,
    /// Paths carried by the trailing synthetic message while it is unanswered.
    unanswered: Vec<String>,
    exclude: ExcludeList,
}

impl ChatSession {
    pub fn new(chat_id: impl Into<String>, exclude: ExcludeList) -> Self {
        Self {
            chat_id: chat_id.into(),
            files: FileMap::new(),
            old_files: FileMap::new(),
            tracker: SendTracker::default(),
            messages: Vec::new(),
            unanswered: Vec::new(),
            exclude,
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn files(&self) -> &FileMap {
        &self.files
    }

    /// Files of the second assistant reply of a loaded history.
    pub fn old_files(&self) -> &FileMap {
        &self.old_files
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn state(&self, path: &str) -> FileSendState {
        self.tracker.state(path)
    }

    pub fn file_states(&self) -> Vec<FileStatus> {
        self.files
            .paths()
            .map(|path| FileStatus {
                path: path.to_string(),
                state: self.tracker.state(path),
            })
            .collect()
    }

    /// Register the project's starting files. Files already known are
    /// treated as local edits.
    pub fn load_initial(&mut self, files: FileMap) {
        for (path, content) in files.iter() {
            if self.exclude.is_excluded(path) {
                continue;
            }
            if self.tracker.state(path) == FileSendState::Unsent {
                self.files.insert(path, content);
                self.tracker.transition(path, FileSendState::PendingInitial);
            } else {
                self.update_file(path, content);
            }
        }
    }

    /// Record a local edit. Returns false when nothing changed.
    pub fn update_file(&mut self, path: &str, content: &str) -> bool {
        if self.exclude.is_excluded(path) || self.files.get(path) == Some(content) {
            return false;
        }
        self.files.insert(path, content);
        self.tracker.transition(path, FileSendState::PendingUpdate) == TransitionPermission::Allowed
    }

    /// Replace the conversation with the client's copy of it.
    pub fn set_messages(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
        if !self.last_is_synthetic() {
            self.unanswered.clear();
        }
    }

    pub fn push_user_message(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
        self.unanswered.clear();
    }

    /// Append an assistant reply and apply the files it wrote. The model
    /// already knows those, so they land directly in `Sent`.
    pub fn apply_assistant_message(&mut self, content: impl Into<String>) -> FileMap {
        let message = ChatMessage::assistant(content);
        let written = extract_files(&message.content, &self.exclude);
        for (path, content) in written.iter() {
            self.files.insert(path, content);
            self.tracker.transition(path, FileSendState::Sent);
        }
        self.messages.push(message);
        self.unanswered.clear();
        written
    }

    /// Build the synthetic user message for pending files and mark them sent.
    ///
    /// The first send carries every pending file under "the current file".
    /// Later sends carry the delta under "Currently modified files". A trailing
    /// synthetic message the model has not answered yet is replaced, keeping
    /// the files it already carried.
    pub fn flush(&mut self) -> Option<ChatMessage> {
        self.flush_replacing().map(|flushed| flushed.message)
    }

    /// Like [`ChatSession::flush`], also reporting the id of the unanswered
    /// synthetic message the new one replaced, so callers holding a copy of
    /// the conversation can drop it too.
    pub fn flush_replacing(&mut self) -> Option<Flushed> {
        let pending: Vec<String> = self
            .files
            .paths()
            .filter(|p| self.tracker.is_pending(p))
            .map(str::to_string)
            .collect();
        if pending.is_empty() {
            return None;
        }

        let replace = self.last_is_synthetic();
        let first_send = self
            .messages
            .iter()
            .all(|m| m.id == INITIAL_FILES_MESSAGE_ID)
            || (replace && self.messages.last().map_or(false, |m| m.id == INITIAL_FILES_MESSAGE_ID));

        let mut carried = if replace { std::mem::take(&mut self.unanswered) } else { Vec::new() };
        for path in pending.iter() {
            if !carried.contains(path) {
                carried.push(path.clone());
            }
        }

        let payload: FileMap = self
            .files
            .iter()
            .filter(|(p, _)| carried.iter().any(|c| c.as_str() == *p))
            .collect();

        let (id, title) = if first_send {
            (INITIAL_FILES_MESSAGE_ID.to_string(), CURRENT_FILE_TITLE)
        } else {
            (
                format!("{}{}", UPDATE_FILES_MESSAGE_PREFIX, uuid::Uuid::new_v4()),
                MODIFIED_FILES_TITLE,
            )
        };
        let content = format!(
            "{}\n\n",
            wrap_artifact(ARTIFACT_ID, title, &render_file_actions(&payload, &self.exclude))
        );
        let message = ChatMessage::user(content).with_id(id);

        let replaced = if replace { self.messages.pop().map(|m| m.id) } else { None };
        self.messages.push(message.clone());

        for path in pending.iter() {
            self.tracker.transition(path, FileSendState::Sent);
        }
        self.unanswered = carried;

        tracing::debug!(
            chat_id = %self.chat_id,
            files = payload.len(),
            title,
            replaced = replace,
            "Flushed pending files"
        );
        Some(Flushed { message, replaced })
    }

    /// Rebuild the session from a stored conversation.
    ///
    /// Every file written anywhere in the history is considered known to the
    /// model and a full "the current file" message is appended so the next
    /// request carries the reconstructed state. Edits made before the next
    /// reply are merged into that message.
    pub fn load_history(&mut self, messages: Vec<ChatMessage>) {
        let mut files = FileMap::new();
        for message in messages.iter() {
            files.extend(extract_files(&message.content, &self.exclude));
        }

        self.old_files = messages
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .nth(1)
            .map(|m| extract_files(&m.content, &self.exclude))
            .unwrap_or_default();

        self.messages = messages;
        self.unanswered.clear();
        self.tracker.forget();
        for path in files.paths() {
            self.tracker.transition(path, FileSendState::Sent);
        }

        if !files.is_empty() {
            let body = render_file_actions(&files, &self.exclude);
            let content = format!("{}\n\n", wrap_artifact(ARTIFACT_ID, CURRENT_FILE_TITLE, &body));
            self.messages
                .push(ChatMessage::user(content).with_id(INITIAL_FILES_MESSAGE_ID));
            self.unanswered = files.paths().map(str::to_string).collect();
        }

        tracing::info!(
            chat_id = %self.chat_id,
            messages = self.messages.len(),
            files = files.len(),
            "Loaded chat history"
        );
        self.files = files;
    }

    fn last_is_synthetic(&self) -> bool {
        self.messages.last().map_or(false, |m| {
            m.id == INITIAL_FILES_MESSAGE_ID || m.id.starts_with(UPDATE_FILES_MESSAGE_PREFIX)
        })
    }
}
