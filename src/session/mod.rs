//! Per-chat reconciliation state: which file contents the model has seen,
//! and the synthetic user messages that replay the rest.

mod chat;
mod message;
mod registry;
mod state;
mod sync;

pub use chat::{
    ChatSession, FileStatus, Flushed, SendTracker, INITIAL_FILES_MESSAGE_ID, UPDATE_FILES_MESSAGE_PREFIX,
};
pub use message::{ChatMessage, Role};
pub use registry::{GenerationRegistry, SessionRegistry, SharedSession};
pub use state::{can_transition, FileSendState, TransitionPermission};
pub use sync::{spawn_sync_worker, write_batch, SyncItem, SyncQueue};
