use serde::{Deserialize, Serialize};

/// Whether the model has seen the current content of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileSendState {
    Unsent,
    PendingInitial,
    PendingUpdate,
    Sent,
}

impl FileSendState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileSendState::Unsent => "unsent",
            FileSendState::PendingInitial => "pending_initial",
            FileSendState::PendingUpdate => "pending_update",
            FileSendState::Sent => "sent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unsent" => Some(FileSendState::Unsent),
            "pending_initial" => Some(FileSendState::PendingInitial),
            "pending_update" => Some(FileSendState::PendingUpdate),
            "sent" => Some(FileSendState::Sent),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, FileSendState::PendingInitial | FileSendState::PendingUpdate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionPermission {
    Allowed,
    Denied(String),
}

pub fn can_transition(from: FileSendState, to: FileSendState) -> TransitionPermission {
    use FileSendState::*;

    if from == to && to != PendingInitial {
        return TransitionPermission::Allowed;
    }

    match (from, to) {
        (Unsent, PendingInitial) => TransitionPermission::Allowed,
        (Unsent, PendingUpdate) => TransitionPermission::Allowed,
        (PendingInitial, PendingUpdate) => TransitionPermission::Allowed,
        (Sent, PendingUpdate) => TransitionPermission::Allowed,
        (_, Sent) => TransitionPermission::Allowed,
        _ => TransitionPermission::Denied(format!(
            "Cannot move file from {} to {}",
            from.as_str(),
            to.as_str()
        )),
    }
}
