use crate::{
    domain::message::ChatMessage,
    usecases::chat_room::{ChatError, ChatRoom},
};

pub const DEFAULT_HISTORY_PAGE_SIZE: usize = 50;
const MAX_HISTORY_PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadHistoryQuery {
    pub limit: usize,
}

impl Default for LoadHistoryQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_PAGE_SIZE,
        }
    }
}

impl LoadHistoryQuery {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    fn normalized_limit(&self) -> usize {
        match self.limit {
            0 => DEFAULT_HISTORY_PAGE_SIZE,
            value if value > MAX_HISTORY_PAGE_SIZE => MAX_HISTORY_PAGE_SIZE,
            value => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadHistoryOutput {
    pub messages: Vec<ChatMessage>,
    pub total: usize,
    pub unread: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadHistoryError {
    TemporarilyUnavailable,
    DataContractViolation,
}

/// Loads the most recent page of `room`'s history, oldest first.
pub fn load_history(
    room: &dyn ChatRoom,
    query: LoadHistoryQuery,
) -> Result<LoadHistoryOutput, LoadHistoryError> {
    let limit = query.normalized_limit();
    let messages = room.history_limited(limit).map_err(map_room_error)?;

    if messages
        .iter()
        .any(|message| message.peer() != room.peer_address())
    {
        return Err(LoadHistoryError::DataContractViolation);
    }

    let total = room.history_size().map_err(map_room_error)?;
    let unread = room.unread_messages_count().map_err(map_room_error)?;

    Ok(LoadHistoryOutput {
        messages,
        total,
        unread,
    })
}

fn map_room_error(error: ChatError) -> LoadHistoryError {
    match error {
        ChatError::EngineUnavailable
        | ChatError::SendFailed { .. }
        | ChatError::AlreadySent(_) => {
            LoadHistoryError::TemporarilyUnavailable
        }
        ChatError::InvalidRoom { .. }
        | ChatError::InvalidAddress(_)
        | ChatError::MessageNotFound(_) => LoadHistoryError::DataContractViolation,
    }
}
