use thiserror::Error;

use crate::domain::{
    address::PeerAddress,
    events::InputEvent,
    message::{ChatMessage, MessageId},
    state::MessageState,
};

/// Observer of a sent message's state transitions.
///
/// Called from the engine's dispatch context, never from the sending thread.
/// The listener is dropped after the first terminal state.
pub trait StateListener: Send {
    fn on_state_changed(&mut self, message: &ChatMessage, state: MessageState);
}

impl<F> StateListener for F
where
    F: FnMut(&ChatMessage, MessageState) + Send,
{
    fn on_state_changed(&mut self, message: &ChatMessage, state: MessageState) {
        self(message, state)
    }
}

/// Source of console input, polled by the console loop.
pub trait LineSource {
    fn poll_line(&mut self) -> anyhow::Result<InputEvent>;
}

/// Slice of a room's history, counted from the newest message.
///
/// `end == 0` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryRange {
    pub begin: usize,
    pub end: usize,
}

impl HistoryRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn last(count: usize) -> Self {
        Self {
            begin: 0,
            end: count,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.end == 0 || self.begin <= self.end
    }
}

/// Errors reported by a messaging engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("engine is stopped")]
    Stopped,
    #[error("history store is poisoned")]
    StorePoisoned,
    #[error("message {0} not found")]
    MessageNotFound(MessageId),
    #[error("message {0} was already sent")]
    AlreadySent(MessageId),
    #[error("engine rejected the request: {0}")]
    Rejected(String),
}

/// The messaging core a chat room delegates to.
///
/// Implementations own delivery, state transitions and history storage.
pub trait MessagingEngine: Send + Sync {
    /// Address of the local identity messages are sent from.
    fn local_address(&self) -> &PeerAddress;

    fn allocate_message_id(&self) -> MessageId;

    /// Stores `message` and queues it for delivery. Returns once the engine
    /// accepted it. A message already stored is only accepted again when its
    /// delivery failed.
    fn submit(
        &self,
        message: ChatMessage,
        listener: Option<Box<dyn StateListener>>,
    ) -> Result<(), EngineError>;

    /// Messages of `peer` within `range`, oldest first.
    fn history(
        &self,
        peer: &PeerAddress,
        range: HistoryRange,
    ) -> Result<Vec<ChatMessage>, EngineError>;

    fn history_size(&self, peer: &PeerAddress) -> Result<usize, EngineError>;

    fn unread_count(&self, peer: &PeerAddress) -> Result<usize, EngineError>;

    fn mark_as_read(&self, peer: &PeerAddress) -> Result<(), EngineError>;

    fn delete_message(&self, peer: &PeerAddress, id: MessageId) -> Result<(), EngineError>;

    fn delete_history(&self, peer: &PeerAddress) -> Result<(), EngineError>;

    /// Queues a composing notice for `peer`.
    fn compose(&self, peer: &PeerAddress) -> Result<(), EngineError>;

    /// Whether `peer` reported typing since its last message.
    fn is_remote_composing(&self, peer: &PeerAddress) -> Result<bool, EngineError>;
}
