//! Chat room capability.
//!
//! A room is a view onto engine-managed state for a single peer: it holds the
//! peer address and a handle to the engine, and delegates every operation.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    domain::{
        address::{AddressError, PeerAddress},
        message::{ChatMessage, MessageId},
    },
    usecases::{
        contracts::{EngineError, HistoryRange, MessagingEngine, StateListener},
        delivery::DeliveryTracker,
    },
};

const HISTORY_INVALID_RANGE: &str = "CHAT_HISTORY_INVALID_RANGE";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("messaging engine is unavailable")]
    EngineUnavailable,
    #[error("send failed: {reason}")]
    SendFailed { reason: String },
    #[error("message belongs to room {actual}, not {expected}")]
    InvalidRoom {
        expected: PeerAddress,
        actual: PeerAddress,
    },
    #[error("invalid peer address: {0}")]
    InvalidAddress(#[from] AddressError),
    #[error("message {0} not found in this room")]
    MessageNotFound(MessageId),
    #[error("message {0} was already sent")]
    AlreadySent(MessageId),
}

pub trait ChatRoom: Send + Sync {
    /// Peer this room talks to. Fixed for the room's lifetime.
    fn peer_address(&self) -> &PeerAddress;

    /// Creates a message bound to this room without sending it.
    fn create_message(&self, text: &str) -> ChatMessage;

    fn create_message_with_url(&self, text: &str, url: &str) -> ChatMessage {
        self.create_message(text).with_external_body_url(url)
    }

    /// Sends `text` without observing its delivery.
    fn send_text(&self, text: &str) -> Result<(), ChatError>;

    /// Sends a message created by this room; `listener` observes its states.
    ///
    /// A message can be sent again only after its delivery failed.
    fn send_message(
        &self,
        message: ChatMessage,
        listener: Box<dyn StateListener>,
    ) -> Result<(), ChatError>;

    /// Sends `message` and returns a channel that receives its state events.
    fn send_tracked(&self, message: ChatMessage) -> Result<DeliveryTracker, ChatError> {
        let (tracker, listener) = DeliveryTracker::channel(message.id());
        self.send_message(message, Box::new(listener))?;
        Ok(tracker)
    }

    /// Every message of this room, oldest first. A snapshot, not a live view.
    fn history(&self) -> Result<Vec<ChatMessage>, ChatError> {
        self.history_range(HistoryRange::all())
    }

    /// The `count` most recent messages, oldest first. `0` returns everything.
    fn history_limited(&self, count: usize) -> Result<Vec<ChatMessage>, ChatError> {
        self.history_range(HistoryRange::last(count))
    }

    fn history_range(&self, range: HistoryRange) -> Result<Vec<ChatMessage>, ChatError>;

    fn history_size(&self) -> Result<usize, ChatError>;

    fn unread_messages_count(&self) -> Result<usize, ChatError>;

    fn mark_as_read(&self) -> Result<(), ChatError>;

    fn delete_message(&self, id: MessageId) -> Result<(), ChatError>;

    fn delete_history(&self) -> Result<(), ChatError>;

    /// Tells the peer that the local user is typing.
    fn compose(&self) -> Result<(), ChatError>;

    /// Whether the peer is typing. Cleared by the peer's next message.
    fn is_remote_composing(&self) -> Result<bool, ChatError>;
}

/// Room backed by a `MessagingEngine`.
pub struct EngineChatRoom {
    peer: PeerAddress,
    engine: Arc<dyn MessagingEngine>,
}

impl std::fmt::Debug for EngineChatRoom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineChatRoom")
            .field("peer", &self.peer.to_string())
            .finish_non_exhaustive()
    }
}

impl EngineChatRoom {
    pub fn new(peer: PeerAddress, engine: Arc<dyn MessagingEngine>) -> Self {
        Self { peer, engine }
    }

    fn ensure_own(&self, message: &ChatMessage) -> Result<(), ChatError> {
        if message.peer() == &self.peer {
            return Ok(());
        }

        Err(ChatError::InvalidRoom {
            expected: self.peer.clone(),
            actual: message.peer().clone(),
        })
    }
}

impl ChatRoom for EngineChatRoom {
    fn peer_address(&self) -> &PeerAddress {
        &self.peer
    }

    fn create_message(&self, text: &str) -> ChatMessage {
        ChatMessage::outgoing(
            self.engine.allocate_message_id(),
            self.engine.local_address().clone(),
            self.peer.clone(),
            text,
        )
    }

    fn send_text(&self, text: &str) -> Result<(), ChatError> {
        let message = self.create_message(text);
        tracing::debug!(
            peer = %self.peer,
            message_id = message.id().0,
            text_len = text.len(),
            "sending untracked text message"
        );

        self.engine.submit(message, None).map_err(map_engine_error)
    }

    fn send_message(
        &self,
        message: ChatMessage,
        listener: Box<dyn StateListener>,
    ) -> Result<(), ChatError> {
        self.ensure_own(&message)?;
        tracing::debug!(
            peer = %self.peer,
            message_id = message.id().0,
            text_len = message.text().len(),
            "sending tracked message"
        );

        self.engine
            .submit(message, Some(listener))
            .map_err(map_engine_error)
    }

    fn history_range(&self, range: HistoryRange) -> Result<Vec<ChatMessage>, ChatError> {
        if !range.is_valid() {
            tracing::warn!(
                code = HISTORY_INVALID_RANGE,
                peer = %self.peer,
                begin = range.begin,
                end = range.end,
                "unable to get history: invalid range"
            );
            return Ok(Vec::new());
        }

        self.engine
            .history(&self.peer, range)
            .map_err(map_engine_error)
    }

    fn history_size(&self) -> Result<usize, ChatError> {
        self.engine.history_size(&self.peer).map_err(map_engine_error)
    }

    fn unread_messages_count(&self) -> Result<usize, ChatError> {
        self.engine.unread_count(&self.peer).map_err(map_engine_error)
    }

    fn mark_as_read(&self) -> Result<(), ChatError> {
        self.engine.mark_as_read(&self.peer).map_err(map_engine_error)
    }

    fn delete_message(&self, id: MessageId) -> Result<(), ChatError> {
        self.engine
            .delete_message(&self.peer, id)
            .map_err(map_engine_error)
    }

    fn delete_history(&self) -> Result<(), ChatError> {
        self.engine
            .delete_history(&self.peer)
            .map_err(map_engine_error)
    }

    fn compose(&self) -> Result<(), ChatError> {
        tracing::trace!(peer = %self.peer, "sending composing notice");
        self.engine.compose(&self.peer).map_err(map_engine_error)
    }

    fn is_remote_composing(&self) -> Result<bool, ChatError> {
        self.engine
            .is_remote_composing(&self.peer)
            .map_err(map_engine_error)
    }
}

fn map_engine_error(error: EngineError) -> ChatError {
    match error {
        EngineError::Stopped | EngineError::StorePoisoned => ChatError::EngineUnavailable,
        EngineError::MessageNotFound(id) => ChatError::MessageNotFound(id),
        EngineError::AlreadySent(id) => ChatError::AlreadySent(id),
        EngineError::Rejected(reason) => ChatError::SendFailed { reason },
    }
}
