//! Use case for sending a text message to a chat room.
//!
//! Validates the text and delegates to the room, optionally returning a
//! tracker that observes the message's delivery.

use crate::usecases::{
    chat_room::{ChatError, ChatRoom},
    delivery::DeliveryTracker,
};

/// Command to send text to the room it is executed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageCommand {
    pub text: String,
    /// Whether the caller wants to observe delivery.
    pub track: bool,
}

impl SendMessageCommand {
    pub fn tracked(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            track: true,
        }
    }

    pub fn untracked(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            track: false,
        }
    }
}

#[derive(Debug)]
pub enum SendMessageOutcome {
    Queued,
    Tracked(DeliveryTracker),
}

/// Use-case level errors for the send operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendMessageError {
    /// Message text is empty after trimming whitespace.
    EmptyMessage,
    /// The engine is not running.
    EngineUnavailable,
    /// The engine refused the message.
    SendFailed(String),
    /// Room or address contract was violated.
    InvalidRoom,
}

impl SendMessageError {
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyMessage => "Message is empty.".to_owned(),
            Self::EngineUnavailable => "Messaging engine is not running.".to_owned(),
            Self::SendFailed(reason) => format!("Message was not sent: {reason}."),
            Self::InvalidRoom => "Message does not belong to this chat room.".to_owned(),
        }
    }
}

/// Sends the command's text to `room`.
///
/// # Errors
/// Returns `SendMessageError::EmptyMessage` if text is empty/whitespace.
/// Maps room errors to use-case errors for other failure cases.
pub fn send_message(
    room: &dyn ChatRoom,
    command: SendMessageCommand,
) -> Result<SendMessageOutcome, SendMessageError> {
    let text = command.text.trim();
    if text.is_empty() {
        return Err(SendMessageError::EmptyMessage);
    }

    if !command.track {
        room.send_text(text).map_err(map_room_error)?;
        return Ok(SendMessageOutcome::Queued);
    }

    let message = room.create_message(text);
    let tracker = room.send_tracked(message).map_err(map_room_error)?;

    Ok(SendMessageOutcome::Tracked(tracker))
}

fn map_room_error(error: ChatError) -> SendMessageError {
    match error {
        ChatError::EngineUnavailable => SendMessageError::EngineUnavailable,
        ChatError::SendFailed { reason } => SendMessageError::SendFailed(reason),
        ChatError::AlreadySent(id) => {
            SendMessageError::SendFailed(format!("message {id} was already sent"))
        }
        ChatError::InvalidRoom { .. }
        | ChatError::InvalidAddress(_)
        | ChatError::MessageNotFound(_) => SendMessageError::InvalidRoom,
    }
}
