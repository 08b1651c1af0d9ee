use super::{message::MessageId, state::MessageState};

/// One observed state transition of a sent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryEvent {
    pub message_id: MessageId,
    pub state: MessageState,
}

impl DeliveryEvent {
    pub fn new(message_id: MessageId, state: MessageState) -> Self {
        Self { message_id, state }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Result of polling a line source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    /// No input within the poll interval.
    Tick,
    Closed,
}

/// Input read by the console loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Text(String),
    Command(ConsoleCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    History,
    Unread,
    MarkRead,
    ClearHistory,
    Typing,
    Quit,
    Help,
}

impl ConsoleInput {
    /// Parses one console line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let command = match trimmed {
            "/history" => ConsoleCommand::History,
            "/unread" => ConsoleCommand::Unread,
            "/read" => ConsoleCommand::MarkRead,
            "/clear" => ConsoleCommand::ClearHistory,
            "/typing" => ConsoleCommand::Typing,
            "/quit" | "/exit" => ConsoleCommand::Quit,
            "/help" => ConsoleCommand::Help,
            _ => return Some(Self::Text(line.to_owned())),
        };

        Some(Self::Command(command))
    }
}
