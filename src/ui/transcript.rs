//! Plain-text transcript rendering.
//!
//! Formats a room's history for the console:
//! - Date separators between messages from different days
//! - Time, direction and sender on each line
//! - A delivery marker for outgoing messages and an unread marker for incoming ones

use chrono::{Local, TimeZone};

use crate::domain::{message::ChatMessage, state::MessageState};

/// A visual element of a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptElement {
    /// Date separator line (e.g., "——— 14 Feb 2026 ———").
    DateSeparator(String),
    Message(String),
}

impl TranscriptElement {
    pub fn render(&self) -> String {
        match self {
            Self::DateSeparator(date) => format!("——— {date} ———"),
            Self::Message(line) => line.clone(),
        }
    }
}

pub fn build_transcript(messages: &[ChatMessage]) -> Vec<TranscriptElement> {
    let mut elements = Vec::new();
    let mut prev_date: Option<chrono::NaiveDate> = None;

    for message in messages {
        let date = timestamp_to_date(message.timestamp_ms());
        if prev_date != Some(date) {
            elements.push(TranscriptElement::DateSeparator(format_date(date)));
        }

        elements.push(TranscriptElement::Message(format_message_line(message)));
        prev_date = Some(date);
    }

    elements
}

/// One line per message: `HH:MM → me: text [app data] ✓`.
pub fn format_message_line(message: &ChatMessage) -> String {
    let (arrow, sender) = if message.is_outgoing() {
        ("→", "me")
    } else {
        ("←", message.peer().display_name())
    };

    let app_data = message
        .app_data()
        .map(|data| format!(" [{data}]"))
        .unwrap_or_default();

    format!(
        "{:>5} {arrow} {sender}: {}{app_data}{}",
        format_time(message.timestamp_ms()),
        message.display_content(),
        state_marker(message)
    )
}

fn state_marker(message: &ChatMessage) -> &'static str {
    if !message.is_outgoing() {
        return if message.is_read() { "" } else { " *" };
    }

    match message.state() {
        MessageState::Idle => "",
        MessageState::InProgress => " …",
        MessageState::Delivered | MessageState::FileTransferDone => " ✓",
        MessageState::DeliveredToUser | MessageState::Displayed => " ✓✓",
        MessageState::NotDelivered | MessageState::FileTransferError => " ✗",
    }
}

fn timestamp_to_date(timestamp_ms: i64) -> chrono::NaiveDate {
    match Local.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(dt) => dt.date_naive(),
        chrono::LocalResult::Ambiguous(dt, _) => dt.date_naive(),
        chrono::LocalResult::None => Local::now().date_naive(),
    }
}

fn format_date(date: chrono::NaiveDate) -> String {
    date.format("%-d %b %Y").to_string()
}

fn format_time(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(dt) => dt.format("%H:%M").to_string(),
        chrono::LocalResult::Ambiguous(dt, _) => dt.format("%H:%M").to_string(),
        chrono::LocalResult::None => "??:??".to_owned(),
    }
}
