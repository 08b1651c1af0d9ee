use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

use super::{
    address::PeerAddress,
    state::{Direction, MessageState},
};

/// Engine-allocated message identifier, unique per engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single text message belonging to exactly one chat room.
///
/// The content fields are fixed at creation. `state` and `is_read` are only
/// changed by the engine that owns the message's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    id: MessageId,
    peer: PeerAddress,
    from: PeerAddress,
    to: PeerAddress,
    text: String,
    direction: Direction,
    state: MessageState,
    timestamp_ms: i64,
    is_read: bool,
    external_body_url: Option<String>,
    app_data: Option<String>,
    custom_headers: Vec<(String, String)>,
}

impl ChatMessage {
    /// Builds an outgoing message from `local` to the room's `peer`.
    pub fn outgoing(id: MessageId, local: PeerAddress, peer: PeerAddress, text: &str) -> Self {
        Self {
            id,
            from: local,
            to: peer.clone(),
            peer,
            text: text.to_owned(),
            direction: Direction::Outgoing,
            state: MessageState::Idle,
            timestamp_ms: now_unix_ms(),
            is_read: true,
            external_body_url: None,
            app_data: None,
            custom_headers: Vec::new(),
        }
    }

    /// Builds an incoming message received from `peer` by `local`.
    pub fn incoming(id: MessageId, local: PeerAddress, peer: PeerAddress, text: &str) -> Self {
        Self {
            id,
            from: peer.clone(),
            to: local,
            peer,
            text: text.to_owned(),
            direction: Direction::Incoming,
            state: MessageState::Delivered,
            timestamp_ms: now_unix_ms(),
            is_read: false,
            external_body_url: None,
            app_data: None,
            custom_headers: Vec::new(),
        }
    }

    pub fn with_external_body_url(mut self, url: impl Into<String>) -> Self {
        self.external_body_url = Some(url.into());
        self
    }

    pub fn with_app_data(mut self, data: impl Into<String>) -> Self {
        self.app_data = Some(data.into());
        self
    }

    pub fn with_custom_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Address of the room this message belongs to.
    pub fn peer(&self) -> &PeerAddress {
        &self.peer
    }

    pub fn from(&self) -> &PeerAddress {
        &self.from
    }

    pub fn to(&self) -> &PeerAddress {
        &self.to
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_outgoing(&self) -> bool {
        self.direction == Direction::Outgoing
    }

    pub fn state(&self) -> MessageState {
        self.state
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn external_body_url(&self) -> Option<&str> {
        self.external_body_url.as_deref()
    }

    pub fn app_data(&self) -> Option<&str> {
        self.app_data.as_deref()
    }

    /// Returns the first header value stored under `name` (case-insensitive).
    pub fn custom_header(&self, name: &str) -> Option<&str> {
        self.custom_headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Text shown in transcripts: the body, or the external URL for empty bodies.
    pub fn display_content(&self) -> String {
        match (&self.external_body_url, self.text.is_empty()) {
            (Some(url), true) => format!("[Link] {url}"),
            (Some(url), false) => format!("{} [Link] {url}", self.text),
            (None, _) => self.text.clone(),
        }
    }

    pub(crate) fn set_state(&mut self, state: MessageState) {
        self.state = state;
    }

    pub(crate) fn mark_displayed(&mut self) {
        self.state = MessageState::Displayed;
        self.is_read = true;
    }
}

pub fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
