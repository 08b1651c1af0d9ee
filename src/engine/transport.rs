use std::{thread, time::Duration};

use thiserror::Error;

use crate::domain::{address::PeerAddress, message::ChatMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Accepted,
    /// Accepted, and the peer answered with a text message.
    AcceptedWithReply(String),
}

/// What the peer answered to a composing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposingReply {
    Silent,
    PeerComposing,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("peer is unreachable")]
    Unreachable,
    #[error("peer rejected the message with code {code}")]
    Rejected { code: u16 },
}

/// Moves an outgoing message to its peer.
///
/// Runs on the engine's dispatch thread; blocking is allowed.
pub trait Transport: Send {
    fn deliver(&mut self, message: &ChatMessage) -> Result<Delivery, TransportError>;

    /// Tells `peer` that the local user is typing.
    fn notify_composing(&mut self, _peer: &PeerAddress) -> Result<ComposingReply, TransportError> {
        Ok(ComposingReply::Silent)
    }
}

/// Delivers everything locally, optionally echoing the text back as the peer.
#[derive(Debug, Clone, Default)]
pub struct LoopbackTransport {
    echo_replies: bool,
    latency: Duration,
}

impl LoopbackTransport {
    pub fn new(echo_replies: bool, latency: Duration) -> Self {
        Self {
            echo_replies,
            latency,
        }
    }
}

impl Transport for LoopbackTransport {
    fn deliver(&mut self, message: &ChatMessage) -> Result<Delivery, TransportError> {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }

        if self.echo_replies && !message.text().is_empty() {
            return Ok(Delivery::AcceptedWithReply(message.text().to_owned()));
        }

        Ok(Delivery::Accepted)
    }

    fn notify_composing(&mut self, _peer: &PeerAddress) -> Result<ComposingReply, TransportError> {
        if self.echo_replies {
            return Ok(ComposingReply::PeerComposing);
        }

        Ok(ComposingReply::Silent)
    }
}
