//! Channel-backed delivery tracking.
//!
//! A `DeliveryTracker` is the receiving half of a `StateListener` that
//! forwards every transition into an `mpsc` channel, so callers can poll or
//! block for the outcome instead of providing a callback.

use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    time::{Duration, Instant},
};

use thiserror::Error;

use crate::{
    domain::{
        events::DeliveryEvent,
        message::{ChatMessage, MessageId},
        state::MessageState,
    },
    usecases::contracts::StateListener,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryWaitError {
    #[error("no terminal state for message {message_id} within {waited_ms} ms")]
    TimedOut { message_id: MessageId, waited_ms: u128 },
    #[error("delivery of message {0} was abandoned before a terminal state")]
    Abandoned(MessageId),
}

pub struct ChannelListener {
    events_tx: Sender<DeliveryEvent>,
}

impl StateListener for ChannelListener {
    fn on_state_changed(&mut self, message: &ChatMessage, state: MessageState) {
        let _ = self
            .events_tx
            .send(DeliveryEvent::new(message.id(), state));
    }
}

#[derive(Debug)]
pub struct DeliveryTracker {
    message_id: MessageId,
    events_rx: Receiver<DeliveryEvent>,
}

impl DeliveryTracker {
    /// Creates a tracker for `message_id` and the listener feeding it.
    pub fn channel(message_id: MessageId) -> (Self, ChannelListener) {
        let (events_tx, events_rx) = mpsc::channel();
        (
            Self {
                message_id,
                events_rx,
            },
            ChannelListener { events_tx },
        )
    }

    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    /// Next event already delivered to the tracker, if any.
    pub fn try_next(&self) -> Option<DeliveryEvent> {
        self.events_rx.try_recv().ok()
    }

    /// Blocks until a terminal state arrives, collecting intermediate events.
    pub fn wait_terminal(&self, timeout: Duration) -> Result<MessageState, DeliveryWaitError> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events_rx.recv_timeout(remaining) {
                Ok(event) if event.is_terminal() => return Ok(event.state),
                Ok(event) => {
                    tracing::trace!(
                        message_id = event.message_id.0,
                        state = event.state.as_label(),
                        "delivery progressed"
                    );
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(DeliveryWaitError::TimedOut {
                        message_id: self.message_id,
                        waited_ms: timeout.as_millis(),
                    })
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(DeliveryWaitError::Abandoned(self.message_id))
                }
            }
        }
    }
}
