use serde::{Deserialize, Serialize};

/// Delivery state of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MessageState {
    /// Created but not submitted.
    #[default]
    Idle,
    /// Handed to the transport.
    InProgress,
    /// Accepted by the remote side.
    Delivered,
    /// Delivery failed or was abandoned.
    NotDelivered,
    FileTransferError,
    FileTransferDone,
    /// Received by the peer's device.
    DeliveredToUser,
    /// Read by the recipient.
    Displayed,
}

impl MessageState {
    /// Whether a send operation is over once this state is reached.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::NotDelivered)
    }

    pub fn as_label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InProgress => "in progress",
            Self::Delivered => "delivered",
            Self::NotDelivered => "not delivered",
            Self::FileTransferError => "file transfer error",
            Self::FileTransferDone => "file transfer done",
            Self::DeliveredToUser => "delivered to user",
            Self::Displayed => "displayed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Incoming,
    Outgoing,
}
