//! In-memory chat history.
//!
//! Messages are kept per peer in arrival order. Range queries count from the
//! newest message but always return oldest first.

use std::collections::HashMap;

use crate::{
    domain::{
        address::PeerAddress,
        message::{ChatMessage, MessageId},
        state::{Direction, MessageState},
    },
    usecases::contracts::HistoryRange,
};

#[derive(Debug, Default)]
pub struct HistoryStore {
    rooms: HashMap<PeerAddress, Vec<ChatMessage>>,
}

impl HistoryStore {
    /// Appends `message`, or replaces the stored copy with the same id in place.
    pub fn insert(&mut self, message: ChatMessage) {
        let messages = self.rooms.entry(message.peer().clone()).or_default();

        match messages.iter_mut().find(|stored| stored.id() == message.id()) {
            Some(stored) => *stored = message,
            None => messages.push(message),
        }
    }

    pub fn stored_state(&self, peer: &PeerAddress, id: MessageId) -> Option<MessageState> {
        self.rooms
            .get(peer)?
            .iter()
            .find(|message| message.id() == id)
            .map(ChatMessage::state)
    }

    /// Updates the stored state of a message and returns the updated copy.
    pub fn update_state(
        &mut self,
        peer: &PeerAddress,
        id: MessageId,
        state: MessageState,
    ) -> Option<ChatMessage> {
        let message = self
            .rooms
            .get_mut(peer)?
            .iter_mut()
            .find(|message| message.id() == id)?;

        message.set_state(state);
        Some(message.clone())
    }

    pub fn range(&self, peer: &PeerAddress, range: HistoryRange) -> Vec<ChatMessage> {
        let Some(messages) = self.rooms.get(peer) else {
            return Vec::new();
        };

        let total = messages.len();
        let upper = if range.end == 0 {
            total
        } else {
            range.end.min(total)
        };

        if range.begin >= upper {
            return Vec::new();
        }

        messages[total - upper..total - range.begin].to_vec()
    }

    pub fn len(&self, peer: &PeerAddress) -> usize {
        self.rooms.get(peer).map_or(0, Vec::len)
    }

    pub fn unread_count(&self, peer: &PeerAddress) -> usize {
        self.rooms.get(peer).map_or(0, |messages| {
            messages.iter().filter(|message| is_unread(message)).count()
        })
    }

    /// Marks every unread incoming message as displayed. Returns how many changed.
    pub fn mark_as_read(&mut self, peer: &PeerAddress) -> usize {
        let Some(messages) = self.rooms.get_mut(peer) else {
            return 0;
        };

        let mut marked = 0;
        for message in messages.iter_mut().filter(|message| is_unread(message)) {
            message.mark_displayed();
            marked += 1;
        }
        marked
    }

    pub fn delete_message(&mut self, peer: &PeerAddress, id: MessageId) -> bool {
        let Some(messages) = self.rooms.get_mut(peer) else {
            return false;
        };

        let before = messages.len();
        messages.retain(|message| message.id() != id);
        messages.len() != before
    }

    /// Removes all messages of `peer`. Returns how many were removed.
    pub fn delete_all(&mut self, peer: &PeerAddress) -> usize {
        self.rooms.remove(peer).map_or(0, |messages| messages.len())
    }
}

fn is_unread(message: &ChatMessage) -> bool {
    message.direction() == Direction::Incoming && message.state() != MessageState::Displayed
}
