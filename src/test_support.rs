use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Mutex, MutexGuard,
};

use crate::{
    domain::{
        address::PeerAddress,
        message::{ChatMessage, MessageId},
        state::MessageState,
    },
    usecases::{
        chat_room::{ChatError, ChatRoom},
        contracts::{HistoryRange, StateListener},
    },
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory chat room that completes every send inline.
pub struct FakeChatRoom {
    peer: PeerAddress,
    local: PeerAddress,
    next_id: AtomicU64,
    deliver: bool,
    available: bool,
    messages: Mutex<Vec<ChatMessage>>,
    last_history_limit: Mutex<Option<usize>>,
    composed: AtomicUsize,
    remote_composing: AtomicBool,
}

impl FakeChatRoom {
    pub fn new(peer: &str) -> Self {
        Self {
            peer: PeerAddress::parse(peer).expect("fake room address must parse"),
            local: PeerAddress::parse("sip:me@example.org").expect("local address must parse"),
            next_id: AtomicU64::new(1),
            deliver: true,
            available: true,
            messages: Mutex::new(Vec::new()),
            last_history_limit: Mutex::new(None),
            composed: AtomicUsize::new(0),
            remote_composing: AtomicBool::new(false),
        }
    }

    /// Every send ends in `NotDelivered`.
    pub fn failing_deliveries(mut self) -> Self {
        self.deliver = false;
        self
    }

    /// Every operation fails with `EngineUnavailable`.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.lock_messages()
            .iter()
            .filter(|message| message.is_outgoing())
            .map(|message| message.text().to_owned())
            .collect()
    }

    pub fn last_history_limit(&self) -> Option<usize> {
        *self.last_history_limit.lock().expect("limit lock")
    }

    pub fn push_incoming(&self, text: &str) -> ChatMessage {
        let message =
            ChatMessage::incoming(self.next_id(), self.local.clone(), self.peer.clone(), text);
        self.lock_messages().push(message.clone());
        self.remote_composing.store(false, Ordering::Relaxed);
        message
    }

    pub fn composed_count(&self) -> usize {
        self.composed.load(Ordering::Relaxed)
    }

    pub fn set_remote_composing(&self, composing: bool) {
        self.remote_composing.store(composing, Ordering::Relaxed);
    }

    /// Stores a message of another room, breaking the room invariant on purpose.
    pub fn inject_foreign(&self, peer: &str, text: &str) {
        let foreign = PeerAddress::parse(peer).expect("foreign address must parse");
        let message = ChatMessage::outgoing(self.next_id(), self.local.clone(), foreign, text);
        self.lock_messages().push(message);
    }

    fn next_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn lock_messages(&self) -> MutexGuard<'_, Vec<ChatMessage>> {
        self.messages.lock().expect("messages lock")
    }

    fn ensure_available(&self) -> Result<(), ChatError> {
        if self.available {
            Ok(())
        } else {
            Err(ChatError::EngineUnavailable)
        }
    }

    fn complete(&self, mut message: ChatMessage, listener: Option<Box<dyn StateListener>>) {
        let terminal = if self.deliver {
            MessageState::Delivered
        } else {
            MessageState::NotDelivered
        };

        let mut listener = listener;
        for state in [MessageState::InProgress, terminal] {
            message.set_state(state);
            if let Some(observer) = listener.as_mut() {
                observer.on_state_changed(&message, state);
            }
        }

        let mut messages = self.lock_messages();
        match messages.iter_mut().find(|stored| stored.id() == message.id()) {
            Some(stored) => *stored = message,
            None => messages.push(message),
        }
    }
}

impl ChatRoom for FakeChatRoom {
    fn peer_address(&self) -> &PeerAddress {
        &self.peer
    }

    fn create_message(&self, text: &str) -> ChatMessage {
        ChatMessage::outgoing(self.next_id(), self.local.clone(), self.peer.clone(), text)
    }

    fn send_text(&self, text: &str) -> Result<(), ChatError> {
        self.ensure_available()?;
        let message = self.create_message(text);
        self.complete(message, None);
        Ok(())
    }

    fn send_message(
        &self,
        message: ChatMessage,
        listener: Box<dyn StateListener>,
    ) -> Result<(), ChatError> {
        self.ensure_available()?;
        if message.peer() != &self.peer {
            return Err(ChatError::InvalidRoom {
                expected: self.peer.clone(),
                actual: message.peer().clone(),
            });
        }
        let resendable = self
            .lock_messages()
            .iter()
            .find(|stored| stored.id() == message.id())
            .map_or(true, |stored| stored.state() == MessageState::NotDelivered);
        if !resendable {
            return Err(ChatError::AlreadySent(message.id()));
        }

        self.complete(message, Some(listener));
        Ok(())
    }

    fn history_range(&self, range: HistoryRange) -> Result<Vec<ChatMessage>, ChatError> {
        self.ensure_available()?;
        *self.last_history_limit.lock().expect("limit lock") = Some(range.end);

        let messages = self.lock_messages();
        let total = messages.len();
        let upper = if range.end == 0 {
            total
        } else {
            range.end.min(total)
        };
        if range.begin >= upper {
            return Ok(Vec::new());
        }

        Ok(messages[total - upper..total - range.begin].to_vec())
    }

    fn history_size(&self) -> Result<usize, ChatError> {
        self.ensure_available()?;
        Ok(self.lock_messages().len())
    }

    fn unread_messages_count(&self) -> Result<usize, ChatError> {
        self.ensure_available()?;
        Ok(self
            .lock_messages()
            .iter()
            .filter(|message| !message.is_outgoing() && message.state() != MessageState::Displayed)
            .count())
    }

    fn mark_as_read(&self) -> Result<(), ChatError> {
        self.ensure_available()?;
        for message in self
            .lock_messages()
            .iter_mut()
            .filter(|message| !message.is_outgoing())
        {
            message.mark_displayed();
        }
        Ok(())
    }

    fn delete_message(&self, id: MessageId) -> Result<(), ChatError> {
        self.ensure_available()?;
        let mut messages = self.lock_messages();
        let before = messages.len();
        messages.retain(|message| message.id() != id);
        if messages.len() == before {
            return Err(ChatError::MessageNotFound(id));
        }
        Ok(())
    }

    fn delete_history(&self) -> Result<(), ChatError> {
        self.ensure_available()?;
        self.lock_messages().clear();
        Ok(())
    }

    fn compose(&self) -> Result<(), ChatError> {
        self.ensure_available()?;
        self.composed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn is_remote_composing(&self) -> Result<bool, ChatError> {
        self.ensure_available()?;
        Ok(self.remote_composing.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_listener_observes_one_terminal_state_per_send() {
        let room = FakeChatRoom::new("sip:alice@example.org");
        let (events_tx, events_rx) = std::sync::mpsc::channel();

        room.send_message(
            room.create_message("hi"),
            Box::new(move |_: &ChatMessage, state: MessageState| {
                let _ = events_tx.send(state);
            }),
        )
        .expect("send should succeed");

        let states: Vec<MessageState> = events_rx.try_iter().collect();
        assert_eq!(states.iter().filter(|s| s.is_terminal()).count(), 1);
        assert_eq!(states.last(), Some(&MessageState::Delivered));
    }

    #[test]
    fn fake_resends_only_failed_messages() {
        let room = FakeChatRoom::new("sip:alice@example.org").failing_deliveries();
        let message = room.create_message("retry");

        room.send_tracked(message.clone()).expect("first send");
        room.send_tracked(message.clone()).expect("failed message can be resent");

        assert_eq!(room.sent_texts(), vec!["retry".to_owned()]);
    }
}
