use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{
    domain::address::PeerAddress,
    usecases::{
        chat_room::{ChatError, ChatRoom, EngineChatRoom},
        contracts::MessagingEngine,
    },
};

const REGISTRY_ROOM_CREATED: &str = "CHAT_REGISTRY_ROOM_CREATED";
const REGISTRY_ROOM_DELETED: &str = "CHAT_REGISTRY_ROOM_DELETED";

/// Owns the chat rooms of one engine, at most one per peer address.
pub struct ChatRooms {
    engine: Arc<dyn MessagingEngine>,
    rooms: Mutex<HashMap<PeerAddress, Arc<EngineChatRoom>>>,
}

impl ChatRooms {
    pub fn new(engine: Arc<dyn MessagingEngine>) -> Self {
        Self {
            engine,
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the room for `uri`, creating it on first use.
    pub fn get_or_create_chat_room(&self, uri: &str) -> Result<Arc<EngineChatRoom>, ChatError> {
        let peer = PeerAddress::parse(uri)?;
        let mut rooms = self.rooms.lock().map_err(|_| ChatError::EngineUnavailable)?;

        let room = rooms.entry(peer.clone()).or_insert_with(|| {
            tracing::debug!(code = REGISTRY_ROOM_CREATED, peer = %peer, "chat room created");
            Arc::new(EngineChatRoom::new(peer, self.engine.clone()))
        });

        Ok(room.clone())
    }

    /// Returns the room for `uri` only if it already exists.
    pub fn chat_room(&self, uri: &str) -> Result<Option<Arc<EngineChatRoom>>, ChatError> {
        let peer = PeerAddress::parse(uri)?;
        let rooms = self.rooms.lock().map_err(|_| ChatError::EngineUnavailable)?;

        Ok(rooms.get(&peer).cloned())
    }

    /// All rooms, ordered by peer address.
    pub fn chat_rooms(&self) -> Vec<Arc<EngineChatRoom>> {
        let Ok(rooms) = self.rooms.lock() else {
            return Vec::new();
        };

        let mut list: Vec<_> = rooms.values().cloned().collect();
        list.sort_by_key(|room| room.peer_address().to_string());
        list
    }

    /// Drops the room for `uri` together with its history.
    ///
    /// Returns `false` when no such room exists.
    pub fn delete_chat_room(&self, uri: &str) -> Result<bool, ChatError> {
        let peer = PeerAddress::parse(uri)?;
        let removed = self
            .rooms
            .lock()
            .map_err(|_| ChatError::EngineUnavailable)?
            .remove(&peer);

        match removed {
            Some(room) => {
                room.delete_history()?;
                tracing::debug!(code = REGISTRY_ROOM_DELETED, peer = %peer, "chat room deleted");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{history::HistoryStore, local::LocalEngine, transport::LoopbackTransport};

    fn registry() -> ChatRooms {
        let engine = LocalEngine::start(
            PeerAddress::parse("sip:me@example.org").expect("address"),
            Box::new(LoopbackTransport::default()),
            HistoryStore::default(),
        )
        .expect("engine should start");

        ChatRooms::new(Arc::new(engine))
    }

    #[test]
    fn returns_same_room_for_equivalent_addresses() {
        let rooms = registry();

        let first = rooms
            .get_or_create_chat_room("sip:alice@Example.org")
            .expect("room");
        let second = rooms
            .get_or_create_chat_room("alice@example.org")
            .expect("room");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(rooms.chat_rooms().len(), 1);
    }

    #[test]
    fn distinct_addresses_get_distinct_peer_addresses() {
        let rooms = registry();

        let alice = rooms
            .get_or_create_chat_room("sip:alice@example.org")
            .expect("room");
        let bob = rooms
            .get_or_create_chat_room("sip:bob@example.org")
            .expect("room");

        assert_ne!(alice.peer_address(), bob.peer_address());
    }

    #[test]
    fn lookup_does_not_create_rooms() {
        let rooms = registry();

        let found = rooms
            .chat_room("sip:alice@example.org")
            .expect("lookup should succeed");

        assert!(found.is_none());
        assert!(rooms.chat_rooms().is_empty());
    }

    #[test]
    fn rejects_invalid_address() {
        let rooms = registry();

        let err = rooms
            .get_or_create_chat_room("tel:+33123")
            .expect_err("must fail");

        assert!(matches!(err, ChatError::InvalidAddress(_)));
    }

    #[test]
    fn lists_rooms_ordered_by_address() {
        let rooms = registry();
        rooms.get_or_create_chat_room("sip:zoe@example.org").expect("room");
        rooms.get_or_create_chat_room("sip:adam@example.org").expect("room");

        let peers: Vec<String> = rooms
            .chat_rooms()
            .iter()
            .map(|room| room.peer_address().to_string())
            .collect();

        assert_eq!(peers, vec!["sip:adam@example.org", "sip:zoe@example.org"]);
    }

    #[test]
    fn delete_removes_room_and_reports_missing() {
        let rooms = registry();
        rooms
            .get_or_create_chat_room("sip:alice@example.org")
            .expect("room");

        assert_eq!(rooms.delete_chat_room("sip:alice@example.org"), Ok(true));
        assert_eq!(rooms.delete_chat_room("sip:alice@example.org"), Ok(false));
        assert!(rooms.chat_rooms().is_empty());
    }
}
