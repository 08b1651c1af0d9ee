//! In-process messaging engine.
//!
//! A send is stored on submit and queued to a single dispatch thread that
//! drives it through `InProgress` to a terminal state and invokes its
//! listener on the way. Queued sends are still processed on shutdown, so
//! every accepted send ends in `Delivered` or `NotDelivered`.
//!
//! Composing notices travel through the same queue, after any send queued
//! before them.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        mpsc::{self, Receiver, Sender},
        Arc, Mutex, MutexGuard,
    },
    thread::{self, JoinHandle},
};

use thiserror::Error;

use crate::{
    domain::{
        address::PeerAddress,
        message::{ChatMessage, MessageId},
        state::MessageState,
    },
    engine::{
        history::HistoryStore,
        transport::{ComposingReply, Delivery, Transport},
    },
    usecases::contracts::{EngineError, HistoryRange, MessagingEngine, StateListener},
};

const ENGINE_DISPATCH_STARTED: &str = "ENGINE_DISPATCH_STARTED";
const ENGINE_DISPATCH_STOPPED: &str = "ENGINE_DISPATCH_STOPPED";
const ENGINE_DISPATCH_SHUTDOWN_FAILED: &str = "ENGINE_DISPATCH_SHUTDOWN_FAILED";
const ENGINE_DISPATCH_DETACHED: &str = "ENGINE_DISPATCH_DETACHED";
const ENGINE_RESEND_REJECTED: &str = "ENGINE_RESEND_REJECTED";
const ENGINE_COMPOSE_FAILED: &str = "ENGINE_COMPOSE_FAILED";
const ENGINE_DELIVERY_FAILED: &str = "ENGINE_DELIVERY_FAILED";
const ENGINE_MESSAGE_RECEIVED: &str = "ENGINE_MESSAGE_RECEIVED";
const ENGINE_HISTORY_POISONED: &str = "ENGINE_HISTORY_POISONED";

#[derive(Debug, Error)]
pub enum EngineStartError {
    #[error("dispatch worker spawn failed: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}

enum Job {
    Send {
        message: ChatMessage,
        listener: Option<Box<dyn StateListener>>,
    },
    Compose {
        peer: PeerAddress,
    },
    Stop,
}

struct Shared {
    local: PeerAddress,
    next_id: AtomicU64,
    history: Mutex<HistoryStore>,
    incoming_subscribers: Mutex<Vec<Sender<ChatMessage>>>,
    remote_composing: Mutex<HashSet<PeerAddress>>,
}

impl Shared {
    fn allocate_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn history(&self) -> Result<MutexGuard<'_, HistoryStore>, EngineError> {
        self.history.lock().map_err(|_| {
            tracing::error!(code = ENGINE_HISTORY_POISONED, "history store lock poisoned");
            EngineError::StorePoisoned
        })
    }

    fn receive(&self, peer: PeerAddress, text: &str) -> Result<ChatMessage, EngineError> {
        let message = ChatMessage::incoming(self.allocate_id(), self.local.clone(), peer, text);
        self.history()?.insert(message.clone());
        self.set_remote_composing(message.peer(), false);

        tracing::debug!(
            code = ENGINE_MESSAGE_RECEIVED,
            peer = %message.peer(),
            message_id = message.id().0,
            text_len = text.len(),
            "incoming message stored"
        );

        if let Ok(mut subscribers) = self.incoming_subscribers.lock() {
            subscribers.retain(|sub| sub.send(message.clone()).is_ok());
        }

        Ok(message)
    }

    fn set_remote_composing(&self, peer: &PeerAddress, composing: bool) {
        let Ok(mut peers) = self.remote_composing.lock() else {
            return;
        };

        if composing {
            peers.insert(peer.clone());
        } else {
            peers.remove(peer);
        }
    }
}

pub struct LocalEngine {
    shared: Arc<Shared>,
    jobs_tx: Mutex<Option<Sender<Job>>>,
    worker: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for LocalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEngine")
            .field("local", &self.shared.local.to_string())
            .finish_non_exhaustive()
    }
}

impl LocalEngine {
    pub fn start(
        local: PeerAddress,
        transport: Box<dyn Transport>,
        history: HistoryStore,
    ) -> Result<Self, EngineStartError> {
        let shared = Arc::new(Shared {
            local,
            next_id: AtomicU64::new(1),
            history: Mutex::new(history),
            incoming_subscribers: Mutex::new(Vec::new()),
            remote_composing: Mutex::new(HashSet::new()),
        });

        let (jobs_tx, jobs_rx) = mpsc::channel::<Job>();
        let worker_shared = shared.clone();
        let worker = thread::Builder::new()
            .name("sipchat-dispatch".to_owned())
            .spawn(move || run_dispatch(worker_shared, transport, jobs_rx))
            .map_err(EngineStartError::WorkerSpawn)?;

        tracing::info!(
            code = ENGINE_DISPATCH_STARTED,
            local = %shared.local,
            "local messaging engine started"
        );

        Ok(Self {
            shared,
            jobs_tx: Mutex::new(Some(jobs_tx)),
            worker: Some(worker),
        })
    }

    /// Receiver of every incoming message stored from now on.
    pub fn subscribe_incoming(&self) -> Receiver<ChatMessage> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subscribers) = self.shared.incoming_subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    /// Stores a message received from `peer` and notifies subscribers.
    pub fn receive(&self, peer: &PeerAddress, text: &str) -> Result<ChatMessage, EngineError> {
        self.shared.receive(peer.clone(), text)
    }

    /// Records a composing notice from `peer`. Cleared by its next message.
    pub fn receive_composing(&self, peer: &PeerAddress, composing: bool) {
        self.shared.set_remote_composing(peer, composing);
    }

    fn queue(&self, job: Job) -> Result<(), EngineError> {
        let jobs_tx = self.jobs_tx.lock().map_err(|_| EngineError::Stopped)?;
        let tx = jobs_tx.as_ref().ok_or(EngineError::Stopped)?;

        tx.send(job).map_err(|_| EngineError::Stopped)
    }

    /// Stops accepting sends. Already queued sends still complete.
    pub fn shutdown(&self) {
        let Ok(mut jobs_tx) = self.jobs_tx.lock() else {
            return;
        };

        if let Some(tx) = jobs_tx.take() {
            let _ = tx.send(Job::Stop);
        }
    }
}

impl Drop for LocalEngine {
    fn drop(&mut self) {
        self.shutdown();

        if let Some(worker) = self.worker.take() {
            if worker.thread().id() == thread::current().id() {
                // Released from a listener; the queued `Stop` ends the loop.
                tracing::debug!(
                    code = ENGINE_DISPATCH_DETACHED,
                    "engine dropped on its dispatch thread"
                );
                return;
            }

            if let Err(error) = worker.join() {
                tracing::warn!(
                    code = ENGINE_DISPATCH_SHUTDOWN_FAILED,
                    error = ?error,
                    "dispatch worker panicked on shutdown"
                );
            }
        }
    }
}

impl MessagingEngine for LocalEngine {
    fn local_address(&self) -> &PeerAddress {
        &self.shared.local
    }

    fn allocate_message_id(&self) -> MessageId {
        self.shared.allocate_id()
    }

    fn submit(
        &self,
        message: ChatMessage,
        listener: Option<Box<dyn StateListener>>,
    ) -> Result<(), EngineError> {
        let jobs_tx = self.jobs_tx.lock().map_err(|_| EngineError::Stopped)?;
        let tx = jobs_tx.as_ref().ok_or(EngineError::Stopped)?;
        let mut history = self.shared.history()?;

        match history.stored_state(message.peer(), message.id()) {
            None | Some(MessageState::NotDelivered) => {}
            Some(state) => {
                tracing::warn!(
                    code = ENGINE_RESEND_REJECTED,
                    peer = %message.peer(),
                    message_id = message.id().0,
                    state = state.as_label(),
                    "message is already sent"
                );
                return Err(EngineError::AlreadySent(message.id()));
            }
        }

        // Lock held until queued: history order equals dispatch order.
        history.insert(message.clone());
        tx.send(Job::Send { message, listener })
            .map_err(|_| EngineError::Stopped)
    }

    fn history(
        &self,
        peer: &PeerAddress,
        range: HistoryRange,
    ) -> Result<Vec<ChatMessage>, EngineError> {
        Ok(self.shared.history()?.range(peer, range))
    }

    fn history_size(&self, peer: &PeerAddress) -> Result<usize, EngineError> {
        Ok(self.shared.history()?.len(peer))
    }

    fn unread_count(&self, peer: &PeerAddress) -> Result<usize, EngineError> {
        Ok(self.shared.history()?.unread_count(peer))
    }

    fn mark_as_read(&self, peer: &PeerAddress) -> Result<(), EngineError> {
        let marked = self.shared.history()?.mark_as_read(peer);
        tracing::debug!(peer = %peer, marked, "messages marked as read");
        Ok(())
    }

    fn delete_message(&self, peer: &PeerAddress, id: MessageId) -> Result<(), EngineError> {
        if self.shared.history()?.delete_message(peer, id) {
            Ok(())
        } else {
            Err(EngineError::MessageNotFound(id))
        }
    }

    fn delete_history(&self, peer: &PeerAddress) -> Result<(), EngineError> {
        let removed = self.shared.history()?.delete_all(peer);
        tracing::debug!(peer = %peer, removed, "history deleted");
        Ok(())
    }

    fn compose(&self, peer: &PeerAddress) -> Result<(), EngineError> {
        self.queue(Job::Compose { peer: peer.clone() })
    }

    fn is_remote_composing(&self, peer: &PeerAddress) -> Result<bool, EngineError> {
        let peers = self
            .shared
            .remote_composing
            .lock()
            .map_err(|_| EngineError::StorePoisoned)?;
        Ok(peers.contains(peer))
    }
}

fn run_dispatch(shared: Arc<Shared>, mut transport: Box<dyn Transport>, jobs_rx: Receiver<Job>) {
    while let Ok(job) = jobs_rx.recv() {
        match job {
            Job::Send { message, listener } => {
                dispatch_send(&shared, transport.as_mut(), message, listener)
            }
            Job::Compose { peer } => dispatch_compose(&shared, transport.as_mut(), &peer),
            Job::Stop => break,
        }
    }

    tracing::info!(code = ENGINE_DISPATCH_STOPPED, "dispatch worker stopped");
}

fn dispatch_send(
    shared: &Shared,
    transport: &mut dyn Transport,
    mut message: ChatMessage,
    mut listener: Option<Box<dyn StateListener>>,
) {
    transition(shared, &mut message, &mut listener, MessageState::InProgress);

    match transport.deliver(&message) {
        Ok(delivery) => {
            transition(shared, &mut message, &mut listener, MessageState::Delivered);

            if let Delivery::AcceptedWithReply(reply) = delivery {
                let _ = shared.receive(message.peer().clone(), &reply);
            }
        }
        Err(error) => {
            tracing::warn!(
                code = ENGINE_DELIVERY_FAILED,
                peer = %message.peer(),
                message_id = message.id().0,
                error = %error,
                "message delivery failed"
            );
            transition(shared, &mut message, &mut listener, MessageState::NotDelivered);
        }
    }
}

fn dispatch_compose(shared: &Shared, transport: &mut dyn Transport, peer: &PeerAddress) {
    match transport.notify_composing(peer) {
        Ok(ComposingReply::PeerComposing) => shared.set_remote_composing(peer, true),
        Ok(ComposingReply::Silent) => {}
        Err(error) => tracing::warn!(
            code = ENGINE_COMPOSE_FAILED,
            peer = %peer,
            error = %error,
            "composing notice failed"
        ),
    }
}

fn transition(
    shared: &Shared,
    message: &mut ChatMessage,
    listener: &mut Option<Box<dyn StateListener>>,
    state: MessageState,
) {
    message.set_state(state);
    if let Ok(mut history) = shared.history() {
        history.update_state(message.peer(), message.id(), state);
    }

    tracing::debug!(
        peer = %message.peer(),
        message_id = message.id().0,
        state = state.as_label(),
        "message state changed"
    );

    if let Some(observer) = listener.as_mut() {
        observer.on_state_changed(message, state);
    }

    if state.is_terminal() {
        listener.take();
    }
}
