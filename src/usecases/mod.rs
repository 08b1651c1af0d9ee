//! Use case layer: chat room capability and application workflows.

pub mod bootstrap;
pub mod chat_room;
pub mod context;
pub mod contracts;
pub mod delivery;
pub mod load_history;
pub mod registry;
pub mod send_message;

/// Returns the usecases module name for smoke checks.
pub fn module_name() -> &'static str {
    "usecases"
}
