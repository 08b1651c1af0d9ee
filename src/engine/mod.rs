//! Messaging engine layer: in-process delivery, history and transports.

pub mod history;
pub mod local;
pub mod transport;

/// Returns the engine module name for smoke checks.
pub fn module_name() -> &'static str {
    "engine"
}
