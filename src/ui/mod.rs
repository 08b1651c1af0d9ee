//! UI layer: console interaction and transcript rendering.

pub mod console;
pub mod transcript;

/// Returns the UI module name for smoke checks.
pub fn module_name() -> &'static str {
    "ui"
}
