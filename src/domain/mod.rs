//! Domain layer: core entities and business rules.

pub mod address;
pub mod events;
pub mod message;
pub mod state;

/// Returns the domain module name for smoke checks.
pub fn module_name() -> &'static str {
    "domain"
}
