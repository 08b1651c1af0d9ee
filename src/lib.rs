//! Chat rooms over a pluggable messaging engine.
//!
//! A [`usecases::chat_room::ChatRoom`] is the per-peer capability surface:
//! peer address, message creation, sending with or without a state listener,
//! and history queries. [`engine::local::LocalEngine`] is the in-process
//! engine behind it.

pub mod app;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod infra;
#[cfg(test)]
mod test_support;
pub mod ui;
pub mod usecases;
