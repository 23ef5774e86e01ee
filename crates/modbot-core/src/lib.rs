//! Core of the community moderation bot.
//!
//! Framework-agnostic: the chat platform lives behind [`messaging::port::GatewayPort`]
//! and is implemented in the adapter crate.

pub mod classifier;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod event_log;
pub mod events;
pub mod logging;
pub mod membership;
pub mod messaging;
pub mod moderation;
pub mod permissions;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
