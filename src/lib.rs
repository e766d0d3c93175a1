//! chat-relay - a thin bridge to an OpenAI-compatible chat-completions API
//!
//! This library provides the pieces of the relay server: configuration,
//! the error taxonomy, and the HTTP routes that forward and reshape chat
//! requests.

pub mod config;
pub mod error;
pub mod relay;

pub use config::Config;
pub use error::{Error, Result};
