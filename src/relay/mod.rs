//! HTTP relay module.
//!
//! Accepts simplified chat requests, forwards them to the configured
//! OpenAI-compatible provider and reshapes the reply.

mod handlers;
mod server;
pub mod types;

pub use server::{create_router, run_server, AppState};
pub use types::{ChatRequest, ChatResponse, Message, UpstreamRequest};
