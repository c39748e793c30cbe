//! MCP tool server exposing speech over stdio

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod params;
mod server;

pub use params::{SpeakParams, StopParams};
pub use server::OratorServer;
