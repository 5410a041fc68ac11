//! HTTP API for creating, listing and deleting per-user desktop containers.
//!
//! Each request is translated into one or more container runtime CLI
//! invocations; all user state lives in the runtime itself.

pub mod config;
pub mod error;
pub mod http_server;
pub mod runtime;
pub mod state;
