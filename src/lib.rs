//! Keel - static file server over HTTP and HTTPS
//!
//! Core library: request parsing, content negotiation, file resolution
//! and the per-connection state machine, plus the listeners that drive it.

pub mod config;
pub mod http;
pub mod server;
pub mod static_files;
