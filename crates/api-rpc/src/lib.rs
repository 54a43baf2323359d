//! JSON-RPC API Layer
//!
//! Exposes IngestEvent and GetStatus as JSON-RPC 2.0 methods over HTTP.

pub mod handler;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
