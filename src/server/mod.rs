//! Index server for warm searches
//!
//! The server keeps a built engine in memory so queries skip the indexing
//! cost entirely.
//!
//! Architecture:
//! - [`IndexServer`]: holds the current engine, listens on TCP, handles requests
//! - [`IndexClient`]: connects to the server, sends requests, decodes responses
//! - `protocol`: length-prefixed JSON frames shared by both sides

mod client;
pub mod daemon;
pub mod protocol;

pub use client::{ClientError, ClientResult, IndexClient};
pub use daemon::{IndexServer, ServerConfig};
