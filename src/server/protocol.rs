//! Protocol messages for client-server communication
//!
//! Uses a simple length-prefixed JSON protocol:
//! - 4 bytes (little-endian u32): message length
//! - N bytes: JSON-encoded message

use crate::query::PerfReport;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Largest frame accepted from the wire
pub const MAX_MESSAGE_LEN: usize = 100 * 1024 * 1024;

/// A frame header announced more than [`MAX_MESSAGE_LEN`] bytes.
///
/// The body is left unread, so the stream is out of sync afterwards and the
/// connection has to be dropped.
#[derive(Debug, Error)]
#[error("Message too large: {len} bytes (limit {MAX_MESSAGE_LEN})")]
pub struct FrameTooLarge {
    pub len: usize,
}

/// Whether `err` came from an oversized frame header
pub fn is_frame_too_large(err: &std::io::Error) -> bool {
    err.get_ref().is_some_and(|inner| inner.is::<FrameTooLarge>())
}

/// Request from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Find every line containing a phrase
    Search { phrase: String },

    /// Fetch one line by its 0-based number
    GetLine { line: u32 },

    /// Check server health and get stats
    Status,

    /// Rebuild from a corpus file (the current one when `path` is `None`)
    /// and swap the new index in
    Reload { path: Option<PathBuf> },

    /// Run the load generator inside the server
    Perf {
        phrase: String,
        threads: usize,
        searches: usize,
    },

    /// Graceful shutdown request
    Shutdown,

    /// Ping for connection testing
    Ping,
}

/// Response from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Search(SearchResponse),

    /// Phrase or line does not exist
    NotFound { message: String },

    Line { line: u32, text: String },

    Status(StatusResponse),

    /// Reload completed
    Reloaded { success: bool, message: String },

    Perf(PerfReport),

    /// Shutdown acknowledged
    ShuttingDown,

    Pong,

    Error { message: String },
}

/// Search results response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matching line texts, in no particular order
    pub lines: Vec<String>,
    /// Number of matching lines
    pub count: u64,
    /// Time taken in milliseconds
    pub duration_ms: f64,
    /// Whether results came from cache
    pub cached: bool,
}

/// Server status response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub uptime_secs: u64,
    /// Corpus the current index was built from, if it came from a file
    pub source: Option<PathBuf>,
    pub lines: usize,
    pub trie_nodes: usize,
    pub max_phrase_len: Option<usize>,
    pub queries_served: u64,
    /// Cache hit rate (0.0 - 1.0)
    pub cache_hit_rate: f32,
    pub reloads: u64,
}

/// Write a message to a stream with length prefix
pub fn write_message<W: Write>(writer: &mut W, msg: &impl Serialize) -> std::io::Result<()> {
    let json = serde_json::to_vec(msg)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let len = u32::try_from(json.len())
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidData, "Message too large"))?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&json)?;
    writer.flush()?;

    Ok(())
}

/// Read a message from a stream with length prefix
pub fn read_message<R: Read, T: for<'de> Deserialize<'de>>(reader: &mut R) -> std::io::Result<T> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    if len > MAX_MESSAGE_LEN {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            FrameTooLarge { len },
        ));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;

    serde_json::from_slice(&buf).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
