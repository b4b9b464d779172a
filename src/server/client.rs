//! Client for connecting to the index server

use crate::query::PerfReport;
use crate::server::protocol::{
    Request, Response, SearchResponse, StatusResponse, read_message, write_message,
};
use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Read/write timeout
const IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in client operations
#[derive(Debug, Error)]
pub enum ClientError {
    /// Server is not reachable
    #[error("Index server is not running")]
    NotRunning(#[source] std::io::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Phrase or line does not exist
    #[error("{0}")]
    NotFound(String),
    #[error("Server error: {0}")]
    ServerError(String),
    #[error("Invalid response from server")]
    InvalidResponse,
}

/// Client for the index server
pub struct IndexClient {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl IndexClient {
    /// Connect to a running server
    pub fn connect(addr: impl ToSocketAddrs) -> ClientResult<Self> {
        let stream = TcpStream::connect(addr).map_err(ClientError::NotRunning)?;

        let _ = stream.set_read_timeout(Some(IO_TIMEOUT));
        let _ = stream.set_write_timeout(Some(IO_TIMEOUT));

        let reader = BufReader::new(stream.try_clone()?);
        let writer = BufWriter::new(stream);

        Ok(Self { reader, writer })
    }

    fn call(&mut self, request: &Request) -> ClientResult<Response> {
        write_message(&mut self.writer, request)?;
        match read_message(&mut self.reader)? {
            Response::Error { message } => Err(ClientError::ServerError(message)),
            Response::NotFound { message } => Err(ClientError::NotFound(message)),
            response => Ok(response),
        }
    }

    /// Find every line containing `phrase`
    pub fn search(&mut self, phrase: &str) -> ClientResult<SearchResponse> {
        let request = Request::Search {
            phrase: phrase.to_string(),
        };
        match self.call(&request)? {
            Response::Search(sr) => Ok(sr),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Fetch one line by its 0-based number
    pub fn get_line(&mut self, line: u32) -> ClientResult<String> {
        match self.call(&Request::GetLine { line })? {
            Response::Line { text, .. } => Ok(text),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Get server status
    pub fn status(&mut self) -> ClientResult<StatusResponse> {
        match self.call(&Request::Status)? {
            Response::Status(status) => Ok(status),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Request an index rebuild, from `path` or the server's current corpus
    pub fn reload(&mut self, path: Option<&Path>) -> ClientResult<(bool, String)> {
        let request = Request::Reload {
            path: path.map(Path::to_path_buf),
        };
        match self.call(&request)? {
            Response::Reloaded { success, message } => Ok((success, message)),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Run the load generator on the server
    pub fn perf(&mut self, phrase: &str, threads: usize, searches: usize) -> ClientResult<PerfReport> {
        let request = Request::Perf {
            phrase: phrase.to_string(),
            threads,
            searches,
        };
        match self.call(&request)? {
            Response::Perf(report) => Ok(report),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Request graceful shutdown
    pub fn shutdown(&mut self) -> ClientResult<()> {
        match self.call(&Request::Shutdown)? {
            Response::ShuttingDown => Ok(()),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Ping the server
    pub fn ping(&mut self) -> ClientResult<()> {
        match self.call(&Request::Ping)? {
            Response::Pong => Ok(()),
            _ => Err(ClientError::InvalidResponse),
        }
    }
}
