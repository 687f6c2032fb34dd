//! Connection Handler
//!
//! Serves sequential requests on one client connection until the peer
//! closes, a timeout fires, or the request stream turns malformed.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{KvError, Result};
use crate::protocol::{
    encode_pairs, read_command, write_response, Command, Response,
};

/// Handles a single client connection
pub struct Connection {
    stream: TcpStream,
    engine: Arc<Engine>,
    peer: String,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, engine: Arc<Engine>) -> Result<Self> {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        Ok(Connection {
            stream,
            engine,
            peer,
        })
    }

    /// Apply socket timeouts
    pub fn set_timeouts(&self, read_ms: u64, write_ms: u64) -> Result<()> {
        self.stream
            .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        self.stream
            .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        Ok(())
    }

    /// Peer address for logging
    pub fn peer_addr(&self) -> &str {
        &self.peer
    }

    /// Serve requests until the connection ends
    pub fn handle(&mut self) -> Result<()> {
        loop {
            let command = match read_command(&mut self.stream) {
                Ok(command) => command,
                // Peer closed between requests
                Err(KvError::Io(e)) if e.kind() == ErrorKind::UnexpectedEof => return Ok(()),
                Err(KvError::Protocol(msg)) => {
                    let _ = write_response(&mut self.stream, &Response::error(&msg));
                    return Err(KvError::Protocol(msg));
                }
                Err(e) => return Err(e),
            };

            let response = self.dispatch(command);
            write_response(&mut self.stream, &response)?;
        }
    }

    /// Run one command against the engine and shape its reply
    fn dispatch(&self, command: Command) -> Response {
        match command {
            Command::Get { key } => match self.engine.get(&key) {
                Ok(Some(value)) => Response::ok(Some(value.into_bytes())),
                Ok(None) => Response::not_found(),
                Err(e) => self.error_response(e),
            },
            Command::Put { key, value } => match self.engine.put(key, value) {
                Ok(found) => Response::found_flag(found),
                Err(e) => self.error_response(e),
            },
            Command::Delete { key } => match self.engine.delete(key) {
                Ok(found) => Response::found_flag(found),
                Err(e) => self.error_response(e),
            },
            Command::Swap { key, value } => match self.engine.swap(key, value) {
                Ok(Some(old_value)) => Response::ok(Some(old_value.into_bytes())),
                Ok(None) => Response::not_found(),
                Err(e) => self.error_response(e),
            },
            Command::Scan {
                start_key,
                end_key,
            } => match self.engine.scan(&start_key, &end_key) {
                Ok(pairs) => Response::ok(Some(encode_pairs(&pairs))),
                Err(e) => self.error_response(e),
            },
            Command::Ping => Response::ok(Some(b"PONG".to_vec())),
        }
    }

    fn error_response(&self, err: KvError) -> Response {
        tracing::error!(peer = %self.peer, error = %err, "operation failed");
        Response::error(&err.to_string())
    }
}
