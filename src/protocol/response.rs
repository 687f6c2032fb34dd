//! Response definitions
//!
//! Represents replies to clients. The payload layout depends on the command
//! being answered: PUT and DELETE carry a one-byte found flag, GET carries
//! the value, SWAP carries the displaced value, SCAN carries a counted pair
//! sequence. NOT_FOUND is an ordinary reply, not an error.

use crate::error::{KvError, Result};

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    NotFound = 0x01,
    Error = 0x02,
}

/// A response to send to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// OK with an optional payload
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// NOT_FOUND with no payload
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            payload: None,
        }
    }

    /// ERROR carrying a message
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    /// OK carrying a one-byte found flag (PUT and DELETE replies)
    pub fn found_flag(found: bool) -> Self {
        Self {
            status: Status::Ok,
            payload: Some(vec![u8::from(found)]),
        }
    }

    /// Parse a one-byte found flag out of a PUT or DELETE reply
    pub fn found(&self) -> Result<bool> {
        match self.payload.as_deref() {
            Some([flag]) => Ok(*flag != 0),
            other => Err(KvError::Protocol(format!(
                "expected a one-byte found flag, got {} bytes",
                other.map(<[u8]>::len).unwrap_or(0)
            ))),
        }
    }
}
