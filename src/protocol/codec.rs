//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol. Field validation
//! (lengths, UTF-8) happens here, before a request ever reaches the engine's
//! critical section.

use std::io::{Read, Write};

use crate::error::{KvError, Result};

use super::{Command, Response, Status};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Vec<u8> {
    let cmd_type = command.command_type() as u8;

    let payload = match command {
        Command::Get { key } | Command::Delete { key } => lp_field(key, &[]),
        Command::Put { key, value } | Command::Swap { key, value } => {
            lp_field(key, value.as_bytes())
        }
        Command::Scan {
            start_key,
            end_key,
        } => lp_field(start_key, end_key.as_bytes()),
        Command::Ping => Vec::new(),
    };

    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(cmd_type);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(&payload);

    message
}

/// Length-prefixed first field followed by the raw remainder
fn lp_field(first: &str, rest: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(4 + first.len() + rest.len());
    payload.extend_from_slice(&(first.len() as u32).to_be_bytes());
    payload.extend_from_slice(first.as_bytes());
    payload.extend_from_slice(rest);
    payload
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (type_byte, payload) = split_message(bytes, "command")?;

    match type_byte {
        0x01 => {
            let (key, rest) = split_lp_field(payload, "GET")?;
            expect_empty(rest, "GET")?;
            Ok(Command::Get { key: utf8(key, "key")? })
        }
        0x02 => {
            let (key, value) = split_lp_field(payload, "PUT")?;
            Ok(Command::Put {
                key: utf8(key, "key")?,
                value: utf8(value, "value")?,
            })
        }
        0x03 => {
            let (key, rest) = split_lp_field(payload, "DELETE")?;
            expect_empty(rest, "DELETE")?;
            Ok(Command::Delete { key: utf8(key, "key")? })
        }
        0x04 => {
            let (key, value) = split_lp_field(payload, "SWAP")?;
            Ok(Command::Swap {
                key: utf8(key, "key")?,
                value: utf8(value, "value")?,
            })
        }
        0x05 => {
            let (start, end) = split_lp_field(payload, "SCAN")?;
            Ok(Command::Scan {
                start_key: utf8(start, "start_key")?,
                end_key: utf8(end, "end_key")?,
            })
        }
        0x06 => {
            expect_empty(payload, "PING")?;
            Ok(Command::Ping)
        }
        _ => Err(KvError::Protocol(format!(
            "unknown command type: 0x{type_byte:02x}"
        ))),
    }
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);

    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(response.status as u8);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(payload);

    message
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_message(bytes, "response")?;

    let status = match status_byte {
        0x00 => Status::Ok,
        0x01 => Status::NotFound,
        0x02 => Status::Error,
        _ => {
            return Err(KvError::Protocol(format!(
                "unknown response status: 0x{status_byte:02x}"
            )))
        }
    };

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Scan Pair Encoding
// =============================================================================

/// Encode a SCAN reply payload: pair count (4) then, per pair,
/// key_len (4) + key + value_len (4) + value
pub fn encode_pairs(pairs: &[(String, String)]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&(pairs.len() as u32).to_be_bytes());
    for (key, value) in pairs {
        payload.extend_from_slice(&(key.len() as u32).to_be_bytes());
        payload.extend_from_slice(key.as_bytes());
        payload.extend_from_slice(&(value.len() as u32).to_be_bytes());
        payload.extend_from_slice(value.as_bytes());
    }
    payload
}

/// Decode a SCAN reply payload
pub fn decode_pairs(payload: &[u8]) -> Result<Vec<(String, String)>> {
    let (count_bytes, mut rest) = split_at_checked(payload, 4, "SCAN pair count")?;
    let count = u32::from_be_bytes([
        count_bytes[0],
        count_bytes[1],
        count_bytes[2],
        count_bytes[3],
    ]) as usize;

    let mut pairs = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let (key, after_key) = split_lp_field(rest, "SCAN key")?;
        let (value, after_value) = split_lp_field(after_key, "SCAN value")?;
        pairs.push((utf8(key, "key")?, utf8(value, "value")?));
        rest = after_value;
    }

    if !rest.is_empty() {
        return Err(KvError::Protocol(format!(
            "SCAN reply: {} trailing bytes after {count} pairs",
            rest.len()
        )));
    }

    Ok(pairs)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let message = read_message(reader)?;
    decode_command(&message)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writer.write_all(&encode_command(command))?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_message(reader)?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response))?;
    writer.flush()?;
    Ok(())
}

/// Read one header-framed message (header + payload) off a stream
fn read_message<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(KvError::Protocol(format!(
            "payload too large: {payload_len} bytes (max {MAX_PAYLOAD_SIZE})"
        )));
    }

    let mut message = vec![0u8; HEADER_SIZE + payload_len as usize];
    message[..HEADER_SIZE].copy_from_slice(&header);
    reader.read_exact(&mut message[HEADER_SIZE..])?;
    Ok(message)
}

// =============================================================================
// Field parsing helpers
// =============================================================================

/// Split a framed message into (type byte, payload), validating lengths
fn split_message<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(KvError::Protocol(format!(
            "incomplete {what} header: expected {HEADER_SIZE} bytes, got {}",
            bytes.len()
        )));
    }

    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(KvError::Protocol(format!(
            "{what} payload too large: {payload_len} bytes (max {MAX_PAYLOAD_SIZE})"
        )));
    }

    let total = HEADER_SIZE + payload_len as usize;
    if bytes.len() < total {
        return Err(KvError::Protocol(format!(
            "incomplete {what} payload: expected {total} bytes, got {}",
            bytes.len()
        )));
    }

    Ok((bytes[0], &bytes[HEADER_SIZE..total]))
}

/// Split a payload into its length-prefixed first field and the remainder
fn split_lp_field<'a>(payload: &'a [u8], what: &str) -> Result<(&'a [u8], &'a [u8])> {
    let (len_bytes, rest) = split_at_checked(payload, 4, what)?;
    let len = u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
    split_at_checked(rest, len, what)
}

fn split_at_checked<'a>(bytes: &'a [u8], mid: usize, what: &str) -> Result<(&'a [u8], &'a [u8])> {
    if bytes.len() < mid {
        return Err(KvError::Protocol(format!(
            "{what}: truncated field (need {mid} bytes, have {})",
            bytes.len()
        )));
    }
    Ok(bytes.split_at(mid))
}

fn expect_empty(rest: &[u8], cmd: &str) -> Result<()> {
    if !rest.is_empty() {
        return Err(KvError::Protocol(format!(
            "{cmd} command: unexpected trailing payload of {} bytes",
            rest.len()
        )));
    }
    Ok(())
}

fn utf8(bytes: &[u8], what: &str) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| KvError::Protocol(format!("{what} is not valid UTF-8")))
}
