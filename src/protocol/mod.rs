//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (Simple Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: GET    - Payload: key_len (4) + key
//! - 0x02: PUT    - Payload: key_len (4) + key + value
//! - 0x03: DELETE - Payload: key_len (4) + key
//! - 0x04: SWAP   - Payload: key_len (4) + key + value
//! - 0x05: SCAN   - Payload: start_len (4) + start_key + end_key
//! - 0x06: PING   - Payload: empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: NOT_FOUND
//! - 0x02: ERROR
//!
//! All keys and values are UTF-8 strings; the decoder rejects anything else
//! before a request reaches the engine.

mod codec;
mod command;
mod response;

pub use codec::{
    decode_command, decode_pairs, decode_response, encode_command, encode_pairs, encode_response,
    read_command, read_response, write_command, write_response,
};
pub use command::{Command, CommandType};
pub use response::{Response, Status};
