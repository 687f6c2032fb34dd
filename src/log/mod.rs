//! Command Log Module
//!
//! Durable, ordered, append-only sequence of mutation records.
//!
//! ## Responsibilities
//! - Append records so they survive a crash before the caller gets a reply
//! - Replay every acknowledged record, in insertion order, on startup
//! - Tolerate a single trailing partial frame (file backend) as a crash
//!   artifact; treat every other decode failure as unrecoverable
//!
//! ## Backends
//! Two interchangeable backends with identical externally observable
//! semantics:
//! - [`FileLog`]: length-prefixed JSON frames in a single regular file,
//!   flushed and fsynced after every record
//! - [`DbLog`]: rows in an embedded redb database, one integer-keyed table,
//!   fully synchronous commit on every insert

mod db;
mod file;
mod frame;

pub use db::{DbLog, DB_FILE_NAME};
pub use file::{FileLog, LOG_FILE_NAME};
pub use frame::{decode_frame, encode_frame, MAX_FRAME_PAYLOAD};

use crate::config::{Config, LogBackend};
use crate::error::Result;
use crate::record::MutationRecord;

/// The command log, generic over the durability backend
#[derive(Debug)]
pub enum CommandLog {
    File(FileLog),
    Db(DbLog),
}

impl CommandLog {
    /// Open the backend selected by the config, creating durable state under
    /// the config's data directory as needed
    pub fn open(config: &Config) -> Result<Self> {
        match config.backend {
            LogBackend::FramedFile => Ok(CommandLog::File(FileLog::open(&config.data_dir)?)),
            LogBackend::Database => Ok(CommandLog::Db(DbLog::open(&config.data_dir)?)),
        }
    }

    /// Durably append one record
    ///
    /// On return the record is guaranteed recoverable. On error nothing may
    /// be assumed about the record, and the caller must not mutate the index.
    pub fn append(&mut self, record: &MutationRecord) -> Result<()> {
        match self {
            CommandLog::File(log) => log.append(record),
            CommandLog::Db(log) => log.append(record),
        }
    }

    /// Drain every previously acknowledged record, in insertion order,
    /// through `visit`
    ///
    /// Returns the number of records recovered. After replay the log is
    /// positioned so that subsequent appends continue at the true end.
    pub fn replay<F>(&mut self, visit: F) -> Result<u64>
    where
        F: FnMut(MutationRecord),
    {
        match self {
            CommandLog::File(log) => log.replay(visit),
            CommandLog::Db(log) => log.replay(visit),
        }
    }
}
