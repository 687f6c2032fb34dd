//! Database-backed command log
//!
//! One embedded redb database holding a single table: a monotonically
//! increasing sequence number mapped to the bincode encoding of a stored
//! command. Every insert commits with immediate durability, which is the
//! row-level equivalent of the file backend's fsync-per-append. Replay reads
//! rows in ascending sequence order; any row that fails to decode aborts
//! recovery, since the database either committed a row whole or not at all.

use std::path::Path;

use redb::{Database, Durability, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::error::{KvError, Result};
use crate::record::MutationRecord;

/// Name of the database file inside the data directory
pub const DB_FILE_NAME: &str = "commands.db";

/// Sequence number → encoded stored command
const COMMAND_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("commands");

/// On-row form of a mutation record: enumerated opcode plus string fields
///
/// Deletes store an empty value. An opcode outside the three variants fails
/// bincode decode, which aborts recovery.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCommand {
    op: StoredOp,
    key: String,
    value: String,
}

#[derive(Debug, Serialize, Deserialize)]
enum StoredOp {
    Put,
    Swap,
    Delete,
}

impl From<&MutationRecord> for StoredCommand {
    fn from(record: &MutationRecord) -> Self {
        match record {
            MutationRecord::Put { key, value } => StoredCommand {
                op: StoredOp::Put,
                key: key.clone(),
                value: value.clone(),
            },
            MutationRecord::Swap { key, value } => StoredCommand {
                op: StoredOp::Swap,
                key: key.clone(),
                value: value.clone(),
            },
            MutationRecord::Delete { key } => StoredCommand {
                op: StoredOp::Delete,
                key: key.clone(),
                value: String::new(),
            },
        }
    }
}

impl From<StoredCommand> for MutationRecord {
    fn from(cmd: StoredCommand) -> Self {
        match cmd.op {
            StoredOp::Put => MutationRecord::Put {
                key: cmd.key,
                value: cmd.value,
            },
            StoredOp::Swap => MutationRecord::Swap {
                key: cmd.key,
                value: cmd.value,
            },
            StoredOp::Delete => MutationRecord::Delete { key: cmd.key },
        }
    }
}

/// redb-backed command log
#[derive(Debug)]
pub struct DbLog {
    db: Database,
    next_seq: u64,
}

impl DbLog {
    /// Open or create the database under `dir`
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(DB_FILE_NAME);

        let db = Database::create(&path)
            .map_err(|e| storage_err("open command database", e))?;

        // Ensure the table exists before the first read
        let txn = db
            .begin_write()
            .map_err(|e| storage_err("begin schema transaction", e))?;
        {
            let _ = txn
                .open_table(COMMAND_TABLE)
                .map_err(|e| storage_err("create command table", e))?;
        }
        txn.commit()
            .map_err(|e| storage_err("commit schema transaction", e))?;

        let next_seq = {
            let txn = db
                .begin_read()
                .map_err(|e| storage_err("begin read transaction", e))?;
            let table = txn
                .open_table(COMMAND_TABLE)
                .map_err(|e| storage_err("open command table", e))?;
            let last = table
                .last()
                .map_err(|e| storage_err("read last sequence", e))?
                .map(|(seq, _)| seq.value() + 1)
                .unwrap_or(1);
            last
        };

        Ok(DbLog { db, next_seq })
    }

    /// Insert one record as the next row, committing synchronously
    pub fn append(&mut self, record: &MutationRecord) -> Result<()> {
        let payload = bincode::serialize(&StoredCommand::from(record))
            .map_err(|e| KvError::Serialization(format!("encode record: {e}")))?;

        let mut txn = self
            .db
            .begin_write()
            .map_err(|e| storage_err("begin append transaction", e))?;
        txn.set_durability(Durability::Immediate);
        {
            let mut table = txn
                .open_table(COMMAND_TABLE)
                .map_err(|e| storage_err("open command table", e))?;
            table
                .insert(self.next_seq, payload.as_slice())
                .map_err(|e| storage_err("insert command row", e))?;
        }
        txn.commit()
            .map_err(|e| storage_err("commit command row", e))?;

        self.next_seq += 1;
        Ok(())
    }

    /// Replay every row in ascending sequence order through `visit`
    pub fn replay<F>(&mut self, mut visit: F) -> Result<u64>
    where
        F: FnMut(MutationRecord),
    {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| storage_err("begin replay transaction", e))?;
        let table = txn
            .open_table(COMMAND_TABLE)
            .map_err(|e| storage_err("open command table", e))?;

        let mut recovered = 0u64;
        let rows = table
            .range::<u64>(..)
            .map_err(|e| storage_err("scan command rows", e))?;
        for row in rows {
            let (seq, payload) = row.map_err(|e| storage_err("read command row", e))?;
            let cmd: StoredCommand = bincode::deserialize(payload.value()).map_err(|e| {
                KvError::LogCorruption(format!("bad payload at seq {}: {e}", seq.value()))
            })?;
            visit(cmd.into());
            recovered += 1;
        }

        Ok(recovered)
    }
}

fn storage_err(context: &str, err: impl std::fmt::Display) -> KvError {
    KvError::Storage(format!("{context}: {err}"))
}
