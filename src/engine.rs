//! Engine Module
//!
//! The server core: owns the ordered index and the command log, and
//! serializes every operation under one exclusive lock.
//!
//! ## Operation shape
//! Each mutation observes the pre-image index (for its reply), durably
//! appends its record, then applies the record to the index, all inside the
//! critical section. Reads never touch the log. If an append fails the index
//! is left unchanged and the caller sees the storage error; the engine keeps
//! serving.
//!
//! ## Recovery
//! `Engine::open` drains the command log into an empty index before the
//! engine is handed to the network layer. A hard decode error aborts open;
//! a half-recovered index is never served.

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::Result;
use crate::index::Index;
use crate::log::CommandLog;
use crate::record::MutationRecord;

/// The storage engine
#[derive(Debug)]
pub struct Engine {
    inner: Mutex<EngineInner>,
}

#[derive(Debug)]
struct EngineInner {
    index: Index,
    log: CommandLog,
}

impl Engine {
    /// Open the configured log backend, replay it, and return an engine
    /// ready to serve
    pub fn open(config: &Config) -> Result<Self> {
        let mut log = CommandLog::open(config)?;

        let mut index = Index::new();
        let recovered = log.replay(|record| record.apply(&mut index))?;
        tracing::info!(
            records = recovered,
            keys = index.len(),
            "recovery complete"
        );

        Ok(Engine {
            inner: Mutex::new(EngineInner { index, log }),
        })
    }

    /// Install (key, value); reply whether the key was already present
    pub fn put(&self, key: String, value: String) -> Result<bool> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let found = inner.index.get(&key).is_some();
        let record = MutationRecord::Put { key, value };
        inner.log.append(&record)?;
        record.apply(&mut inner.index);
        Ok(found)
    }

    /// Look up a key
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let inner = self.inner.lock();
        Ok(inner.index.get(key).map(str::to_owned))
    }

    /// Install (key, value); reply with the displaced value if any
    pub fn swap(&self, key: String, value: String) -> Result<Option<String>> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let prev = inner.index.get(&key).map(str::to_owned);
        let record = MutationRecord::Swap { key, value };
        inner.log.append(&record)?;
        record.apply(&mut inner.index);
        Ok(prev)
    }

    /// Remove a key; reply whether it was present
    ///
    /// A delete of an absent key is still logged: the log mirrors the intent
    /// stream, and the applier is idempotent for absent keys.
    pub fn delete(&self, key: String) -> Result<bool> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let found = inner.index.get(&key).is_some();
        let record = MutationRecord::Delete { key };
        inner.log.append(&record)?;
        record.apply(&mut inner.index);
        Ok(found)
    }

    /// All entries with start_key <= key <= end_key, ascending
    pub fn scan(&self, start_key: &str, end_key: &str) -> Result<Vec<(String, String)>> {
        let mut pairs = Vec::new();
        if start_key > end_key {
            return Ok(pairs);
        }

        let inner = self.inner.lock();
        inner.index.ascend_from(start_key, |key, value| {
            if key > end_key {
                return false;
            }
            pairs.push((key.to_string(), value.to_string()));
            true
        });
        Ok(pairs)
    }

    /// Number of live keys
    pub fn key_count(&self) -> usize {
        self.inner.lock().index.len()
    }
}
