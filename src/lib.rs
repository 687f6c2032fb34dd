//! # RangeKV
//!
//! A durable, ordered key-value store served over a small binary protocol:
//! - Ordered in-memory index with inclusive range scans
//! - Append-only command log for durability (framed file or embedded
//!   database backend), fsynced on every mutation
//! - Deterministic replay on startup rebuilds the index
//! - One exclusive lock serializes every operation
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                             │
//! │                  (Multiple Clients)                         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                │
//! │               (one exclusive section)                       │
//! └─────────┬─────────────────────────────────┬─────────────────┘
//!           │ mutations: log first            │ reads
//!           ▼                                 ▼
//!    ┌─────────────┐                   ┌─────────────┐
//!    │ Command Log │  ── replay ──▶    │    Index    │
//!    │ (file | db) │                   │  (BTreeMap) │
//!    └─────────────┘                   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod engine;
pub mod index;
pub mod log;
pub mod network;
pub mod protocol;
pub mod record;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{Config, LogBackend};
pub use engine::Engine;
pub use error::{KvError, Result};
pub use record::MutationRecord;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of RangeKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
