//! rootcache - persistent cache of verified ledger root states
//!
//! Remembers, per server identity and database, the last root state a
//! client verified so that a server offering an older state can be caught.
//! Access to each server's state file is serialized across processes with
//! an exclusive OS file lock.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod state;

pub use cache::{EntryStatus, StateCache};
pub use error::{RootCacheError, RootCacheResult};
pub use state::{JsonCodec, RootState, StateCodec};
