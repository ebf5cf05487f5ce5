//! Persistent cache of verified ledger root states
//!
//! Remembers, per server identity and per database, the last root state a
//! client verified, so a later state offered by the server can be checked
//! against it for rollback or replay.
//!
//! # Locking
//!
//! One file per server identity (`<dir>/.state-<identity>`). A handle must
//! [`StateCache::lock`] the identity before any read or write; the lock is
//! an exclusive OS file lock, so other processes (and other handles in this
//! process) block until [`StateCache::unlock`] or drop.
//!
//! | State | Allowed |
//! |-------|---------|
//! | Unlocked | `lock`, `try_lock` |
//! | Locked | `get`, `set`, `invalidate`, `entries`, `unlock` |
//!
//! A handle is single-owner: share it across threads only behind your own
//! synchronization.

pub mod entry;
pub mod lockfile;

pub use entry::{Entry, EntryStatus};
pub use lockfile::LockedFile;

use crate::error::{RootCacheError, RootCacheResult};
use crate::state::{JsonCodec, RootState, StateCodec};
use entry::validate_database_name;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name prefix for per-server state files
pub const STATE_FILE_PREFIX: &str = ".state-";

#[derive(Debug)]
struct Held {
    server: String,
    file: LockedFile,
}

/// File-backed root state cache for one client
pub struct StateCache<C: StateCodec = JsonCodec<RootState>> {
    dir: PathBuf,
    codec: C,
    held: Option<Held>,
}

impl<C: StateCodec> fmt::Debug for StateCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCache")
            .field("dir", &self.dir)
            .field("held", &self.held)
            .finish_non_exhaustive()
    }
}

impl StateCache {
    /// Create a cache storing [`RootState`] records as JSON under `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_codec(dir, JsonCodec::new())
    }
}

impl<C: StateCodec> StateCache<C> {
    /// Create a cache with a caller-supplied serializer
    ///
    /// `dir` must already exist; it is not created here.
    pub fn with_codec(dir: impl Into<PathBuf>, codec: C) -> Self {
        Self {
            dir: dir.into(),
            codec,
            held: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the state file for `server`
    pub fn state_file_path(&self, server: &str) -> PathBuf {
        self.dir.join(format!("{}{}", STATE_FILE_PREFIX, server))
    }

    pub fn is_locked(&self) -> bool {
        self.held.is_some()
    }

    /// Identity the handle currently holds the lock for
    pub fn locked_server(&self) -> Option<&str> {
        self.held.as_ref().map(|h| h.server.as_str())
    }

    /// Take the exclusive lock for `server`, waiting as long as needed
    ///
    /// Creates the state file if absent. Re-locking a locked handle fails
    /// with `AlreadyLocked`.
    pub fn lock(&mut self, server: &str) -> RootCacheResult<()> {
        self.ensure_unlocked()?;
        validate_server_identity(server)?;

        let path = self.state_file_path(server);
        let file = LockedFile::open(&path)
            .map_err(|e| RootCacheError::io(format!("locking state file {}", path.display()), e))?;

        debug!("Locked state file {}", path.display());
        self.held = Some(Held {
            server: server.to_string(),
            file,
        });
        Ok(())
    }

    /// Take the lock for `server` only if it is free right now
    ///
    /// Returns `false` when another holder has it.
    pub fn try_lock(&mut self, server: &str) -> RootCacheResult<bool> {
        self.ensure_unlocked()?;
        validate_server_identity(server)?;

        let path = self.state_file_path(server);
        let file = LockedFile::try_open(&path)
            .map_err(|e| RootCacheError::io(format!("locking state file {}", path.display()), e))?;

        match file {
            Some(file) => {
                debug!("Locked state file {}", path.display());
                self.held = Some(Held {
                    server: server.to_string(),
                    file,
                });
                Ok(true)
            }
            None => {
                debug!("State file {} is locked elsewhere", path.display());
                Ok(false)
            }
        }
    }

    /// Release the lock and close the state file
    pub fn unlock(&mut self) -> RootCacheResult<()> {
        let held = self.held.take().ok_or(RootCacheError::NotLocked)?;
        let path = held.file.path().to_path_buf();

        held.file
            .unlock()
            .map_err(|e| RootCacheError::io(format!("unlocking state file {}", path.display()), e))?;

        debug!("Unlocked state file {}", path.display());
        Ok(())
    }

    /// Load the last state recorded for `database`
    ///
    /// Fails with `PreviousStateNotFound` when there is no entry or the
    /// entry is a tombstone, and with `LocalStateCorrupted` when the stored
    /// payload cannot be decoded.
    pub fn get(&mut self, server: &str, database: &str) -> RootCacheResult<C::State> {
        self.ensure_held(server)?;
        validate_database_name(database)?;
        let content = self.read_content(server)?;

        let entry = lines(&content)
            .filter_map(Entry::parse)
            .find(|e| e.name == database)
            .ok_or_else(|| RootCacheError::PreviousStateNotFound {
                database: database.to_string(),
            })?;

        let bytes = entry.decode()?;
        self.codec
            .decode(&bytes)
            .map_err(|e| RootCacheError::corrupted(database, e.to_string()))
    }

    /// Record `state` as the latest verified state for `database`
    ///
    /// The file is left untouched if the codec fails.
    pub fn set(&mut self, server: &str, database: &str, state: &C::State) -> RootCacheResult<()> {
        self.ensure_held(server)?;
        validate_database_name(database)?;
        let bytes = self
            .codec
            .encode(state)
            .map_err(RootCacheError::Serialize)?;

        self.write_entry(server, Entry::encode(database, &bytes))?;
        debug!("Stored state for database {} ({} bytes)", database, bytes.len());
        Ok(())
    }

    /// Mark `database` as having no trustworthy previous state
    pub fn invalidate(&mut self, server: &str, database: &str) -> RootCacheResult<()> {
        self.ensure_held(server)?;
        validate_database_name(database)?;
        self.write_entry(server, Entry::tombstone(database))?;
        info!("Wrote tombstone for database {}", database);
        Ok(())
    }

    /// List every database in the state file with its entry status
    pub fn entries(&mut self, server: &str) -> RootCacheResult<Vec<(String, EntryStatus)>> {
        let content = self.read_content(server)?;
        Ok(lines(&content)
            .filter_map(Entry::parse)
            .map(|e| {
                let status = e.status();
                (e.name, status)
            })
            .collect())
    }

    fn ensure_unlocked(&self) -> RootCacheResult<()> {
        match &self.held {
            Some(held) => Err(RootCacheError::AlreadyLocked(held.server.clone())),
            None => Ok(()),
        }
    }

    fn ensure_held(&self, server: &str) -> RootCacheResult<()> {
        let held = self.held.as_ref().ok_or(RootCacheError::NotLocked)?;
        if held.server != server {
            return Err(RootCacheError::ServerMismatch {
                locked: held.server.clone(),
                requested: server.to_string(),
            });
        }
        Ok(())
    }

    fn held_for(&mut self, server: &str) -> RootCacheResult<&mut LockedFile> {
        self.ensure_held(server)?;
        let held = self.held.as_mut().ok_or(RootCacheError::NotLocked)?;
        Ok(&mut held.file)
    }

    fn read_content(&mut self, server: &str) -> RootCacheResult<Vec<u8>> {
        let file = self.held_for(server)?;
        let path = file.path().display().to_string();
        file.read_all()
            .map_err(|e| RootCacheError::io(format!("reading state file {}", path), e))
    }

    /// Replace the line for `entry.name` (or append it) and rewrite the file
    ///
    /// Lines that do not parse are copied through byte for byte.
    fn write_entry(&mut self, server: &str, entry: Entry) -> RootCacheResult<()> {
        let content = self.read_content(server)?;

        let mut output = Vec::with_capacity(content.len() + entry.value.len() + 1);
        let mut replaced = false;
        for line in lines(&content) {
            let matches = Entry::parse(line).is_some_and(|e| e.name == entry.name);
            if !matches {
                output.extend_from_slice(line);
                output.push(b'\n');
            } else if !replaced {
                output.extend_from_slice(&entry.render());
                output.push(b'\n');
                replaced = true;
            }
            // Later duplicates of the same database are dropped
        }
        if !replaced {
            output.extend_from_slice(&entry.render());
            output.push(b'\n');
        }

        let file = self.held_for(server)?;
        let path = file.path().display().to_string();
        file.replace(&output)
            .map_err(|e| RootCacheError::io(format!("writing state file {}", path), e))
    }
}

/// Non-empty raw lines of a state file
fn lines(content: &[u8]) -> impl Iterator<Item = &[u8]> {
    content.split(|&b| b == b'\n').filter(|l| !l.is_empty())
}

/// Check a server identity is usable as part of a file name
pub fn validate_server_identity(identity: &str) -> RootCacheResult<()> {
    let reason = if identity.is_empty() {
        "must not be empty"
    } else if identity.contains(['/', '\\']) {
        "must not contain path separators"
    } else if identity.contains('\0') {
        "must not contain NUL"
    } else {
        return Ok(());
    };

    Err(RootCacheError::InvalidServerIdentity {
        identity: identity.to_string(),
        reason: reason.to_string(),
    })
}
