//! Line codec for state file entries
//!
//! Each line is `<database>:<base64(state bytes)>`. The name is everything
//! before the first `:`, so lookups compare whole names and `a` never
//! matches a line for `ab`.

use crate::error::{RootCacheError, RootCacheResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;

/// Separator between database name and encoded value
pub const DELIMITER: char = ':';

/// One parsed line of a state file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Database name
    pub name: String,
    /// Raw base64 payload, empty for a tombstone
    pub value: Vec<u8>,
}

/// Health of a stored entry as seen without decoding the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Holds a decodable payload
    Present,
    /// Explicitly marked as having no trustworthy previous state
    Tombstone,
    /// Payload is not valid base64
    Corrupted,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Present => "present",
            Self::Tombstone => "tombstone",
            Self::Corrupted => "corrupted",
        };
        write!(f, "{}", name)
    }
}

impl Entry {
    /// Build an entry holding `bytes`
    pub fn encode(name: &str, bytes: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            value: STANDARD.encode(bytes).into_bytes(),
        }
    }

    /// Build a tombstone entry
    pub fn tombstone(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: Vec::new(),
        }
    }

    /// Split a raw line on its first delimiter
    ///
    /// `None` if there is no delimiter or the name is not UTF-8. The value
    /// is kept as bytes so a garbled payload only affects its own entry.
    pub fn parse(line: &[u8]) -> Option<Self> {
        let pos = line.iter().position(|&b| b == DELIMITER as u8)?;
        let name = std::str::from_utf8(&line[..pos]).ok()?;
        let value = line[pos + 1..].strip_suffix(b"\r").unwrap_or(&line[pos + 1..]);
        Some(Self {
            name: name.to_string(),
            value: value.to_vec(),
        })
    }

    /// Render as a file line, without the trailing newline
    pub fn render(&self) -> Vec<u8> {
        let mut line = Vec::with_capacity(self.name.len() + 1 + self.value.len());
        line.extend_from_slice(self.name.as_bytes());
        line.push(DELIMITER as u8);
        line.extend_from_slice(&self.value);
        line
    }

    pub fn is_tombstone(&self) -> bool {
        self.value.is_empty()
    }

    /// Decode the payload
    ///
    /// Tombstones yield `PreviousStateNotFound`, bad base64 yields
    /// `LocalStateCorrupted`.
    pub fn decode(&self) -> RootCacheResult<Vec<u8>> {
        if self.is_tombstone() {
            return Err(RootCacheError::PreviousStateNotFound {
                database: self.name.clone(),
            });
        }
        STANDARD
            .decode(&self.value)
            .map_err(|e| RootCacheError::corrupted(&self.name, e.to_string()))
    }

    pub fn status(&self) -> EntryStatus {
        if self.is_tombstone() {
            EntryStatus::Tombstone
        } else if STANDARD.decode(&self.value).is_ok() {
            EntryStatus::Present
        } else {
            EntryStatus::Corrupted
        }
    }
}

/// Check a database name can be stored without ambiguity
pub fn validate_database_name(name: &str) -> RootCacheResult<()> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name.contains(DELIMITER) {
        "must not contain ':'"
    } else if name.contains(['\n', '\r']) {
        "must not contain line breaks"
    } else {
        return Ok(());
    };

    Err(RootCacheError::InvalidDatabaseName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}
