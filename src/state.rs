//! Ledger root state and the serializer seam used by the cache
//!
//! The cache never looks inside a state. It hands the value to a
//! [`StateCodec`] and stores whatever bytes come back, so the record's
//! schema can evolve without touching the on-disk line format.

use crate::error::{CodecError, RootCacheError, RootCacheResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::marker::PhantomData;

/// Turns a state into bytes and back
pub trait StateCodec {
    /// The record this codec handles
    type State;

    /// Serialize a state
    fn encode(&self, state: &Self::State) -> Result<Vec<u8>, CodecError>;

    /// Deserialize a state previously produced by [`StateCodec::encode`]
    fn decode(&self, bytes: &[u8]) -> Result<Self::State, CodecError>;
}

/// serde_json codec for any serde type
pub struct JsonCodec<S> {
    _state: PhantomData<fn() -> S>,
}

impl<S> JsonCodec<S> {
    pub fn new() -> Self {
        Self {
            _state: PhantomData,
        }
    }
}

impl<S> Default for JsonCodec<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for JsonCodec<S> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for JsonCodec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<S> StateCodec for JsonCodec<S>
where
    S: Serialize + DeserializeOwned,
{
    type State = S;

    fn encode(&self, state: &S) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(state)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<S, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Verified root of a ledger database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootState {
    /// Database the root belongs to
    pub database: String,

    /// Monotonic transaction counter
    pub tx_id: u64,

    /// Digest of the ledger up to `tx_id`
    #[serde(with = "hex")]
    pub tx_hash: Vec<u8>,

    /// When the client recorded this root
    pub recorded_at: DateTime<Utc>,
}

impl RootState {
    /// Create a new root state stamped with the current time
    pub fn new(database: impl Into<String>, tx_id: u64, tx_hash: Vec<u8>) -> Self {
        Self {
            database: database.into(),
            tx_id,
            tx_hash,
            recorded_at: Utc::now(),
        }
    }

    /// Parse a hex digest as accepted on the command line
    pub fn parse_digest(value: &str) -> RootCacheResult<Vec<u8>> {
        hex::decode(value.trim()).map_err(|e| RootCacheError::InvalidDigest {
            value: value.to_string(),
            reason: e.to_string(),
        })
    }

    /// Short SHA-256 fingerprint of (tx_id, tx_hash), first 12 hex chars
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.tx_id.to_be_bytes());
        hasher.update(&self.tx_hash);
        let result = hasher.finalize();
        hex::encode(&result[..6])
    }

    /// Check that `next` does not roll this state back
    ///
    /// A lower tx counter, or the same counter with a different digest,
    /// is a rollback. Proof verification of the new state is out of scope.
    pub fn check_successor(&self, next: &RootState) -> RootCacheResult<()> {
        let rolled_back = next.tx_id < self.tx_id
            || (next.tx_id == self.tx_id && next.tx_hash != self.tx_hash);

        if rolled_back {
            return Err(RootCacheError::Rollback {
                database: self.database.clone(),
                cached_tx: self.tx_id,
                offered_tx: next.tx_id,
            });
        }
        Ok(())
    }
}

impl fmt::Display for RootState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tx={} hash={}",
            self.database,
            self.tx_id,
            hex::encode(&self.tx_hash)
        )
    }
}
