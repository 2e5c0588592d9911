//! Core type definitions for the VTR ledger

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Token quantity in base units (9 fractional digits)
pub type Amount = u64;

/// Unix timestamp in seconds, always supplied by the caller
pub type Timestamp = i64;

/// AccountId - opaque 256-bit identity of a holder, recipient or staker
///
/// The engine trusts that the transport layer has authenticated the caller
/// as this identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccountId {
    id: [u8; 32],
}

impl AccountId {
    /// Create an AccountId from raw bytes
    pub const fn new(id: [u8; 32]) -> Self {
        Self { id }
    }

    /// Derive an engine-owned account from a seed and a base identity.
    ///
    /// AccountId = BLAKE3(seed || base)
    pub fn derive(seed: &[u8], base: &AccountId) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(seed);
        hasher.update(&base.id);
        Self {
            id: *hasher.finalize().as_bytes(),
        }
    }

    /// Identity derived from an arbitrary label (test fixtures, simulations)
    pub fn from_label(label: &str) -> Self {
        Self {
            id: *blake3::hash(label.as_bytes()).as_bytes(),
        }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.id
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.id)
    }

    /// Parse from a 64-character hex string
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut id = [0u8; 32];
        hex::decode_to_slice(s, &mut id)?;
        Ok(Self { id })
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..12])
    }
}

impl FromStr for AccountId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// Serialized as full hex so configuration files stay readable
impl Serialize for AccountId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Seeds for accounts owned by the engine itself
pub mod seeds {
    /// Staking vault holding staked principal
    pub const STAKING_VAULT: &[u8] = b"staking_vault";
}
