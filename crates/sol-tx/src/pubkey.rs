//! Public keys and blockhashes.
//!
//! Both are raw 32-byte values whose text form is plain Base58 (no checksum,
//! no hashing step). The all-zero key encodes to
//! `11111111111111111111111111111111`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TxError;

/// Length of a public key in bytes.
pub const PUBKEY_BYTES: usize = 32;

/// Length of a blockhash in bytes.
pub const HASH_BYTES: usize = 32;

/// Longest Base58 string a 32-byte value can encode to.
const MAX_BASE58_LEN: usize = 44;

/// A 32-byte Ed25519 public key identifying an account or program.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pubkey([u8; PUBKEY_BYTES]);

impl Pubkey {
    pub const fn new_from_array(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; PUBKEY_BYTES] {
        self.0
    }

    pub fn as_array(&self) -> &[u8; PUBKEY_BYTES] {
        &self.0
    }
}

impl AsRef<[u8]> for Pubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; PUBKEY_BYTES]> for Pubkey {
    fn from(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Pubkey {
    type Error = TxError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; PUBKEY_BYTES] = bytes.try_into().map_err(|_| {
            TxError::InvalidPublicKey(format!(
                "expected {PUBKEY_BYTES} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

impl FromStr for Pubkey {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_base58_32(s)
            .map(Self)
            .map_err(TxError::InvalidPublicKey)
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({self})")
    }
}

impl Serialize for Pubkey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Pubkey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A recent blockhash, used by the network for replay protection.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Hash([u8; HASH_BYTES]);

impl Hash {
    pub const fn new_from_array(bytes: [u8; HASH_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; HASH_BYTES] {
        self.0
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Hash {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_base58_32(s).map(Self).map_err(TxError::InvalidHash)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({self})")
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn decode_base58_32(s: &str) -> Result<[u8; 32], String> {
    if s.len() > MAX_BASE58_LEN {
        return Err(format!("string too long: {} chars", s.len()));
    }

    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|e| format!("base58 decode failed: {e}"))?;

    bytes
        .try_into()
        .map_err(|v: Vec<u8>| format!("expected 32 bytes, got {}", v.len()))
}
