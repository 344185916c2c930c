//! Ed25519 key pairs and the signing seam used by [`Transaction`].
//!
//! [`Transaction`]: crate::transaction::Transaction

use ed25519_dalek::Signer as _;
use zeroize::{Zeroize, Zeroizing};

use crate::error::TxError;
use crate::pubkey::Pubkey;
use crate::signature::Signature;

/// Anything that can produce a detached signature for a public key.
pub trait Signer {
    fn pubkey(&self) -> Pubkey;

    fn sign_message(&self, message: &[u8]) -> Signature;
}

/// An Ed25519 key pair. The secret half is zeroed on drop by `ed25519-dalek`.
pub struct Keypair(ed25519_dalek::SigningKey);

impl Keypair {
    /// Build a key pair from its 32-byte secret seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let mut seed = *seed;
        let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed);
        seed.zeroize();
        Self(signing_key)
    }

    /// Build a key pair from the 64-byte `seed || pubkey` layout used by
    /// wallet key files. The public half must match the seed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        let mut arr: [u8; 64] = bytes.try_into().map_err(|_| {
            TxError::InvalidPrivateKey(format!("expected 64 bytes, got {}", bytes.len()))
        })?;
        let result = ed25519_dalek::SigningKey::from_keypair_bytes(&arr)
            .map_err(|e| TxError::InvalidPrivateKey(format!("key pair mismatch: {e}")));
        arr.zeroize();
        result.map(Self)
    }

    /// Decode a Base58 `seed || pubkey` string.
    pub fn from_base58_string(s: &str) -> Result<Self, TxError> {
        let bytes = Zeroizing::new(
            bs58::decode(s)
                .into_vec()
                .map_err(|e| TxError::InvalidPrivateKey(format!("base58 decode failed: {e}")))?,
        );
        Self::from_bytes(&bytes)
    }

    pub fn pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.0.verifying_key().to_bytes())
    }
}

impl From<ed25519_dalek::SigningKey> for Keypair {
    fn from(signing_key: ed25519_dalek::SigningKey) -> Self {
        Self(signing_key)
    }
}

impl Signer for Keypair {
    fn pubkey(&self) -> Pubkey {
        Keypair::pubkey(self)
    }

    fn sign_message(&self, message: &[u8]) -> Signature {
        Signature::from(self.0.sign(message))
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Keypair({})", self.pubkey())
    }
}
