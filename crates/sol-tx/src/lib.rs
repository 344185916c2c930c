//! Solana legacy message and transaction compiler.
//!
//! Turns a list of instructions (program id + account references + opaque
//! data) into the exact byte layout validators expect, signs it, and parses
//! it back. The signature covers the message bytes, so account ordering,
//! shortvec prefixes and header counts must match the network bit for bit.
//!
//! Base58 and base64 come from `bs58` and `base64`; Ed25519 signing from
//! `ed25519-dalek`. There is no RPC client here: callers submit the output
//! of [`Transaction::to_base64`] themselves.

pub mod account_meta;
pub mod builder;
pub mod error;
pub mod instruction;
pub mod keypair;
pub mod message;
pub mod programs;
pub mod pubkey;
pub mod reader;
pub mod shortvec;
pub mod signature;
pub mod transaction;

pub use account_meta::{AccountKeys, AccountMeta};
pub use builder::TransactionBuilder;
pub use error::{Result, TxError};
pub use instruction::{CompiledInstruction, Instruction};
pub use keypair::{Keypair, Signer};
pub use message::{CompiledMessage, Message, MessageHeader};
pub use pubkey::{Hash, Pubkey};
pub use reader::ByteReader;
pub use signature::Signature;
pub use transaction::Transaction;
