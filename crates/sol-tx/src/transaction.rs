//! Signed transaction envelope.
//!
//! ```text
//! Transaction:
//!   num_signatures          shortvec
//!   signatures              64 bytes * num_signatures
//!   message                 (see `message`)
//! ```
//!
//! A transaction starts out `Building`: instructions, blockhash and fee payer
//! may still change. The first signature freezes it. The message is
//! serialized exactly once at that point and every later signature, and
//! every later `serialize`, uses those bytes verbatim. Re-deriving them could
//! reorder accounts and silently invalidate signatures already collected.

use base64::Engine;
use log::debug;

use crate::error::{Result, TxError};
use crate::instruction::Instruction;
use crate::keypair::Signer;
use crate::message::{CompiledMessage, Message};
use crate::pubkey::{Hash, Pubkey};
use crate::reader::ByteReader;
use crate::shortvec;
use crate::signature::{Signature, SIGNATURE_BYTES};

#[derive(Debug, Clone)]
enum MessageState {
    Building(Message),
    Frozen { message: Message, serialized: Vec<u8> },
}

#[derive(Debug, Clone)]
pub struct Transaction {
    state: MessageState,
    signatures: Vec<Signature>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    pub fn new() -> Self {
        Self::from_message(Message::new())
    }

    /// Wrap a message that is still being built.
    pub fn from_message(message: Message) -> Self {
        Self {
            state: MessageState::Building(message),
            signatures: Vec::new(),
        }
    }

    pub fn add_instruction(&mut self, instruction: Instruction) -> Result<&mut Self> {
        self.building_mut("add instruction")?
            .add_instruction(instruction);
        Ok(self)
    }

    pub fn set_recent_blockhash(&mut self, recent_blockhash: Hash) -> Result<&mut Self> {
        self.building_mut("set recent blockhash")?
            .set_recent_blockhash(recent_blockhash);
        Ok(self)
    }

    pub fn set_fee_payer(&mut self, fee_payer: Pubkey) -> Result<&mut Self> {
        self.building_mut("set fee payer")?.set_fee_payer(fee_payer);
        Ok(self)
    }

    /// Sign with every signer in order. The first signer pays the fee.
    ///
    /// On a transaction that is already frozen the fee payer is left as it
    /// was and the new signatures are appended over the frozen bytes.
    pub fn sign(&mut self, signers: &[&dyn Signer]) -> Result<()> {
        let fee_payer = signers
            .first()
            .ok_or_else(|| TxError::InvalidArgument("no signers".into()))?
            .pubkey();

        if let MessageState::Building(message) = &mut self.state {
            message.set_fee_payer(fee_payer);
        }

        self.sign_serialized_message(signers)
    }

    /// Append signatures over the frozen message bytes, freezing first if
    /// needed. Does not touch the fee payer.
    pub fn sign_serialized_message(&mut self, signers: &[&dyn Signer]) -> Result<()> {
        if signers.is_empty() {
            return Err(TxError::InvalidArgument("no signers".into()));
        }

        self.freeze()?;

        let MessageState::Frozen { serialized, .. } = &self.state else {
            return Err(TxError::InvalidState("message was not frozen".into()));
        };

        for signer in signers {
            self.signatures.push(signer.sign_message(serialized));
        }

        debug!(
            "signed transaction: {} new, {} total signatures",
            signers.len(),
            self.signatures.len()
        );

        Ok(())
    }

    /// Wire bytes: signature count, signatures, frozen message.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        if self.signatures.is_empty() {
            return Err(TxError::InvalidState("transaction has no signatures".into()));
        }
        let serialized = self
            .serialized_message()
            .ok_or_else(|| TxError::InvalidState("message was never serialized".into()))?;

        let mut out = Vec::with_capacity(3 + self.signatures.len() * SIGNATURE_BYTES + serialized.len());
        shortvec::encode_length_into(&mut out, self.signatures.len());
        for signature in &self.signatures {
            out.extend_from_slice(signature.as_ref());
        }
        out.extend_from_slice(serialized);

        Ok(out)
    }

    /// [`Transaction::serialize`] as standard base64, the RPC submission
    /// encoding.
    pub fn to_base64(&self) -> Result<String> {
        Ok(base64::engine::general_purpose::STANDARD.encode(self.serialize()?))
    }

    /// Parse wire bytes. The message bytes are kept as-is so the result
    /// re-serializes byte for byte; the transaction comes back frozen.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);

        let num_signatures = shortvec::decode_length(&mut reader)?;
        let mut signatures =
            Vec::with_capacity(num_signatures.min(reader.remaining() / SIGNATURE_BYTES));
        for _ in 0..num_signatures {
            signatures.push(Signature::new_from_array(
                reader.read_array::<SIGNATURE_BYTES>()?,
            ));
        }

        let serialized = reader.read_remaining().to_vec();
        let message = Message::parse(&serialized)?;

        debug!(
            "parsed transaction: {} signatures, {} message bytes",
            signatures.len(),
            serialized.len()
        );

        Ok(Self {
            state: MessageState::Frozen {
                message,
                serialized,
            },
            signatures,
        })
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| TxError::MalformedInput(format!("base64 decode failed: {e}")))?;
        Self::deserialize(&bytes)
    }

    /// Check every signature against the signer key in the same slot of the
    /// frozen message. Returns `false` on any mismatch, including a signature
    /// count that differs from the header.
    pub fn verify_signatures(&self) -> Result<bool> {
        let serialized = self
            .serialized_message()
            .ok_or_else(|| TxError::InvalidState("message was never serialized".into()))?;
        let compiled = CompiledMessage::deserialize(&mut ByteReader::new(serialized))?;
        let signers =
            &compiled.account_keys[..usize::from(compiled.header.num_required_signatures)];

        if signers.len() != self.signatures.len() {
            return Ok(false);
        }

        Ok(self
            .signatures
            .iter()
            .zip(signers)
            .all(|(signature, key)| signature.verify(key, serialized)))
    }

    pub fn message(&self) -> &Message {
        match &self.state {
            MessageState::Building(message) | MessageState::Frozen { message, .. } => message,
        }
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// The frozen message bytes, once the transaction has been signed or
    /// parsed.
    pub fn serialized_message(&self) -> Option<&[u8]> {
        match &self.state {
            MessageState::Building(_) => None,
            MessageState::Frozen { serialized, .. } => Some(serialized),
        }
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self.state, MessageState::Frozen { .. })
    }

    pub fn fee_payer(&self) -> Option<&Pubkey> {
        self.message().fee_payer()
    }

    pub fn recent_blockhash(&self) -> Option<&Hash> {
        self.message().recent_blockhash()
    }

    pub fn instruction(&self, index: usize) -> Option<&Instruction> {
        self.message().instruction(index)
    }

    pub fn instruction_count(&self) -> usize {
        self.message().instruction_count()
    }

    fn building_mut(&mut self, op: &str) -> Result<&mut Message> {
        match &mut self.state {
            MessageState::Building(message) => Ok(message),
            MessageState::Frozen { .. } => Err(TxError::InvalidState(format!(
                "cannot {op}: message is frozen"
            ))),
        }
    }

    fn freeze(&mut self) -> Result<()> {
        if let MessageState::Building(message) = &mut self.state {
            let serialized = message.serialize()?;
            let message = std::mem::take(message);
            debug!("froze message: {} bytes", serialized.len());
            self.state = MessageState::Frozen {
                message,
                serialized,
            };
        }
        Ok(())
    }
}
