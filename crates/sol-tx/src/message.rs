//! Legacy message compilation and parsing.
//!
//! ```text
//! Message:
//!   num_required_sigs     u8
//!   num_readonly_signed   u8
//!   num_readonly_unsigned u8
//!   num_accounts          shortvec
//!   account_keys          32 bytes * num_accounts
//!   recent_blockhash      32 bytes
//!   num_instructions      shortvec
//!   instructions[]        (see `instruction`)
//! ```
//!
//! Signer and writable flags are not stored per key. They follow from the
//! key's position in the table relative to the three header counts.

use std::collections::HashMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::account_meta::{index_of, AccountKeys, AccountMeta};
use crate::error::{Result, TxError};
use crate::instruction::{CompiledInstruction, Instruction};
use crate::pubkey::{Hash, Pubkey, HASH_BYTES, PUBKEY_BYTES};
use crate::reader::ByteReader;
use crate::shortvec;

/// Size of the message header in bytes.
pub const MESSAGE_HEADER_LENGTH: usize = 3;

/// Account indices are single bytes, so a table holds at most 256 keys.
pub const MAX_ACCOUNT_KEYS: usize = 256;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    /// The first `num_required_signatures` keys are signers.
    pub num_required_signatures: u8,
    /// Trailing read-only keys among the signers.
    pub num_readonly_signed_accounts: u8,
    /// Trailing read-only keys among the non-signers.
    pub num_readonly_unsigned_accounts: u8,
}

impl MessageHeader {
    /// Derive the header from an already ordered key table in one pass.
    pub fn from_account_table(table: &[AccountMeta]) -> Result<Self> {
        let mut signers = 0usize;
        let mut readonly_signed = 0usize;
        let mut readonly_unsigned = 0usize;

        for meta in table {
            if meta.is_signer {
                signers += 1;
                if !meta.is_writable {
                    readonly_signed += 1;
                }
            } else if !meta.is_writable {
                readonly_unsigned += 1;
            }
        }

        Ok(Self {
            num_required_signatures: count_to_u8(signers, "required signatures")?,
            num_readonly_signed_accounts: count_to_u8(readonly_signed, "read-only signed accounts")?,
            num_readonly_unsigned_accounts: count_to_u8(
                readonly_unsigned,
                "read-only unsigned accounts",
            )?,
        })
    }

    pub fn to_bytes(self) -> [u8; MESSAGE_HEADER_LENGTH] {
        [
            self.num_required_signatures,
            self.num_readonly_signed_accounts,
            self.num_readonly_unsigned_accounts,
        ]
    }
}

/// The index-based wire form of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledMessage {
    pub header: MessageHeader,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: Hash,
    pub instructions: Vec<CompiledInstruction>,
}

impl CompiledMessage {
    pub fn is_signer(&self, index: usize) -> bool {
        index < usize::from(self.header.num_required_signatures)
    }

    pub fn is_writable(&self, index: usize) -> bool {
        let required = usize::from(self.header.num_required_signatures);
        let readonly_signed = usize::from(self.header.num_readonly_signed_accounts);
        let readonly_unsigned = usize::from(self.header.num_readonly_unsigned_accounts);

        if index < required {
            index < required.saturating_sub(readonly_signed)
        } else {
            index < self.account_keys.len().saturating_sub(readonly_unsigned)
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let instructions_len: usize = self
            .instructions
            .iter()
            .map(CompiledInstruction::serialized_len)
            .sum();
        let mut buf = Vec::with_capacity(
            MESSAGE_HEADER_LENGTH
                + 3
                + self.account_keys.len() * PUBKEY_BYTES
                + HASH_BYTES
                + 3
                + instructions_len,
        );

        buf.extend_from_slice(&self.header.to_bytes());

        shortvec::encode_length_into(&mut buf, self.account_keys.len());
        for key in &self.account_keys {
            buf.extend_from_slice(key.as_ref());
        }

        buf.extend_from_slice(self.recent_blockhash.as_ref());

        shortvec::encode_length_into(&mut buf, self.instructions.len());
        for ix in &self.instructions {
            ix.serialize_into(&mut buf);
        }

        buf
    }

    /// Read one message from `reader`. Bytes after the last instruction are
    /// left in the reader.
    pub fn deserialize(reader: &mut ByteReader<'_>) -> Result<Self> {
        let [num_required_signatures, num_readonly_signed_accounts, num_readonly_unsigned_accounts] =
            reader.read_array::<MESSAGE_HEADER_LENGTH>()?;
        let header = MessageHeader {
            num_required_signatures,
            num_readonly_signed_accounts,
            num_readonly_unsigned_accounts,
        };

        let num_accounts = shortvec::decode_length(reader)?;
        // Cap the allocation by what the input can actually hold.
        let mut account_keys = Vec::with_capacity(num_accounts.min(reader.remaining() / PUBKEY_BYTES));
        for _ in 0..num_accounts {
            account_keys.push(Pubkey::new_from_array(reader.read_array::<PUBKEY_BYTES>()?));
        }

        let recent_blockhash = Hash::new_from_array(reader.read_array::<HASH_BYTES>()?);

        let num_instructions = shortvec::decode_length(reader)?;
        let mut instructions = Vec::with_capacity(num_instructions.min(reader.remaining()));
        for _ in 0..num_instructions {
            instructions.push(CompiledInstruction::deserialize(reader)?);
        }

        let message = Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        };
        message.sanitize()?;
        Ok(message)
    }

    /// Check that the header counts fit the key table and that every index
    /// points into it.
    pub fn sanitize(&self) -> Result<()> {
        let num_keys = self.account_keys.len();
        let required = usize::from(self.header.num_required_signatures);
        let readonly_signed = usize::from(self.header.num_readonly_signed_accounts);
        let readonly_unsigned = usize::from(self.header.num_readonly_unsigned_accounts);

        if required > num_keys {
            return Err(TxError::MalformedInput(format!(
                "header requires {required} signatures but only {num_keys} keys present"
            )));
        }
        if readonly_signed > required {
            return Err(TxError::MalformedInput(format!(
                "{readonly_signed} read-only signed accounts exceed {required} signers"
            )));
        }
        if readonly_unsigned > num_keys - required {
            return Err(TxError::MalformedInput(format!(
                "{readonly_unsigned} read-only unsigned accounts exceed {} non-signers",
                num_keys - required
            )));
        }

        for (i, ix) in self.instructions.iter().enumerate() {
            let out_of_range = std::iter::once(&ix.program_id_index)
                .chain(ix.accounts.iter())
                .find(|&&idx| usize::from(idx) >= num_keys);
            if let Some(idx) = out_of_range {
                return Err(TxError::MalformedInput(format!(
                    "instruction {i} references account index {idx}, table has {num_keys} keys"
                )));
            }
        }

        Ok(())
    }
}

/// A message under construction, or one recovered from wire bytes.
///
/// The account table is never stored in final form: [`Message::account_keys`]
/// and [`Message::compile`] rebuild it from the instructions and fee payer on
/// every call, so indices from an earlier call are not stable across
/// [`Message::add_instruction`].
#[derive(Debug, Clone, Default)]
pub struct Message {
    instructions: Vec<Instruction>,
    accounts: AccountKeys,
    recent_blockhash: Option<Hash>,
    fee_payer: Option<Pubkey>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction and fold its accounts and program id into the
    /// pending account set.
    pub fn add_instruction(&mut self, instruction: Instruction) -> &mut Self {
        self.accounts.add_all(&instruction.accounts);
        self.accounts
            .add(AccountMeta::new_readonly(instruction.program_id, false));
        self.instructions.push(instruction);
        self
    }

    pub fn set_recent_blockhash(&mut self, recent_blockhash: Hash) -> &mut Self {
        self.recent_blockhash = Some(recent_blockhash);
        self
    }

    pub fn set_fee_payer(&mut self, fee_payer: Pubkey) -> &mut Self {
        self.fee_payer = Some(fee_payer);
        self
    }

    pub fn recent_blockhash(&self) -> Option<&Hash> {
        self.recent_blockhash.as_ref()
    }

    pub fn fee_payer(&self) -> Option<&Pubkey> {
        self.fee_payer.as_ref()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn instruction(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Merged account references in first-seen order, before fee payer
    /// promotion and ordering.
    pub fn account_set(&self) -> &AccountKeys {
        &self.accounts
    }

    /// The canonical account table: fee payer first, then signers before
    /// non-signers, writable before read-only.
    pub fn account_keys(&self) -> Result<Vec<AccountMeta>> {
        let fee_payer = self
            .fee_payer
            .ok_or_else(|| TxError::InvalidState("fee payer required".into()))?;
        Ok(self.accounts.ordered(&fee_payer))
    }

    pub fn compile(&self) -> Result<CompiledMessage> {
        let recent_blockhash = self
            .recent_blockhash
            .ok_or_else(|| TxError::InvalidState("recent blockhash required".into()))?;

        if self.instructions.is_empty() {
            return Err(TxError::InvalidState("no instructions provided".into()));
        }

        let table = self.account_keys()?;
        if table.len() > MAX_ACCOUNT_KEYS {
            return Err(TxError::InvalidState(format!(
                "{} accounts exceed the {MAX_ACCOUNT_KEYS}-key limit",
                table.len()
            )));
        }

        let header = MessageHeader::from_account_table(&table)?;

        let mut instructions = Vec::with_capacity(self.instructions.len());
        for ix in &self.instructions {
            let program_id_index = table_index(&table, &ix.program_id)?;
            let accounts = ix
                .accounts
                .iter()
                .map(|meta| table_index(&table, &meta.pubkey))
                .collect::<Result<Vec<u8>>>()?;
            trace!(
                "compiled instruction: program {} at {program_id_index}, accounts {accounts:?}",
                ix.program_id
            );
            instructions.push(CompiledInstruction {
                program_id_index,
                accounts,
                data: ix.data.clone(),
            });
        }

        debug!(
            "compiled message: {} accounts, {} instructions, header {:?}",
            table.len(),
            instructions.len(),
            header
        );

        Ok(CompiledMessage {
            header,
            account_keys: table.into_iter().map(|meta| meta.pubkey).collect(),
            recent_blockhash,
            instructions,
        })
    }

    /// The bytes that get signed.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(self.compile()?.serialize())
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let message = Self::deserialize(&mut reader)?;
        if !reader.is_empty() {
            debug!(
                "ignoring {} trailing bytes after message",
                reader.remaining()
            );
        }
        Ok(message)
    }

    pub fn deserialize(reader: &mut ByteReader<'_>) -> Result<Self> {
        let compiled = CompiledMessage::deserialize(reader)?;
        Self::from_compiled(&compiled)
    }

    /// Rebuild a message from its wire form.
    ///
    /// Each instruction's account flags come from the key's position in the
    /// table. The pending account set then marks a key signer or writable if
    /// any instruction uses it that way; keys only used as program ids, or
    /// not used at all, come back as read-only non-signers.
    pub fn from_compiled(compiled: &CompiledMessage) -> Result<Self> {
        compiled.sanitize()?;
        let keys = &compiled.account_keys;

        let instructions: Vec<Instruction> = compiled
            .instructions
            .iter()
            .map(|cix| {
                let accounts = cix
                    .accounts
                    .iter()
                    .map(|&idx| {
                        let idx = usize::from(idx);
                        AccountMeta {
                            pubkey: keys[idx],
                            is_signer: compiled.is_signer(idx),
                            is_writable: compiled.is_writable(idx),
                        }
                    })
                    .collect();
                Instruction::new(
                    keys[usize::from(cix.program_id_index)],
                    accounts,
                    cix.data.clone(),
                )
            })
            .collect();

        let mut usage: HashMap<Pubkey, (bool, bool)> = HashMap::new();
        for meta in instructions.iter().flat_map(|ix| ix.accounts.iter()) {
            let flags = usage.entry(meta.pubkey).or_default();
            flags.0 |= meta.is_signer;
            flags.1 |= meta.is_writable;
        }

        let accounts: AccountKeys = keys
            .iter()
            .map(|key| {
                let (is_signer, is_writable) = usage.get(key).copied().unwrap_or_default();
                AccountMeta {
                    pubkey: *key,
                    is_signer,
                    is_writable,
                }
            })
            .collect();

        debug!(
            "parsed message: {} accounts, {} instructions",
            keys.len(),
            instructions.len()
        );

        Ok(Self {
            instructions,
            accounts,
            recent_blockhash: Some(compiled.recent_blockhash),
            fee_payer: keys.first().copied(),
        })
    }
}

fn table_index(table: &[AccountMeta], pubkey: &Pubkey) -> Result<u8> {
    let idx = index_of(table, pubkey)?;
    u8::try_from(idx).map_err(|_| {
        TxError::InvalidState(format!("account index {idx} does not fit in a byte"))
    })
}

fn count_to_u8(count: usize, what: &str) -> Result<u8> {
    u8::try_from(count)
        .map_err(|_| TxError::InvalidState(format!("too many {what}: {count}")))
}
