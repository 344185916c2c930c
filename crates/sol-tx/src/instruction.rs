//! Program invocations, before and after compilation.
//!
//! ```text
//! CompiledInstruction:
//!   program_id_index        u8
//!   num_accounts            shortvec
//!   account_indices         u8 * num_accounts
//!   data_len                shortvec
//!   data                    u8 * data_len
//! ```

use serde::{Deserialize, Serialize};

use crate::account_meta::AccountMeta;
use crate::error::Result;
use crate::pubkey::Pubkey;
use crate::reader::ByteReader;
use crate::shortvec;

/// A program invocation: which program, which accounts, what payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

impl Instruction {
    pub fn new(program_id: Pubkey, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Self {
        Self {
            program_id,
            accounts,
            data,
        }
    }
}

/// An instruction whose keys have been replaced by indices into the
/// message's account table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

impl CompiledInstruction {
    /// Number of bytes this instruction occupies on the wire.
    pub fn serialized_len(&self) -> usize {
        1 + shortvec::encode_length(self.accounts.len()).len()
            + self.accounts.len()
            + shortvec::encode_length(self.data.len()).len()
            + self.data.len()
    }

    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.program_id_index);

        shortvec::encode_length_into(buf, self.accounts.len());
        buf.extend_from_slice(&self.accounts);

        shortvec::encode_length_into(buf, self.data.len());
        buf.extend_from_slice(&self.data);
    }

    pub fn deserialize(reader: &mut ByteReader<'_>) -> Result<Self> {
        let program_id_index = reader.read_u8()?;

        let num_accounts = shortvec::decode_length(reader)?;
        let accounts = reader.read_bytes(num_accounts)?.to_vec();

        let data_len = shortvec::decode_length(reader)?;
        let data = reader.read_bytes(data_len)?.to_vec();

        Ok(Self {
            program_id_index,
            accounts,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TxError;

    #[test]
    fn wire_layout() {
        let ix = CompiledInstruction {
            program_id_index: 2,
            accounts: vec![0, 1],
            data: vec![0xde, 0xad],
        };
        let mut buf = Vec::new();
        ix.serialize_into(&mut buf);
        assert_eq!(buf, vec![2, 2, 0, 1, 2, 0xde, 0xad]);
        assert_eq!(ix.serialized_len(), buf.len());
    }

    #[test]
    fn deserialize_reads_exactly_one_instruction() {
        let bytes = [1u8, 1, 0, 3, b'a', b'b', b'c', 0xff];
        let mut reader = ByteReader::new(&bytes);
        let ix = CompiledInstruction::deserialize(&mut reader).unwrap();

        assert_eq!(ix.program_id_index, 1);
        assert_eq!(ix.accounts, vec![0]);
        assert_eq!(ix.data, b"abc".to_vec());
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn empty_accounts_and_data() {
        let ix = CompiledInstruction {
            program_id_index: 0,
            accounts: vec![],
            data: vec![],
        };
        let mut buf = Vec::new();
        ix.serialize_into(&mut buf);
        assert_eq!(buf, vec![0, 0, 0]);

        let parsed = CompiledInstruction::deserialize(&mut ByteReader::new(&buf)).unwrap();
        assert_eq!(parsed, ix);
    }

    #[test]
    fn long_data_uses_two_byte_prefix() {
        let ix = CompiledInstruction {
            program_id_index: 0,
            accounts: vec![],
            data: vec![7u8; 200],
        };
        let mut buf = Vec::new();
        ix.serialize_into(&mut buf);
        assert_eq!(&buf[2..4], &[0xc8, 0x01]);
        assert_eq!(buf.len(), 1 + 1 + 2 + 200);
    }

    #[test]
    fn truncated_data_fails() {
        let bytes = [0u8, 0, 5, 1, 2];
        let err = CompiledInstruction::deserialize(&mut ByteReader::new(&bytes)).unwrap_err();
        assert!(matches!(err, TxError::MalformedInput(_)));
    }
}
