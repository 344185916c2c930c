//! One-shot construction of a signed transaction.

use crate::error::{Result, TxError};
use crate::instruction::Instruction;
use crate::keypair::Signer;
use crate::pubkey::Hash;
use crate::transaction::Transaction;

/// Collects instructions, a blockhash and signers, then builds and signs a
/// [`Transaction`] in one go.
#[derive(Default)]
pub struct TransactionBuilder<'a> {
    instructions: Vec<Instruction>,
    recent_blockhash: Option<Hash>,
    signers: Vec<&'a dyn Signer>,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_instruction(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    pub fn add_instructions(mut self, instructions: impl IntoIterator<Item = Instruction>) -> Self {
        self.instructions.extend(instructions);
        self
    }

    pub fn set_recent_blockhash(mut self, recent_blockhash: Hash) -> Self {
        self.recent_blockhash = Some(recent_blockhash);
        self
    }

    /// The first signer becomes the fee payer.
    pub fn set_signers(mut self, signers: &[&'a dyn Signer]) -> Self {
        self.signers = signers.to_vec();
        self
    }

    pub fn build(self) -> Result<Transaction> {
        if self.signers.is_empty() {
            return Err(TxError::InvalidArgument("no signers".into()));
        }

        let mut tx = Transaction::new();
        for instruction in self.instructions {
            tx.add_instruction(instruction)?;
        }
        if let Some(recent_blockhash) = self.recent_blockhash {
            tx.set_recent_blockhash(recent_blockhash)?;
        }
        tx.sign(&self.signers)?;

        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::Keypair;
    use crate::programs::memo_program;

    const SECRET: &str =
        "4Z7cXSyeFR8wNGMVXUE1TwtKn5D5Vu7FzEv69dokLv7KrQk7h6pu4LF8ZRR9yQBhc7uSM6RTTZtU1fmaxiNrxXrs";
    const BLOCKHASH: &str = "Eit7RCyhUixAe2hGBS8oqnw59QK3kgMMjfLME5bm9wRn";
    const MEMO_TX: &str = "AV6w4Af9PSHhNsTSal4vlPF7Su9QXgCVyfDChHImJITLcS5BlNotKFeMoGw87VwjS3eNA2JCL+MEoReynCNbWAoBAAECBhrZ0FOHFUhTft4+JhhJo9+3/QL6vHWyI8jkatuFPQwFSlNQ+F3IgtYUpVZyeIopbd8eq6vQpgZ4iEky9O72oMviiMGZlPAy5mIJT92z865aQ2ipBrulSCScEzmEJkX1AQEBAAlUZXN0IG1lbW8=";

    #[test]
    fn memo_transaction_matches_golden() {
        let signer = Keypair::from_base58_string(SECRET).unwrap();

        let tx = TransactionBuilder::new()
            .add_instruction(memo_program::write_utf8(&signer.pubkey(), "Test memo"))
            .set_recent_blockhash(BLOCKHASH.parse().unwrap())
            .set_signers(&[&signer])
            .build()
            .unwrap();

        assert_eq!(tx.to_base64().unwrap(), MEMO_TX);
    }

    #[test]
    fn build_without_signers_fails() {
        let err = TransactionBuilder::new()
            .add_instruction(memo_program::write_utf8(&Default::default(), "x"))
            .set_recent_blockhash(Hash::default())
            .build()
            .unwrap_err();
        assert!(matches!(err, TxError::InvalidArgument(_)));
    }

    #[test]
    fn build_without_blockhash_fails() {
        let signer = Keypair::from_seed(&[1u8; 32]);
        let err = TransactionBuilder::new()
            .add_instruction(memo_program::write_utf8(&signer.pubkey(), "x"))
            .set_signers(&[&signer])
            .build()
            .unwrap_err();
        assert!(matches!(err, TxError::InvalidState(_)));
    }

    #[test]
    fn add_instructions_keeps_order() {
        let signer = Keypair::from_seed(&[2u8; 32]);
        let tx = TransactionBuilder::new()
            .add_instructions(["one", "two", "three"].map(|m| memo_program::write_utf8(&signer.pubkey(), m)))
            .set_recent_blockhash(Hash::default())
            .set_signers(&[&signer])
            .build()
            .unwrap();

        assert_eq!(tx.instruction_count(), 3);
        assert_eq!(tx.instruction(2).unwrap().data, b"three".to_vec());
    }
}
