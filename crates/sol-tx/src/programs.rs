//! Instruction builders for the handful of native programs a client needs
//! to move funds and attach notes.

pub mod system_program {
    use crate::account_meta::AccountMeta;
    use crate::instruction::Instruction;
    use crate::pubkey::Pubkey;

    /// `11111111111111111111111111111111`
    pub const ID: Pubkey = Pubkey::new_from_array([0u8; 32]);

    /// System Program `Transfer` instruction index (little-endian u32).
    const TRANSFER_IX_INDEX: u32 = 2;

    /// Move `lamports` from `from` (signer) to `to`.
    pub fn transfer(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
        // u32 LE instruction index + u64 LE lamports.
        let mut data = Vec::with_capacity(12);
        data.extend_from_slice(&TRANSFER_IX_INDEX.to_le_bytes());
        data.extend_from_slice(&lamports.to_le_bytes());

        Instruction::new(
            ID,
            vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)],
            data,
        )
    }
}

pub mod memo_program {
    use crate::account_meta::AccountMeta;
    use crate::instruction::Instruction;
    use crate::pubkey::Pubkey;

    /// `Memo1UhkJRfHyvLMcVucJwxXeuD728EqVDDwQDxFMNo`
    pub const ID: Pubkey = Pubkey::new_from_array([
        0x05, 0x4a, 0x53, 0x50, 0xf8, 0x5d, 0xc8, 0x82, 0xd6, 0x14, 0xa5, 0x56, 0x72, 0x78,
        0x8a, 0x29, 0x6d, 0xdf, 0x1e, 0xab, 0xab, 0xd0, 0xa6, 0x06, 0x78, 0x88, 0x49, 0x32,
        0xf4, 0xee, 0xf6, 0xa0,
    ]);

    /// Attach a UTF-8 note signed by `account`.
    pub fn write_utf8(account: &Pubkey, memo: &str) -> Instruction {
        Instruction::new(
            ID,
            vec![AccountMeta::new_readonly(*account, true)],
            memo.as_bytes().to_vec(),
        )
    }
}
