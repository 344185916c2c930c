//! Account references and the rules that turn them into a message's key
//! table.
//!
//! The same key may be referenced many times (fee payer, instruction input,
//! program id). All references to a key collapse into one entry whose flags
//! are the OR of every occurrence, and the resulting entries are ordered:
//!
//! 1. fee payer (always signer + writable)
//! 2. writable signers
//! 3. read-only signers
//! 4. writable non-signers
//! 5. read-only non-signers
//!
//! Within each group entries keep first-seen order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TxError};
use crate::pubkey::Pubkey;

/// A single account reference in an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    /// A writable account reference.
    pub fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    /// A read-only account reference.
    pub fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }

    fn rank(&self) -> u8 {
        match (self.is_signer, self.is_writable) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        }
    }
}

/// Insertion-ordered set of account references keyed by public key.
///
/// Adding a key that is already present ORs the new flags into the existing
/// entry instead of appending.
#[derive(Debug, Clone, Default)]
pub struct AccountKeys {
    metas: Vec<AccountMeta>,
    positions: HashMap<Pubkey, usize>,
}

impl AccountKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, meta: AccountMeta) {
        match self.positions.get(&meta.pubkey) {
            Some(&pos) => {
                let entry = &mut self.metas[pos];
                entry.is_signer |= meta.is_signer;
                entry.is_writable |= meta.is_writable;
            }
            None => {
                self.positions.insert(meta.pubkey, self.metas.len());
                self.metas.push(meta);
            }
        }
    }

    pub fn add_all<'a>(&mut self, metas: impl IntoIterator<Item = &'a AccountMeta>) {
        for meta in metas {
            self.add(*meta);
        }
    }

    pub fn get(&self, pubkey: &Pubkey) -> Option<&AccountMeta> {
        self.positions.get(pubkey).map(|&pos| &self.metas[pos])
    }

    pub fn contains(&self, pubkey: &Pubkey) -> bool {
        self.positions.contains_key(pubkey)
    }

    pub fn len(&self) -> usize {
        self.metas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    /// Merged entries in first-seen order.
    pub fn as_slice(&self) -> &[AccountMeta] {
        &self.metas
    }

    /// The canonical key table for `fee_payer`.
    ///
    /// The fee payer is inserted if absent and always comes out first as a
    /// writable signer. Nothing is cached: the table is rebuilt on every call.
    pub fn ordered(&self, fee_payer: &Pubkey) -> Vec<AccountMeta> {
        let mut rest: Vec<AccountMeta> = self
            .metas
            .iter()
            .filter(|meta| meta.pubkey != *fee_payer)
            .copied()
            .collect();

        // Stable: keeps insertion order within a group.
        rest.sort_by_key(AccountMeta::rank);

        let mut table = Vec::with_capacity(rest.len() + 1);
        table.push(AccountMeta::new(*fee_payer, true));
        table.extend(rest);
        table
    }
}

impl FromIterator<AccountMeta> for AccountKeys {
    fn from_iter<I: IntoIterator<Item = AccountMeta>>(iter: I) -> Self {
        let mut keys = AccountKeys::new();
        for meta in iter {
            keys.add(meta);
        }
        keys
    }
}

/// Deduplicate `metas` by public key, OR-ing the flags of duplicates.
pub fn merge(metas: &[AccountMeta]) -> Vec<AccountMeta> {
    metas.iter().copied().collect::<AccountKeys>().metas
}

/// Merge `metas` and put them in canonical order behind `fee_payer`.
pub fn order(metas: &[AccountMeta], fee_payer: &Pubkey) -> Vec<AccountMeta> {
    metas
        .iter()
        .copied()
        .collect::<AccountKeys>()
        .ordered(fee_payer)
}

/// Position of `pubkey` in `table`.
pub fn index_of(table: &[AccountMeta], pubkey: &Pubkey) -> Result<usize> {
    table
        .iter()
        .position(|meta| meta.pubkey == *pubkey)
        .ok_or_else(|| TxError::AccountNotFound(pubkey.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(b: u8) -> Pubkey {
        Pubkey::new_from_array([b; 32])
    }

    #[test]
    fn constructors_set_writability() {
        assert!(AccountMeta::new(key(1), false).is_writable);
        assert!(!AccountMeta::new_readonly(key(1), true).is_writable);
        assert!(AccountMeta::new_readonly(key(1), true).is_signer);
    }

    #[test]
    fn merge_ors_flags_of_duplicates() {
        let merged = merge(&[
            AccountMeta::new_readonly(key(1), true),
            AccountMeta::new(key(2), false),
            AccountMeta::new(key(1), false),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], AccountMeta::new(key(1), true));
        assert_eq!(merged[1], AccountMeta::new(key(2), false));
    }

    #[test]
    fn merge_keeps_first_seen_order() {
        let merged = merge(&[
            AccountMeta::new_readonly(key(3), false),
            AccountMeta::new_readonly(key(1), false),
            AccountMeta::new_readonly(key(3), false),
            AccountMeta::new_readonly(key(2), false),
        ]);
        let order: Vec<Pubkey> = merged.iter().map(|m| m.pubkey).collect();
        assert_eq!(order, vec![key(3), key(1), key(2)]);
    }

    #[test]
    fn order_follows_bucket_rules() {
        let payer = key(9);
        let table = order(
            &[
                AccountMeta::new_readonly(key(1), false), // ro non-signer
                AccountMeta::new(key(2), false),          // w non-signer
                AccountMeta::new_readonly(key(3), true),  // ro signer
                AccountMeta::new(key(4), true),           // w signer
                AccountMeta::new_readonly(key(5), false), // ro non-signer
                AccountMeta::new(key(6), true),           // w signer
            ],
            &payer,
        );

        let keys: Vec<Pubkey> = table.iter().map(|m| m.pubkey).collect();
        assert_eq!(
            keys,
            vec![key(9), key(4), key(6), key(3), key(2), key(1), key(5)]
        );
        assert!(table[0].is_signer && table[0].is_writable);
    }

    #[test]
    fn fee_payer_is_promoted_and_forced_writable_signer() {
        let payer = key(7);
        let table = order(
            &[
                AccountMeta::new(key(1), true),
                AccountMeta::new_readonly(payer, false),
            ],
            &payer,
        );

        assert_eq!(table.len(), 2);
        assert_eq!(table[0], AccountMeta::new(payer, true));
        assert_eq!(table[1].pubkey, key(1));
    }

    #[test]
    fn fee_payer_added_when_absent() {
        let keys: AccountKeys = [AccountMeta::new(key(1), false)].into_iter().collect();
        let table = keys.ordered(&key(8));
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].pubkey, key(8));
        // The pending set itself is untouched.
        assert_eq!(keys.len(), 1);
        assert!(!keys.contains(&key(8)));
    }

    #[test]
    fn index_of_hit_and_miss() {
        let table = order(&[AccountMeta::new(key(1), false)], &key(2));
        assert_eq!(index_of(&table, &key(2)).unwrap(), 0);
        assert_eq!(index_of(&table, &key(1)).unwrap(), 1);

        let err = index_of(&table, &key(3)).unwrap_err();
        assert!(matches!(err, TxError::AccountNotFound(_)));
    }

    #[test]
    fn account_keys_lookup() {
        let mut keys = AccountKeys::new();
        keys.add(AccountMeta::new_readonly(key(1), false));
        keys.add_all(&[AccountMeta::new_readonly(key(1), true)]);
        assert_eq!(keys.len(), 1);
        assert!(keys.get(&key(1)).unwrap().is_signer);
        assert!(keys.get(&key(2)).is_none());
        assert!(!keys.is_empty());
    }

    #[test]
    fn account_meta_json_uses_base58_key() {
        let meta = AccountMeta::new(Pubkey::default(), true);
        let json = serde_json::to_value(meta).unwrap();
        assert_eq!(json["pubkey"], "11111111111111111111111111111111");
        assert_eq!(json["is_signer"], true);
        assert_eq!(json["is_writable"], true);
    }
}
