//! Uncompiled instructions and message compilation.
//!
//! Hosts describe what a transaction does with [`Instruction`]s and
//! [`AccountMeta`]s; compilation dedups the accounts, orders them by
//! privilege (writable signers, readonly signers, writable non-signers,
//! readonly non-signers — the payer always first), and rewrites every
//! account reference as an index.

use std::collections::BTreeMap;

use actioncodes_core::error::ProtocolError;

use super::memo::memo_program_key;
use super::message::{
    CompiledInstruction, LegacyMessage, MessageAddressTableLookup, MessageHeader, V0Message,
};
use super::pubkey::{Blockhash, Pubkey};
use crate::lookup::AddressLookupTableAccount;

// ── AccountMeta / Instruction ────────────────────────────────────────────────

/// An account an instruction touches, with its privilege requirements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    /// A writable account.
    pub fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    /// A read-only account.
    pub fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// A single program invocation, before account references are compiled to
/// indexes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

impl Instruction {
    pub fn new_with_bytes(program_id: Pubkey, data: &[u8], accounts: Vec<AccountMeta>) -> Self {
        Self {
            program_id,
            accounts,
            data: data.to_vec(),
        }
    }
}

/// A memo instruction carrying `text`. The memo program reads no accounts.
pub fn memo_instruction(text: &str) -> Instruction {
    Instruction::new_with_bytes(memo_program_key(), text.as_bytes(), vec![])
}

// ── Key compilation ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Default)]
struct KeyFlags {
    is_signer: bool,
    is_writable: bool,
}

/// The deduplicated account set of a message under construction. Within each
/// privilege class keys sort by pubkey, except the payer, which always leads.
struct CompiledKeys {
    payer: Pubkey,
    keys: BTreeMap<Pubkey, KeyFlags>,
}

impl CompiledKeys {
    fn compile(payer: Pubkey, instructions: &[Instruction]) -> Self {
        let mut keys: BTreeMap<Pubkey, KeyFlags> = BTreeMap::new();
        for instruction in instructions {
            // Programs are readonly non-signers unless an AccountMeta says
            // otherwise.
            keys.entry(instruction.program_id).or_default();
            for meta in &instruction.accounts {
                let flags = keys.entry(meta.pubkey).or_default();
                flags.is_signer |= meta.is_signer;
                flags.is_writable |= meta.is_writable;
            }
        }
        keys.insert(
            payer,
            KeyFlags {
                is_signer: true,
                is_writable: true,
            },
        );
        Self { payer, keys }
    }

    /// Order the keys by privilege class and derive the header counts.
    fn into_message_components(self) -> (MessageHeader, Vec<Pubkey>) {
        let class = |key: &Pubkey, flags: &KeyFlags| match (flags.is_signer, flags.is_writable) {
            _ if *key == self.payer => 0u8,
            (true, true) => 1,
            (true, false) => 2,
            (false, true) => 3,
            (false, false) => 4,
        };

        let mut ordered: Vec<(u8, Pubkey, KeyFlags)> = self
            .keys
            .iter()
            .map(|(key, flags)| (class(key, flags), *key, *flags))
            .collect();
        ordered.sort_by_key(|(class, key, _)| (*class, *key));

        let num_required_signatures = ordered
            .iter()
            .filter(|(_, _, flags)| flags.is_signer)
            .count() as u8;
        let num_readonly_signed_accounts = ordered
            .iter()
            .filter(|(_, _, flags)| flags.is_signer && !flags.is_writable)
            .count() as u8;
        let num_readonly_unsigned_accounts = ordered
            .iter()
            .filter(|(_, _, flags)| !flags.is_signer && !flags.is_writable)
            .count() as u8;

        let header = MessageHeader {
            num_required_signatures,
            num_readonly_signed_accounts,
            num_readonly_unsigned_accounts,
        };
        (header, ordered.into_iter().map(|(_, key, _)| key).collect())
    }
}

fn compile_instructions(
    instructions: &[Instruction],
    position_of: impl Fn(&Pubkey) -> Option<usize>,
) -> Result<Vec<CompiledInstruction>, ProtocolError> {
    let index_of = |key: &Pubkey| -> Result<u8, ProtocolError> {
        let position = position_of(key).ok_or_else(|| {
            ProtocolError::InvalidTransactionFormat(format!("unresolved account key {key}"))
        })?;
        u8::try_from(position).map_err(|_| {
            ProtocolError::InvalidTransactionFormat("account index overflow".into())
        })
    };

    instructions
        .iter()
        .map(|instruction| {
            Ok(CompiledInstruction {
                program_id_index: index_of(&instruction.program_id)?,
                accounts: instruction
                    .accounts
                    .iter()
                    .map(|meta| index_of(&meta.pubkey))
                    .collect::<Result<_, _>>()?,
                data: instruction.data.clone(),
            })
        })
        .collect()
}

/// Compile instructions into a legacy message with `payer` as fee payer.
pub fn compile_legacy_message(
    payer: Pubkey,
    instructions: &[Instruction],
    recent_blockhash: Blockhash,
) -> Result<LegacyMessage, ProtocolError> {
    let (header, account_keys) = CompiledKeys::compile(payer, instructions).into_message_components();
    let compiled = compile_instructions(instructions, |key| {
        account_keys.iter().position(|candidate| candidate == key)
    })?;
    Ok(LegacyMessage {
        header,
        account_keys,
        recent_blockhash,
        instructions: compiled,
    })
}

/// Compile instructions into a v0 message, offloading non-signer non-program
/// accounts found in the given lookup tables.
pub fn compile_v0_message(
    payer: Pubkey,
    instructions: &[Instruction],
    lookup_tables: &[AddressLookupTableAccount],
    recent_blockhash: Blockhash,
) -> Result<V0Message, ProtocolError> {
    let compiled_keys = CompiledKeys::compile(payer, instructions);

    // Program ids must stay static: the runtime cannot load a program
    // through a lookup table.
    let is_program =
        |key: &Pubkey| instructions.iter().any(|instruction| instruction.program_id == *key);

    let mut static_flags = compiled_keys.keys.clone();
    let mut address_table_lookups = Vec::new();
    let mut loaded_writable: Vec<Pubkey> = Vec::new();
    let mut loaded_readonly: Vec<Pubkey> = Vec::new();

    for table in lookup_tables {
        let mut writable_indexes = Vec::new();
        let mut readonly_indexes = Vec::new();
        for (key, flags) in compiled_keys.keys.iter() {
            if flags.is_signer || is_program(key) || !static_flags.contains_key(key) {
                continue;
            }
            let Some(table_index) = table.addresses.iter().position(|address| address == key)
            else {
                continue;
            };
            let table_index = u8::try_from(table_index).map_err(|_| {
                ProtocolError::InvalidTransactionFormat("lookup table index overflow".into())
            })?;
            static_flags.remove(key);
            if flags.is_writable {
                writable_indexes.push(table_index);
                loaded_writable.push(*key);
            } else {
                readonly_indexes.push(table_index);
                loaded_readonly.push(*key);
            }
        }
        if !writable_indexes.is_empty() || !readonly_indexes.is_empty() {
            address_table_lookups.push(MessageAddressTableLookup {
                account_key: table.key,
                writable_indexes,
                readonly_indexes,
            });
        }
    }

    let (header, static_keys) = CompiledKeys {
        payer: compiled_keys.payer,
        keys: static_flags,
    }
    .into_message_components();

    // Combined index space: static keys, loaded writable, loaded readonly.
    let compiled = compile_instructions(instructions, |key| {
        static_keys
            .iter()
            .position(|candidate| candidate == key)
            .or_else(|| {
                loaded_writable
                    .iter()
                    .position(|candidate| candidate == key)
                    .map(|position| static_keys.len() + position)
            })
            .or_else(|| {
                loaded_readonly
                    .iter()
                    .position(|candidate| candidate == key)
                    .map(|position| static_keys.len() + loaded_writable.len() + position)
            })
    })?;

    Ok(V0Message {
        header,
        account_keys: static_keys,
        recent_blockhash,
        instructions: compiled,
        address_table_lookups,
    })
}
