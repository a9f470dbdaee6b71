//! Ed25519 (Solana) chain adapter.
//!
//! Implements the [`actioncodes_protocol::ChainAdapter`] predicates for
//! Solana wallets, plus the transaction-binding surface: extracting protocol
//! meta from memo instructions, checking a transaction against an action
//! code, and attaching meta to legacy and versioned transactions. The crate
//! owns its own wire-compatible transaction model, so hosts hand in raw
//! transaction bytes and nothing here performs network I/O.

pub mod adapter;
pub mod lookup;
pub mod tx;

pub use adapter::{SolanaAdapter, SOLANA_CHAIN};
pub use lookup::{
    AddressLookupResolver, AddressLookupTableAccount, LoadedAddresses, StaticLookupResolver,
};
pub use tx::{
    compile_legacy_message, compile_v0_message, memo_instruction, parse_transaction, AccountMeta,
    CompiledInstruction, Instruction, LegacyMessage, LegacyTransaction, MessageAddressTableLookup,
    MessageHeader, Pubkey, SolSignature, V0Message, VersionedMessage, VersionedTransaction,
};
