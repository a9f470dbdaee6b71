pub mod instruction;
pub mod memo;
pub mod message;
pub mod pubkey;
pub mod short_vec;
pub mod transaction;

pub use instruction::{
    compile_legacy_message, compile_v0_message, memo_instruction, AccountMeta, Instruction,
};
pub use memo::{memo_payloads, memo_program_key, MEMO_PROGRAM_ID};
pub use message::{
    CompiledInstruction, LegacyMessage, MessageAddressTableLookup, MessageHeader, V0Message,
    VersionedMessage, MESSAGE_VERSION_PREFIX,
};
pub use pubkey::{Blockhash, Pubkey, SolSignature};
pub use transaction::{parse_transaction, LegacyTransaction, VersionedTransaction};
