pub mod canonical;
pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use canonical::{
    delegation_proof_message, generation_message, parse_generation_message, revoke_message,
    GenerationEnvelope,
};
pub use config::CodeGenerationConfig;
pub use error::{ProtocolError, WireError};
pub use types::{
    now_ms, ActionCode, DelegatedActionCode, DelegationProof, IssuedCode, RevokedCode, TimestampMs,
};
