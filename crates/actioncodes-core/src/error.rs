use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed error set of the protocol core.
///
/// Every variant maps to a stable string code (see [`ProtocolError::code`])
/// that crosses process boundaries unchanged, so relayers written against a
/// different implementation can match on it. Messages carry the offending
/// field and a human-readable detail; they never contain signature bytes or
/// derived key material.
#[derive(Debug, Error)]
pub enum ProtocolError {
    // ── Code lifecycle ───────────────────────────────────────────────────────
    #[error("action code has expired")]
    ExpiredCode,

    #[error("invalid action code: {0}")]
    InvalidCode(String),

    #[error("code must be exactly {expected} decimal digits")]
    InvalidCodeFormat { expected: usize },

    #[error("signature verification failed")]
    InvalidSignature,

    // ── Transaction meta ─────────────────────────────────────────────────────
    #[error("transaction carries no protocol meta")]
    MissingMeta,

    #[error("malformed protocol meta: {0}")]
    InvalidMetaFormat(String),

    #[error("protocol meta does not match the action code (field `{field}`)")]
    MetaMismatch { field: &'static str },

    #[error("serialized protocol meta exceeds {max} bytes")]
    MetaTooLarge { max: usize },

    // ── Transactions ─────────────────────────────────────────────────────────
    #[error("invalid transaction format: {0}")]
    InvalidTransactionFormat(String),

    #[error("transaction is not signed by the intended owner")]
    TransactionNotSignedByIntendedOwner,

    #[error("transaction is not signed by the issuer")]
    TransactionNotSignedByIssuer,

    // ── Inputs ───────────────────────────────────────────────────────────────
    #[error("invalid public key encoding for `{field}`")]
    InvalidPubkeyFormat { field: &'static str },

    #[error("invalid input for `{field}`: {detail}")]
    InvalidInput { field: &'static str, detail: String },

    #[error("missing required field `{field}`")]
    MissingRequiredField { field: &'static str },

    // ── Crypto / dispatch ────────────────────────────────────────────────────
    #[error("cryptographic failure: {0}")]
    CryptoError(String),

    #[error("digest is unusable for digit derivation: {0}")]
    InvalidDigest(String),

    #[error("no adapter registered for chain `{0}`")]
    InvalidAdapter(String),
}

impl ProtocolError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ExpiredCode => "EXPIRED_CODE",
            Self::InvalidCode(_) => "INVALID_CODE",
            Self::InvalidCodeFormat { .. } => "INVALID_CODE_FORMAT",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::MissingMeta => "MISSING_META",
            Self::InvalidMetaFormat(_) => "INVALID_META_FORMAT",
            Self::MetaMismatch { .. } => "META_MISMATCH",
            Self::MetaTooLarge { .. } => "META_TOO_LARGE",
            Self::InvalidTransactionFormat(_) => "INVALID_TRANSACTION_FORMAT",
            Self::TransactionNotSignedByIntendedOwner => {
                "TRANSACTION_NOT_SIGNED_BY_INTENDED_OWNER"
            }
            Self::TransactionNotSignedByIssuer => "TRANSACTION_NOT_SIGNED_BY_ISSUER",
            Self::InvalidPubkeyFormat { .. } => "INVALID_PUBKEY_FORMAT",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::MissingRequiredField { .. } => "MISSING_REQUIRED_FIELD",
            Self::CryptoError(_) => "CRYPTO_ERROR",
            Self::InvalidDigest(_) => "INVALID_DIGEST",
            Self::InvalidAdapter(_) => "INVALID_ADAPTER",
        }
    }
}

/// Serializable form of an error for RPC responses and logs: the stable code
/// plus the rendered message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    pub code: String,
    pub message: String,
}

impl From<&ProtocolError> for WireError {
    fn from(error: &ProtocolError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}
