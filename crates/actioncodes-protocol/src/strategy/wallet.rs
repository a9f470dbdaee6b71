use actioncodes_core::config::CodeGenerationConfig;
use actioncodes_core::error::ProtocolError;
use actioncodes_core::types::{now_ms, ActionCode, TimestampMs};

use super::{derive_action_code, verify_code_integrity};

/// Direct-wallet strategy: the key that owns the code signs the canonical
/// message itself.
#[derive(Clone, Debug)]
pub struct WalletStrategy {
    config: CodeGenerationConfig,
}

impl WalletStrategy {
    pub fn new(config: CodeGenerationConfig) -> Result<Self, ProtocolError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CodeGenerationConfig {
        &self.config
    }

    /// Derive an action code from a wallet signature over
    /// `canonical_message`. Deterministic; generation without a signature is
    /// not possible.
    pub fn generate_code(
        &self,
        canonical_message: &[u8],
        chain: &str,
        signature: &str,
    ) -> Result<ActionCode, ProtocolError> {
        derive_action_code(&self.config, canonical_message, chain, signature)
    }

    /// Stateless structural validation against the wall clock.
    pub fn validate_code(&self, code: &ActionCode) -> Result<(), ProtocolError> {
        self.validate_code_at(code, now_ms())
    }

    /// Checks, in order: expiry (with the configured skew), digit format for
    /// this strategy's code length, presence of the structural fields, and
    /// finally that the digits re-derive from the record's own signature.
    pub fn validate_code_at(
        &self,
        code: &ActionCode,
        now: TimestampMs,
    ) -> Result<(), ProtocolError> {
        if code.is_expired(now, self.config.clock_skew_ms) {
            return Err(ProtocolError::ExpiredCode);
        }

        let expected = self.config.code_length;
        if code.code.len() != expected || !code.code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProtocolError::InvalidCodeFormat { expected });
        }

        if code.pubkey.is_empty() {
            return Err(ProtocolError::MissingRequiredField { field: "pubkey" });
        }
        if code.signature.is_empty() {
            return Err(ProtocolError::MissingRequiredField { field: "signature" });
        }
        if code.chain.is_empty() {
            return Err(ProtocolError::MissingRequiredField { field: "chain" });
        }

        verify_code_integrity(&self.config, code)
    }
}
