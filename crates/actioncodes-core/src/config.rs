use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CODE_LENGTH, DEFAULT_TTL_MS, MAX_CODE_LENGTH, MIN_CODE_LENGTH,
};
use crate::error::ProtocolError;

/// Tunables for code generation and validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeGenerationConfig {
    /// Number of decimal digits per code. Clamped to [6, 24] on construction.
    pub code_length: usize,

    /// Code lifetime in milliseconds. Must be positive.
    pub ttl_ms: i64,

    /// Additive tolerance applied to `expires_at` during validation.
    pub clock_skew_ms: i64,
}

impl Default for CodeGenerationConfig {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            ttl_ms: DEFAULT_TTL_MS,
            clock_skew_ms: 0,
        }
    }
}

impl CodeGenerationConfig {
    /// Build a config with `code_length` clamped into the permitted range.
    pub fn new(code_length: usize, ttl_ms: i64) -> Self {
        Self {
            code_length: code_length.clamp(MIN_CODE_LENGTH, MAX_CODE_LENGTH),
            ttl_ms,
            clock_skew_ms: 0,
        }
    }

    pub fn with_clock_skew(mut self, clock_skew_ms: i64) -> Self {
        self.clock_skew_ms = clock_skew_ms;
        self
    }

    /// Reject configurations no strategy can honor.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.ttl_ms <= 0 {
            return Err(ProtocolError::InvalidInput {
                field: "ttlMs",
                detail: "ttl must be positive".into(),
            });
        }
        if self.clock_skew_ms < 0 {
            return Err(ProtocolError::InvalidInput {
                field: "clockSkewMs",
                detail: "clock skew must be non-negative".into(),
            });
        }
        if self.code_length < MIN_CODE_LENGTH || self.code_length > MAX_CODE_LENGTH {
            return Err(ProtocolError::InvalidInput {
                field: "codeLength",
                detail: format!(
                    "code length must be within [{MIN_CODE_LENGTH}, {MAX_CODE_LENGTH}]"
                ),
            });
        }
        Ok(())
    }
}
