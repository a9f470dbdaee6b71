use actioncodes_core::canonical::{delegation_proof_message, generation_message};
use actioncodes_core::config::CodeGenerationConfig;
use actioncodes_core::constants::MAX_DELEGATION_TTL_MS;
use actioncodes_core::error::ProtocolError;
use actioncodes_core::types::{now_ms, DelegatedActionCode, DelegationProof, TimestampMs};
use actioncodes_crypto::{decode_pubkey, decode_signature, verify_detached};

use super::{derive_action_code, verify_code_integrity};

/// Delegated strategy: a pre-authorized secondary key issues codes on an
/// owner's behalf.
///
/// The strategy only ever consumes proofs — it validates and verifies them
/// but never produces the owner's signature itself.
#[derive(Clone, Debug)]
pub struct DelegationStrategy {
    config: CodeGenerationConfig,
}

impl DelegationStrategy {
    pub fn new(config: CodeGenerationConfig) -> Result<Self, ProtocolError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CodeGenerationConfig {
        &self.config
    }

    // ── Proof validation ─────────────────────────────────────────────────────

    /// Structural validation of a delegation proof at `now`: well-formed
    /// base58 keys, a present signature, not expired, and not authorized
    /// further out than the one-year ceiling.
    pub fn validate_proof_at(
        &self,
        proof: &DelegationProof,
        now: TimestampMs,
    ) -> Result<(), ProtocolError> {
        if decode_pubkey(&proof.wallet_pubkey).is_none() {
            return Err(ProtocolError::InvalidInput {
                field: "walletPubkey",
                detail: "not a valid base58 public key".into(),
            });
        }
        if decode_pubkey(&proof.delegated_pubkey).is_none() {
            return Err(ProtocolError::InvalidInput {
                field: "delegatedPubkey",
                detail: "not a valid base58 public key".into(),
            });
        }
        if proof.chain.is_empty() {
            return Err(ProtocolError::MissingRequiredField { field: "chain" });
        }
        if proof.signature.is_empty() {
            return Err(ProtocolError::MissingRequiredField { field: "signature" });
        }
        if proof.expires_at <= now {
            return Err(ProtocolError::ExpiredCode);
        }
        if proof.expires_at > now + MAX_DELEGATION_TTL_MS {
            return Err(ProtocolError::InvalidInput {
                field: "expiresAt",
                detail: "delegation may not extend more than one year out".into(),
            });
        }
        Ok(())
    }

    // ── Generation ───────────────────────────────────────────────────────────

    /// Derive a delegated action code. `canonical_message` must be the
    /// generation message for the proof's delegated key, and `signature` the
    /// delegated key's signature over it.
    ///
    /// The code's expiry is capped at the proof's own deadline so a freshly
    /// issued record always satisfies the outlive rule.
    pub fn generate_delegated_code(
        &self,
        proof: &DelegationProof,
        canonical_message: &[u8],
        chain: &str,
        signature: &str,
    ) -> Result<DelegatedActionCode, ProtocolError> {
        self.generate_delegated_code_at(proof, canonical_message, chain, signature, now_ms())
    }

    pub fn generate_delegated_code_at(
        &self,
        proof: &DelegationProof,
        canonical_message: &[u8],
        chain: &str,
        signature: &str,
        now: TimestampMs,
    ) -> Result<DelegatedActionCode, ProtocolError> {
        self.validate_proof_at(proof, now)?;

        let mut code = derive_action_code(&self.config, canonical_message, chain, signature)?;
        if code.pubkey != proof.delegated_pubkey {
            return Err(ProtocolError::InvalidInput {
                field: "delegatedPubkey",
                detail: "canonical message is not bound to the proof's delegated key".into(),
            });
        }
        code.expires_at = code.expires_at.min(proof.expires_at);

        Ok(DelegatedActionCode {
            code,
            delegation_proof: proof.clone(),
        })
    }

    // ── Validation ───────────────────────────────────────────────────────────

    pub fn validate_delegated_code(&self, code: &DelegatedActionCode) -> Result<(), ProtocolError> {
        self.validate_delegated_code_at(code, now_ms())
    }

    /// Full delegated validation: the embedded proof, the pubkey binding, the
    /// outlive rule, the delegated signature over the reconstructed canonical
    /// message, and the standard wallet-level checks.
    pub fn validate_delegated_code_at(
        &self,
        code: &DelegatedActionCode,
        now: TimestampMs,
    ) -> Result<(), ProtocolError> {
        let proof = &code.delegation_proof;
        self.validate_proof_at(proof, now)?;

        if code.code.pubkey != proof.delegated_pubkey {
            return Err(ProtocolError::InvalidInput {
                field: "delegatedPubkey",
                detail: "code pubkey does not match the proof's delegatedPubkey".into(),
            });
        }
        if code.code.expires_at > proof.expires_at {
            return Err(ProtocolError::InvalidInput {
                field: "expiresAt",
                detail: "code must not outlive its delegation proof".into(),
            });
        }

        let message = generation_message(&proof.delegated_pubkey, code.code.timestamp)?;
        let verified = match (
            decode_pubkey(&proof.delegated_pubkey),
            decode_signature(&code.code.signature),
        ) {
            (Some(pubkey), Some(signature)) => verify_detached(&pubkey, &message, &signature),
            _ => false,
        };
        if !verified {
            return Err(ProtocolError::InvalidSignature);
        }

        // Standard expiration and format checks, shared with the wallet path.
        if code.code.is_expired(now, self.config.clock_skew_ms) {
            return Err(ProtocolError::ExpiredCode);
        }
        let expected = self.config.code_length;
        if code.code.code.len() != expected || !code.code.code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProtocolError::InvalidCodeFormat { expected });
        }
        verify_code_integrity(&self.config, &code.code)
    }

    /// Pre-signature bytes an owner signs to mint a proof. Provided so hosts
    /// build the exact byte sequence verifiers will reconstruct.
    pub fn proof_message(proof: &DelegationProof) -> Result<Vec<u8>, ProtocolError> {
        delegation_proof_message(proof)
    }
}
