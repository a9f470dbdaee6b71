//! Canonical message construction.
//!
//! These byte sequences are what wallets actually sign. Key order, spacing,
//! and integer formatting are part of the wire contract: the serializers
//! below emit compact JSON with the struct-declaration key order, and the
//! input guards reject anything that could make the encoding ambiguous
//! (quotes, backslashes, control characters). Timestamps are emitted as plain
//! decimal integers, never in exponent notation — pinned byte-exactly by the
//! tests at the bottom of this module.

use serde::{Deserialize, Serialize};

use crate::constants::{
    CANONICAL_MESSAGE_VERSION, MAX_CANONICAL_FIELD_CHARS, PROTOCOL_ID, REVOKE_ID,
};
use crate::error::ProtocolError;
use crate::types::{DelegationProof, TimestampMs};

// ── Message bodies ───────────────────────────────────────────────────────────

/// Body of the generation message. Field order is the encoding order.
#[derive(Serialize)]
struct GenerationBody<'a> {
    id: &'static str,
    ver: u32,
    pubkey: &'a str,
    #[serde(rename = "windowStart")]
    window_start: TimestampMs,
}

/// Body of the revoke message.
#[derive(Serialize)]
struct RevokeBody<'a> {
    id: &'static str,
    ver: u32,
    pubkey: &'a str,
    #[serde(rename = "codeHash")]
    code_hash: &'a str,
    #[serde(rename = "windowStart")]
    window_start: TimestampMs,
}

/// Pre-signature body of a delegation proof. The proof's own `signature`
/// field is excluded: this is exactly what the owner signs.
#[derive(Serialize)]
struct DelegationBody<'a> {
    #[serde(rename = "walletPubkey")]
    wallet_pubkey: &'a str,
    #[serde(rename = "delegatedPubkey")]
    delegated_pubkey: &'a str,
    #[serde(rename = "expiresAt")]
    expires_at: TimestampMs,
    chain: &'a str,
}

// ── Input guards ─────────────────────────────────────────────────────────────

/// Reject field values that would make the canonical encoding ambiguous.
fn guard_field(field: &'static str, value: &str) -> Result<(), ProtocolError> {
    if value.is_empty() {
        return Err(ProtocolError::InvalidInput {
            field,
            detail: "must not be empty".into(),
        });
    }
    if value.chars().count() > MAX_CANONICAL_FIELD_CHARS {
        return Err(ProtocolError::InvalidInput {
            field,
            detail: format!("must not exceed {MAX_CANONICAL_FIELD_CHARS} characters"),
        });
    }
    for c in value.chars() {
        let control = c <= '\u{1F}' || ('\u{7F}'..='\u{9F}').contains(&c);
        if control || c == '"' || c == '\\' {
            return Err(ProtocolError::InvalidInput {
                field,
                detail: "must not contain quotes, backslashes, or control characters".into(),
            });
        }
    }
    Ok(())
}

// ── Serializers ──────────────────────────────────────────────────────────────

/// Canonical generation message for `(pubkey, window_start)`.
pub fn generation_message(
    pubkey: &str,
    window_start: TimestampMs,
) -> Result<Vec<u8>, ProtocolError> {
    guard_field("pubkey", pubkey)?;
    let body = GenerationBody {
        id: PROTOCOL_ID,
        ver: CANONICAL_MESSAGE_VERSION,
        pubkey,
        window_start,
    };
    Ok(serde_json::to_vec(&body).expect("canonical body serialization is infallible"))
}

/// Canonical revoke message for `(pubkey, code_hash, window_start)`.
pub fn revoke_message(
    pubkey: &str,
    code_hash: &str,
    window_start: TimestampMs,
) -> Result<Vec<u8>, ProtocolError> {
    guard_field("pubkey", pubkey)?;
    guard_field("codeHash", code_hash)?;
    let body = RevokeBody {
        id: REVOKE_ID,
        ver: CANONICAL_MESSAGE_VERSION,
        pubkey,
        code_hash,
        window_start,
    };
    Ok(serde_json::to_vec(&body).expect("canonical body serialization is infallible"))
}

/// Pre-signature bytes of a delegation proof: what the owner signs and what
/// verifiers reconstruct. Uses the proof's fields except `signature`.
pub fn delegation_proof_message(proof: &DelegationProof) -> Result<Vec<u8>, ProtocolError> {
    guard_field("walletPubkey", &proof.wallet_pubkey)?;
    guard_field("delegatedPubkey", &proof.delegated_pubkey)?;
    guard_field("chain", &proof.chain)?;
    let body = DelegationBody {
        wallet_pubkey: &proof.wallet_pubkey,
        delegated_pubkey: &proof.delegated_pubkey,
        expires_at: proof.expires_at,
        chain: &proof.chain,
    };
    Ok(serde_json::to_vec(&body).expect("canonical body serialization is infallible"))
}

// ── Parsing ──────────────────────────────────────────────────────────────────

/// The two fields the core extracts from a generation message. Everything
/// else in the envelope is opaque to the strategies.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerationEnvelope {
    pub pubkey: String,
    #[serde(rename = "windowStart")]
    pub window_start: TimestampMs,
}

/// Extract `pubkey` and `windowStart` from canonical generation-message
/// bytes. Unknown fields are ignored.
pub fn parse_generation_message(bytes: &[u8]) -> Result<GenerationEnvelope, ProtocolError> {
    let envelope: GenerationEnvelope =
        serde_json::from_slice(bytes).map_err(|e| ProtocolError::InvalidInput {
            field: "canonicalMessage",
            detail: format!("not a canonical generation message: {e}"),
        })?;
    guard_field("pubkey", &envelope.pubkey)?;
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBKEY: &str = "2wyVnSw6j9omfqRixz37S2sU72rFTheQeUjDfXhAQJvf";

    #[test]
    fn generation_message_bytes_are_pinned() {
        let bytes = generation_message(PUBKEY, 1_759_737_720_000).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            format!(
                "{{\"id\":\"actioncodes\",\"ver\":1,\"pubkey\":\"{PUBKEY}\",\
                 \"windowStart\":1759737720000}}"
            )
        );
    }

    #[test]
    fn revoke_message_bytes_are_pinned() {
        let bytes = revoke_message("wallet", "0123456789ABCDEF", 42).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "{\"id\":\"actioncodes-revoke\",\"ver\":1,\"pubkey\":\"wallet\",\
             \"codeHash\":\"0123456789ABCDEF\",\"windowStart\":42}"
        );
    }

    #[test]
    fn delegation_proof_bytes_exclude_the_signature() {
        let proof = DelegationProof {
            wallet_pubkey: "owner".into(),
            delegated_pubkey: "delegate".into(),
            chain: "solana".into(),
            expires_at: 1_790_000_000_000,
            signature: "never-serialized".into(),
        };
        let text = String::from_utf8(delegation_proof_message(&proof).unwrap()).unwrap();
        assert_eq!(
            text,
            "{\"walletPubkey\":\"owner\",\"delegatedPubkey\":\"delegate\",\
             \"expiresAt\":1790000000000,\"chain\":\"solana\"}"
        );
        assert!(!text.contains("never-serialized"));
    }

    #[test]
    fn round_trip_through_the_envelope_parser() {
        let bytes = generation_message(PUBKEY, 1_759_737_720_000).unwrap();
        let envelope = parse_generation_message(&bytes).unwrap();
        assert_eq!(envelope.pubkey, PUBKEY);
        assert_eq!(envelope.window_start, 1_759_737_720_000);
    }

    #[test]
    fn guards_reject_hostile_fields() {
        assert!(generation_message("", 0).is_err());
        assert!(generation_message("a\"b", 0).is_err());
        assert!(generation_message("a\\b", 0).is_err());
        assert!(generation_message("a\u{0007}b", 0).is_err());
        assert!(generation_message("a\u{0085}b", 0).is_err());
        assert!(generation_message(&"x".repeat(101), 0).is_err());
        assert!(generation_message(&"x".repeat(100), 0).is_ok());
    }

    #[test]
    fn guard_errors_carry_the_invalid_input_code() {
        let err = generation_message("", 0).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn negative_and_large_timestamps_stay_plain_integers() {
        let bytes = generation_message("k", 9_007_199_254_740_993).unwrap();
        assert!(String::from_utf8(bytes)
            .unwrap()
            .ends_with("\"windowStart\":9007199254740993}"));

        let bytes = generation_message("k", -5).unwrap();
        assert!(String::from_utf8(bytes)
            .unwrap()
            .ends_with("\"windowStart\":-5}"));
    }
}
