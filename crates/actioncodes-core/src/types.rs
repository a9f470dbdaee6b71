use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch (UTC).
pub type TimestampMs = i64;

/// Current wall-clock time in milliseconds. The single clock definition the
/// whole workspace shares; hosts that need a test clock pass explicit
/// timestamps instead.
pub fn now_ms() -> TimestampMs {
    Utc::now().timestamp_millis()
}

// ── ActionCode ───────────────────────────────────────────────────────────────

/// A short-lived decimal code bound to a public key and a time window.
///
/// Constructed exactly once by a generation strategy and immutable afterwards.
/// `code` is derived deterministically from the wallet signature over the
/// canonical generation message for `(pubkey, timestamp)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCode {
    /// N-digit decimal code string.
    pub code: String,

    /// Public key the code is bound to, in the chain's string encoding.
    pub pubkey: String,

    /// Window start (ms). Anchors the canonical message this code was
    /// derived from.
    pub timestamp: TimestampMs,

    /// `timestamp + ttl_ms`.
    pub expires_at: TimestampMs,

    /// Chain identifier, short lowercase string (e.g. "solana").
    pub chain: String,

    /// The wallet signature the code was derived from (base58 for Ed25519
    /// chains).
    pub signature: String,
}

impl ActionCode {
    /// Whether the code is past its window at `now`, with an additive
    /// tolerance for clock skew.
    pub fn is_expired(&self, now: TimestampMs, clock_skew_ms: i64) -> bool {
        now > self.expires_at + clock_skew_ms
    }

    /// Milliseconds of validity left at `now` (zero once expired).
    pub fn remaining_ttl_ms(&self, now: TimestampMs) -> i64 {
        (self.expires_at - now).max(0)
    }
}

// ── DelegationProof ──────────────────────────────────────────────────────────

/// An owner's signed authorization for a second keypair to issue action codes
/// on their behalf until `expires_at`.
///
/// `signature` is the owner's signature over the canonical proof bytes
/// (see [`crate::canonical::delegation_proof_message`]); it is produced once
/// and never regenerated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationProof {
    /// The delegating owner's public key.
    pub wallet_pubkey: String,

    /// The key authorized to issue codes.
    pub delegated_pubkey: String,

    /// Chain identifier the delegation is valid on.
    pub chain: String,

    /// Authorization deadline (ms).
    pub expires_at: TimestampMs,

    /// Owner's signature over the serialized proof (base58).
    pub signature: String,
}

// ── DelegatedActionCode ──────────────────────────────────────────────────────

/// An action code issued by a delegated key under a pre-signed proof.
///
/// Carries every field of [`ActionCode`] (with `pubkey` equal to the proof's
/// `delegated_pubkey`) plus the proof itself, so validators can recheck the
/// full authorization chain without any lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatedActionCode {
    #[serde(flatten)]
    pub code: ActionCode,

    pub delegation_proof: DelegationProof,
}

// ── IssuedCode ───────────────────────────────────────────────────────────────

/// Sum of the two issuance strategies. The shared fields live in the embedded
/// [`ActionCode`]; strategy-specific validation dispatches on the variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssuedCode {
    Delegated(DelegatedActionCode),
    Wallet(ActionCode),
}

impl IssuedCode {
    /// The embedded action code, whichever strategy issued it.
    pub fn action_code(&self) -> &ActionCode {
        match self {
            Self::Wallet(code) => code,
            Self::Delegated(delegated) => &delegated.code,
        }
    }

    /// The delegation proof, when issued under one.
    pub fn delegation_proof(&self) -> Option<&DelegationProof> {
        match self {
            Self::Wallet(_) => None,
            Self::Delegated(delegated) => Some(&delegated.delegation_proof),
        }
    }

    pub fn chain(&self) -> &str {
        &self.action_code().chain
    }
}

// ── RevokedCode ──────────────────────────────────────────────────────────────

/// The receipt of a revocation. The core stores nothing: holding a
/// `RevokedCode` with a signature that verifies against the canonical revoke
/// message IS the proof that the code was withdrawn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokedCode {
    #[serde(flatten)]
    pub issued: IssuedCode,

    /// Signature over the canonical revoke message (base58).
    pub revoke_signature: String,

    /// When the revoke message was signed (ms).
    pub revoked_at: TimestampMs,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_code() -> ActionCode {
        ActionCode {
            code: "12345678".into(),
            pubkey: "2wyVnSw6j9omfqRixz37S2sU72rFTheQeUjDfXhAQJvf".into(),
            timestamp: 1_759_737_720_000,
            expires_at: 1_759_737_840_000,
            chain: "solana".into(),
            signature: "sig".into(),
        }
    }

    #[test]
    fn expiry_respects_clock_skew() {
        let code = sample_code();
        assert!(!code.is_expired(1_759_737_840_000, 0));
        assert!(code.is_expired(1_759_737_840_001, 0));
        assert!(!code.is_expired(1_759_737_840_001, 5_000));
    }

    #[test]
    fn remaining_ttl_floors_at_zero() {
        let code = sample_code();
        assert_eq!(code.remaining_ttl_ms(1_759_737_720_000), 120_000);
        assert_eq!(code.remaining_ttl_ms(1_759_999_999_999), 0);
    }

    #[test]
    fn records_encode_with_camel_case_fields() {
        let json = serde_json::to_value(sample_code()).unwrap();
        assert!(json.get("expiresAt").is_some());
        assert!(json.get("expires_at").is_none());
    }

    #[test]
    fn delegated_code_flattens_shared_fields() {
        let delegated = DelegatedActionCode {
            code: sample_code(),
            delegation_proof: DelegationProof {
                wallet_pubkey: "owner".into(),
                delegated_pubkey: "delegate".into(),
                chain: "solana".into(),
                expires_at: 1_790_000_000_000,
                signature: "proof-sig".into(),
            },
        };
        let json = serde_json::to_value(&delegated).unwrap();
        assert!(json.get("code").is_some());
        assert!(json.get("delegationProof").is_some());

        let round: DelegatedActionCode = serde_json::from_value(json).unwrap();
        assert_eq!(round, delegated);
    }

    #[test]
    fn issued_code_round_trips_untagged() {
        let wallet = IssuedCode::Wallet(sample_code());
        let json = serde_json::to_string(&wallet).unwrap();
        let round: IssuedCode = serde_json::from_str(&json).unwrap();
        assert_eq!(round, wallet);
    }
}
