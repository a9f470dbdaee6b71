pub mod delegation;
pub mod wallet;

use actioncodes_core::canonical::{generation_message, parse_generation_message};
use actioncodes_core::config::CodeGenerationConfig;
use actioncodes_core::error::ProtocolError;
use actioncodes_core::types::ActionCode;
use actioncodes_crypto::{digits_from_digest, hmac_sha256};

/// Shared derivation path of both strategies.
///
/// The signature is the sole entropy source: the code is the decimal
/// truncation of `HMAC-SHA-256(signature_bytes, canonical_message)`. Identical
/// inputs produce a byte-identical record.
pub(crate) fn derive_action_code(
    config: &CodeGenerationConfig,
    canonical_message: &[u8],
    chain: &str,
    signature: &str,
) -> Result<ActionCode, ProtocolError> {
    if chain.is_empty() {
        return Err(ProtocolError::MissingRequiredField { field: "chain" });
    }
    let envelope = parse_generation_message(canonical_message)?;

    let signature_bytes = bs58::decode(signature)
        .into_vec()
        .ok()
        .filter(|bytes| !bytes.is_empty())
        .ok_or(ProtocolError::InvalidSignature)?;

    let key = hmac_sha256(&signature_bytes, canonical_message);
    let code = digits_from_digest(&key, config.code_length)?;

    Ok(ActionCode {
        code,
        pubkey: envelope.pubkey,
        timestamp: envelope.window_start,
        expires_at: envelope.window_start + config.ttl_ms,
        chain: chain.to_string(),
        signature: signature.to_string(),
    })
}

/// Re-derive the code from the record's own signature and reject a record
/// whose digits do not match. This is what makes validation stateless: the
/// binding of code to key, window, and signature is recomputed, not looked
/// up.
pub(crate) fn verify_code_integrity(
    config: &CodeGenerationConfig,
    code: &ActionCode,
) -> Result<(), ProtocolError> {
    let message = generation_message(&code.pubkey, code.timestamp)?;
    let signature_bytes = bs58::decode(&code.signature)
        .into_vec()
        .ok()
        .filter(|bytes| !bytes.is_empty())
        .ok_or(ProtocolError::InvalidSignature)?;
    let expected = digits_from_digest(&hmac_sha256(&signature_bytes, &message), config.code_length)?;
    if expected != code.code {
        return Err(ProtocolError::InvalidCode(
            "code digits do not match the signature they claim to derive from".into(),
        ));
    }
    Ok(())
}
