use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use actioncodes_core::constants::CODE_HASH_BITS;
use actioncodes_core::error::ProtocolError;

use crate::base32::base32_encode_crockford;

/// SHA-256 of arbitrary bytes → 32-byte array.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// HMAC-SHA-256 of `message` under `key` → 32-byte tag.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(key).expect("HMAC-SHA-256 accepts keys of any length");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// HKDF-SHA-256 extract-then-expand, producing `length` bytes of output
/// key material.
pub fn hkdf_sha256(
    ikm: &[u8],
    salt: &[u8],
    info: &[u8],
    length: usize,
) -> Result<Vec<u8>, ProtocolError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = vec![0u8; length];
    hk.expand(info, &mut okm)
        .map_err(|_| ProtocolError::CryptoError(format!("HKDF output length {length} too long")))?;
    Ok(okm)
}

/// Public commitment to a code: Crockford base32 of the first 80 bits of
/// SHA-256 over the code string. Safe to put on-chain — it reveals nothing
/// about the remaining digest.
pub fn code_hash(code: &str) -> String {
    let digest = sha256(code.as_bytes());
    base32_encode_crockford(&digest[..CODE_HASH_BITS / 8])
}
