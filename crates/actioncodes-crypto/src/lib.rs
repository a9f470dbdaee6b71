pub mod base32;
pub mod digits;
pub mod ed25519;
pub mod hash;

pub use base32::base32_encode_crockford;
pub use digits::{digits_from_digest, truncate_bits};
pub use ed25519::{decode_pubkey, decode_signature, verify_detached, Ed25519Keypair};
pub use hash::{code_hash, hkdf_sha256, hmac_sha256, sha256};
