use data_encoding::{Encoding, Specification};
use once_cell::sync::Lazy;

/// Crockford's base32 alphabet: digits then consonant-heavy letters, skipping
/// I, L, O, and U to avoid misreads.
const CROCKFORD_ALPHABET: &str = "0123456789ABCDEFGHJKMNPQRSTVWXYZ";

static CROCKFORD: Lazy<Encoding> = Lazy::new(|| {
    let mut spec = Specification::new();
    spec.symbols.push_str(CROCKFORD_ALPHABET);
    spec.encoding()
        .expect("crockford alphabet is a valid base32 specification")
});

/// Encode bytes as unpadded Crockford base32.
pub fn base32_encode_crockford(bytes: &[u8]) -> String {
    CROCKFORD.encode(bytes)
}
