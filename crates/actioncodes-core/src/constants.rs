//! ─── Action Codes Protocol Constants ────────────────────────────────────────
//!
//! Wire-level identifiers and bounds. The message ids and version numbers are
//! signed by wallets verbatim — changing any of them breaks compatibility
//! with every deployed relayer and wallet.

// ── Canonical messages ───────────────────────────────────────────────────────

/// `id` field of the canonical generation message.
pub const PROTOCOL_ID: &str = "actioncodes";

/// `id` field of the canonical revoke message.
pub const REVOKE_ID: &str = "actioncodes-revoke";

/// Version of the canonical message envelope.
pub const CANONICAL_MESSAGE_VERSION: u32 = 1;

/// Maximum length of any string field embedded in a canonical message.
pub const MAX_CANONICAL_FIELD_CHARS: usize = 100;

// ── Codes ────────────────────────────────────────────────────────────────────

/// Shortest permitted code length (decimal digits).
pub const MIN_CODE_LENGTH: usize = 6;

/// Longest permitted code length (decimal digits).
pub const MAX_CODE_LENGTH: usize = 24;

/// Default code length when none is configured.
pub const DEFAULT_CODE_LENGTH: usize = 8;

/// Default code time-to-live: two minutes.
pub const DEFAULT_TTL_MS: i64 = 120_000;

/// Number of leading SHA-256 bits committed to by a code hash.
pub const CODE_HASH_BITS: usize = 80;

// ── Delegation ───────────────────────────────────────────────────────────────

/// A delegation proof may not authorize issuance further than one year out.
pub const MAX_DELEGATION_TTL_MS: i64 = 365 * 24 * 3600 * 1000;

// ── Protocol meta ────────────────────────────────────────────────────────────

/// Version of the transaction meta payload.
pub const META_VERSION: u32 = 2;

/// URI-style prefix of the serialized meta string.
pub const META_PREFIX: &str = "actioncodes:";

/// Upper bound on the serialized meta string, in bytes. Chain memo programs
/// reject longer payloads.
pub const MAX_META_BYTES: usize = 512;

/// Upper bound on the encoded free-form `p` parameter, in bytes.
pub const MAX_META_PARAMS_BYTES: usize = 512;
