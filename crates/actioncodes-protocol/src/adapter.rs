use actioncodes_core::types::{ActionCode, DelegatedActionCode};

/// Chain-specific signature verification.
///
/// All four predicates are pure, synchronous, and infallible: every failure
/// mode (bad encoding, wrong length, verification mismatch) maps to `false`.
///
/// Timing contract: an implementation must run its full verification sequence
/// even after an intermediate step has already failed, so an observer cannot
/// tell from timing which check rejected. The delegation and revoke variants
/// therefore always perform their fixed number of signature verifications —
/// one for wallet paths, two for delegation paths.
pub trait ChainAdapter: Send + Sync {
    /// Does `code.signature` verify over the canonical generation message for
    /// `(code.pubkey, code.timestamp)`?
    fn verify_with_wallet(&self, code: &ActionCode) -> bool;

    /// Does the owner's proof signature verify, and does the delegated
    /// signature verify over the canonical generation message?
    fn verify_with_delegation(&self, code: &DelegatedActionCode) -> bool;

    /// Does `revoke_signature` verify over the canonical revoke message for
    /// this code?
    fn verify_revoke_with_wallet(&self, code: &ActionCode, revoke_signature: &str) -> bool;

    /// Delegated analogue of [`Self::verify_revoke_with_wallet`]: proof
    /// signature plus delegated revoke signature.
    fn verify_revoke_with_delegation(
        &self,
        code: &DelegatedActionCode,
        revoke_signature: &str,
    ) -> bool;
}
