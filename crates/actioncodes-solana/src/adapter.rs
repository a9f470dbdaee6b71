use std::sync::Arc;

use subtle::ConstantTimeEq;
use tracing::debug;

use actioncodes_core::canonical::{delegation_proof_message, generation_message, revoke_message};
use actioncodes_core::constants::META_VERSION;
use actioncodes_core::error::ProtocolError;
use actioncodes_core::types::{now_ms, ActionCode, DelegatedActionCode, DelegationProof, TimestampMs};
use actioncodes_crypto::{code_hash, decode_pubkey, decode_signature, verify_detached};
use actioncodes_meta::ProtocolMetaFields;
use actioncodes_protocol::ChainAdapter;

use crate::lookup::AddressLookupResolver;
use crate::tx::{
    memo_payloads, memo_program_key, CompiledInstruction, MessageHeader, Pubkey, VersionedMessage,
    VersionedTransaction,
};

/// Chain identifier this adapter registers under.
pub const SOLANA_CHAIN: &str = "solana";

/// Ed25519 verification and transaction binding for Solana wallets.
///
/// The adapter owns no mutable state. A lookup resolver is only needed for
/// attaching meta to versioned transactions that load accounts through
/// address lookup tables; every other operation works without it.
#[derive(Default)]
pub struct SolanaAdapter {
    lookup_resolver: Option<Arc<dyn AddressLookupResolver>>,
}

impl SolanaAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lookup_resolver(resolver: Arc<dyn AddressLookupResolver>) -> Self {
        Self {
            lookup_resolver: Some(resolver),
        }
    }

    // ── Meta extraction ──────────────────────────────────────────────────────

    /// The first memo payload that parses as protocol meta, verbatim.
    pub fn get_protocol_meta(&self, transaction: &VersionedTransaction) -> Option<String> {
        memo_payloads(&transaction.message).find_map(|data| {
            let text = std::str::from_utf8(data).ok()?;
            ProtocolMetaFields::parse(text).ok()?;
            Some(text.to_string())
        })
    }

    /// Parsed protocol meta, if any memo carries one.
    pub fn parse_meta(&self, transaction: &VersionedTransaction) -> Option<ProtocolMetaFields> {
        memo_payloads(&transaction.message).find_map(|data| {
            ProtocolMetaFields::parse(std::str::from_utf8(data).ok()?).ok()
        })
    }

    // ── Binding checks ───────────────────────────────────────────────────────

    /// Require the transaction's meta to commit to exactly this action code:
    /// current meta version, the code's hash, and the code's pubkey — and the
    /// code itself to still be inside its window.
    pub fn verify_transaction_matches_code(
        &self,
        code: &ActionCode,
        transaction: &VersionedTransaction,
    ) -> Result<(), ProtocolError> {
        self.verify_transaction_matches_code_at(code, transaction, now_ms())
    }

    pub fn verify_transaction_matches_code_at(
        &self,
        code: &ActionCode,
        transaction: &VersionedTransaction,
        now: TimestampMs,
    ) -> Result<(), ProtocolError> {
        let meta = self
            .parse_meta(transaction)
            .ok_or(ProtocolError::MissingMeta)?;

        if meta.ver != META_VERSION {
            return Err(ProtocolError::MetaMismatch { field: "ver" });
        }
        let expected_hash = code_hash(&code.code);
        if !bool::from(meta.id.as_bytes().ct_eq(expected_hash.as_bytes())) {
            return Err(ProtocolError::MetaMismatch { field: "id" });
        }
        if !bool::from(meta.int.as_bytes().ct_eq(code.pubkey.as_bytes())) {
            return Err(ProtocolError::MetaMismatch { field: "int" });
        }
        if now > code.expires_at {
            return Err(ProtocolError::ExpiredCode);
        }
        Ok(())
    }

    /// Require the meta's intent owner (and the issuer, when distinct) to be
    /// among the transaction's actual signers.
    pub fn verify_transaction_signed_by_intent_owner(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<(), ProtocolError> {
        let meta = self
            .parse_meta(transaction)
            .ok_or(ProtocolError::MissingMeta)?;

        let intent: Pubkey = meta
            .int
            .parse()
            .map_err(|_| ProtocolError::InvalidPubkeyFormat { field: "int" })?;
        let issuer = meta
            .distinct_issuer()
            .map(|raw| {
                raw.parse::<Pubkey>()
                    .map_err(|_| ProtocolError::InvalidPubkeyFormat { field: "iss" })
            })
            .transpose()?;

        let signers = actual_signers(transaction);
        if !signers.contains(&intent) {
            return Err(ProtocolError::TransactionNotSignedByIntendedOwner);
        }
        if let Some(issuer) = issuer {
            if !signers.contains(&issuer) {
                return Err(ProtocolError::TransactionNotSignedByIssuer);
            }
        }
        Ok(())
    }

    // ── Meta attachment ──────────────────────────────────────────────────────

    /// Return a copy of `transaction` with a memo instruction carrying
    /// `meta` appended.
    ///
    /// Existing instructions keep their indexes numerically unchanged. For
    /// versioned messages that load accounts through lookup tables, the
    /// configured resolver promotes the loaded addresses into the static key
    /// list (in combined-index order, so nothing shifts) before the memo key
    /// is appended; without a resolver such transactions are rejected. The
    /// returned transaction carries a fresh zero-filled signature set — the
    /// message bytes changed, so every prior signature is void.
    pub fn attach_protocol_meta(
        &self,
        transaction: &VersionedTransaction,
        meta: &ProtocolMetaFields,
    ) -> Result<VersionedTransaction, ProtocolError> {
        if self.get_protocol_meta(transaction).is_some() {
            return Err(ProtocolError::InvalidTransactionFormat(
                "protocol meta is already attached".into(),
            ));
        }
        let wire = meta.build()?;
        let mut message = transaction.message.clone();

        match &mut message {
            VersionedMessage::Legacy(legacy) => {
                push_memo_instruction(
                    &mut legacy.account_keys,
                    &mut legacy.header,
                    &mut legacy.instructions,
                    wire.into_bytes(),
                )?;
            }
            VersionedMessage::V0(v0) if v0.address_table_lookups.is_empty() => {
                push_memo_instruction(
                    &mut v0.account_keys,
                    &mut v0.header,
                    &mut v0.instructions,
                    wire.into_bytes(),
                )?;
            }
            VersionedMessage::V0(v0) => {
                let resolver = self.lookup_resolver.as_ref().ok_or_else(|| {
                    ProtocolError::InvalidTransactionFormat(
                        "transaction loads accounts through lookup tables \
                         but no lookup resolver is configured"
                            .into(),
                    )
                })?;

                let mut writable = Vec::new();
                let mut readonly = Vec::new();
                for lookup in &v0.address_table_lookups {
                    let loaded = resolver.resolve(lookup)?;
                    writable.extend(loaded.writable);
                    readonly.extend(loaded.readonly);
                }

                // Loaded addresses join the static list in combined-index
                // order (writable, then readonly), so every pre-existing
                // instruction index keeps its numeric value.
                let readonly_count = u8::try_from(readonly.len()).map_err(|_| {
                    ProtocolError::InvalidTransactionFormat(
                        "too many loaded readonly addresses".into(),
                    )
                })?;
                v0.header.num_readonly_unsigned_accounts = if writable.is_empty() {
                    v0.header
                        .num_readonly_unsigned_accounts
                        .checked_add(readonly_count)
                } else {
                    Some(readonly_count)
                }
                .ok_or_else(|| {
                    ProtocolError::InvalidTransactionFormat("account header overflow".into())
                })?;

                v0.account_keys.extend(writable);
                v0.account_keys.extend(readonly);
                v0.address_table_lookups.clear();

                push_memo_instruction(
                    &mut v0.account_keys,
                    &mut v0.header,
                    &mut v0.instructions,
                    wire.into_bytes(),
                )?;
            }
        }

        debug!("attached protocol meta to transaction");
        Ok(VersionedTransaction::new_unsigned(message))
    }
}

// ── Signature helpers ────────────────────────────────────────────────────────
//
// Decode failures return false before any curve arithmetic (the 32/64 length
// checks live in the decoders). Combined checks join with `&` so both sides
// run even when one has already failed.

fn verify_generation(pubkey_b58: &str, window_start: TimestampMs, signature_b58: &str) -> bool {
    let Ok(message) = generation_message(pubkey_b58, window_start) else {
        return false;
    };
    match (decode_pubkey(pubkey_b58), decode_signature(signature_b58)) {
        (Some(pubkey), Some(signature)) => verify_detached(&pubkey, &message, &signature),
        _ => false,
    }
}

fn verify_proof(proof: &DelegationProof) -> bool {
    let Ok(message) = delegation_proof_message(proof) else {
        return false;
    };
    match (
        decode_pubkey(&proof.wallet_pubkey),
        decode_signature(&proof.signature),
    ) {
        (Some(pubkey), Some(signature)) => verify_detached(&pubkey, &message, &signature),
        _ => false,
    }
}

fn verify_revoke(pubkey_b58: &str, code: &ActionCode, revoke_signature_b58: &str) -> bool {
    let hash = code_hash(&code.code);
    let Ok(message) = revoke_message(pubkey_b58, &hash, code.timestamp) else {
        return false;
    };
    match (decode_pubkey(pubkey_b58), decode_signature(revoke_signature_b58)) {
        (Some(pubkey), Some(signature)) => verify_detached(&pubkey, &message, &signature),
        _ => false,
    }
}

/// Required-signer keys whose signature slot holds a real signature.
fn actual_signers(transaction: &VersionedTransaction) -> Vec<Pubkey> {
    let keys = transaction.message.static_account_keys();
    let required = transaction.message.required_signature_count();
    keys.iter()
        .take(required)
        .enumerate()
        .filter(|(index, _)| {
            transaction
                .signatures
                .get(*index)
                .is_some_and(|signature| !signature.is_placeholder())
        })
        .map(|(_, key)| *key)
        .collect()
}

/// Append a memo instruction carrying `data`, reusing the memo program key
/// if the message already lists it.
fn push_memo_instruction(
    account_keys: &mut Vec<Pubkey>,
    header: &mut MessageHeader,
    instructions: &mut Vec<CompiledInstruction>,
    data: Vec<u8>,
) -> Result<(), ProtocolError> {
    let memo = memo_program_key();
    let index = match account_keys.iter().position(|key| *key == memo) {
        Some(index) => index,
        None => {
            account_keys.push(memo);
            header.num_readonly_unsigned_accounts = header
                .num_readonly_unsigned_accounts
                .checked_add(1)
                .ok_or_else(|| {
                    ProtocolError::InvalidTransactionFormat("account header overflow".into())
                })?;
            account_keys.len() - 1
        }
    };
    let program_id_index = u8::try_from(index).map_err(|_| {
        ProtocolError::InvalidTransactionFormat("account index overflow".into())
    })?;
    instructions.push(CompiledInstruction {
        program_id_index,
        accounts: vec![],
        data,
    });
    Ok(())
}

// ── ChainAdapter ─────────────────────────────────────────────────────────────

impl ChainAdapter for SolanaAdapter {
    /// One Ed25519 verification: the wallet signature over the reconstructed
    /// generation message.
    fn verify_with_wallet(&self, code: &ActionCode) -> bool {
        verify_generation(&code.pubkey, code.timestamp, &code.signature)
    }

    /// Two Ed25519 verifications, both always performed: the owner's proof
    /// signature and the delegated generation signature. The pubkey binding
    /// is compared in constant time.
    fn verify_with_delegation(&self, code: &DelegatedActionCode) -> bool {
        let proof = &code.delegation_proof;
        let proof_ok = verify_proof(proof);
        let delegated_ok =
            verify_generation(&proof.delegated_pubkey, code.code.timestamp, &code.code.signature);
        let bound = bool::from(
            code.code
                .pubkey
                .as_bytes()
                .ct_eq(proof.delegated_pubkey.as_bytes()),
        );
        proof_ok & delegated_ok & bound
    }

    /// One Ed25519 verification over the reconstructed revoke message.
    fn verify_revoke_with_wallet(&self, code: &ActionCode, revoke_signature: &str) -> bool {
        verify_revoke(&code.pubkey, code, revoke_signature)
    }

    /// Two Ed25519 verifications, both always performed, mirroring
    /// [`Self::verify_with_delegation`] over the revoke message.
    fn verify_revoke_with_delegation(
        &self,
        code: &DelegatedActionCode,
        revoke_signature: &str,
    ) -> bool {
        let proof = &code.delegation_proof;
        let proof_ok = verify_proof(proof);
        let revoke_ok = verify_revoke(&proof.delegated_pubkey, &code.code, revoke_signature);
        let bound = bool::from(
            code.code
                .pubkey
                .as_bytes()
                .ct_eq(proof.delegated_pubkey.as_bytes()),
        );
        proof_ok & revoke_ok & bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actioncodes_crypto::Ed25519Keypair;

    const WINDOW_START: TimestampMs = 1_759_737_720_000;

    fn wallet() -> Ed25519Keypair {
        Ed25519Keypair::from_seed([81u8; 32])
    }

    fn delegate() -> Ed25519Keypair {
        Ed25519Keypair::from_seed([82u8; 32])
    }

    fn wallet_code() -> ActionCode {
        let keypair = wallet();
        let message = generation_message(&keypair.pubkey_b58(), WINDOW_START).unwrap();
        ActionCode {
            code: "12345678".into(),
            pubkey: keypair.pubkey_b58(),
            timestamp: WINDOW_START,
            expires_at: WINDOW_START + 120_000,
            chain: SOLANA_CHAIN.into(),
            signature: keypair.sign_b58(&message),
        }
    }

    fn delegated_code() -> DelegatedActionCode {
        let mut proof = DelegationProof {
            wallet_pubkey: wallet().pubkey_b58(),
            delegated_pubkey: delegate().pubkey_b58(),
            chain: SOLANA_CHAIN.into(),
            expires_at: WINDOW_START + 86_400_000,
            signature: String::new(),
        };
        proof.signature = wallet().sign_b58(&delegation_proof_message(&proof).unwrap());

        let message = generation_message(&proof.delegated_pubkey, WINDOW_START).unwrap();
        DelegatedActionCode {
            code: ActionCode {
                code: "12345678".into(),
                pubkey: proof.delegated_pubkey.clone(),
                timestamp: WINDOW_START,
                expires_at: WINDOW_START + 120_000,
                chain: SOLANA_CHAIN.into(),
                signature: delegate().sign_b58(&message),
            },
            delegation_proof: proof,
        }
    }

    #[test]
    fn wallet_predicate_accepts_a_genuine_signature() {
        let adapter = SolanaAdapter::new();
        assert!(adapter.verify_with_wallet(&wallet_code()));
    }

    #[test]
    fn wallet_predicate_rejects_a_shifted_window() {
        let adapter = SolanaAdapter::new();
        let mut code = wallet_code();
        code.timestamp += 1;
        assert!(!adapter.verify_with_wallet(&code));
    }

    #[test]
    fn wallet_predicate_rejects_undecodable_material_without_panicking() {
        let adapter = SolanaAdapter::new();
        let mut code = wallet_code();
        code.signature = "!!not-base58!!".into();
        assert!(!adapter.verify_with_wallet(&code));

        let mut code = wallet_code();
        code.pubkey = String::new();
        assert!(!adapter.verify_with_wallet(&code));
    }

    #[test]
    fn delegation_predicate_needs_both_signatures() {
        let adapter = SolanaAdapter::new();
        let genuine = delegated_code();
        assert!(adapter.verify_with_delegation(&genuine));

        // Break the owner side only.
        let mut broken_proof = genuine.clone();
        broken_proof.delegation_proof.expires_at += 1;
        assert!(!adapter.verify_with_delegation(&broken_proof));

        // Break the delegated side only.
        let mut broken_delegated = genuine.clone();
        broken_delegated.code.timestamp += 1;
        assert!(!adapter.verify_with_delegation(&broken_delegated));
    }

    #[test]
    fn revoke_predicates_verify_the_revoke_message() {
        let adapter = SolanaAdapter::new();
        let code = wallet_code();
        let hash = code_hash(&code.code);
        let message = revoke_message(&code.pubkey, &hash, code.timestamp).unwrap();
        let revoke_signature = wallet().sign_b58(&message);

        assert!(adapter.verify_revoke_with_wallet(&code, &revoke_signature));
        // The generation signature is not a valid revoke signature.
        assert!(!adapter.verify_revoke_with_wallet(&code, &code.signature));
    }

    #[test]
    fn delegated_revoke_needs_the_proof_and_the_delegated_signature() {
        let adapter = SolanaAdapter::new();
        let code = delegated_code();
        let hash = code_hash(&code.code.code);
        let message = revoke_message(&code.code.pubkey, &hash, code.code.timestamp).unwrap();
        let revoke_signature = delegate().sign_b58(&message);

        assert!(adapter.verify_revoke_with_delegation(&code, &revoke_signature));

        // Owner-signed revoke does not stand in for the delegated key.
        let owner_signed = wallet().sign_b58(&message);
        assert!(!adapter.verify_revoke_with_delegation(&code, &owner_signed));

        // A tampered proof voids the pair even with a good revoke signature.
        let mut tampered = code.clone();
        tampered.delegation_proof.expires_at += 1;
        assert!(!adapter.verify_revoke_with_delegation(&tampered, &revoke_signature));
    }
}
