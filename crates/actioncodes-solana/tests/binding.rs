//! Transaction-binding tests: meta extraction, code binding, signer checks,
//! and meta attachment across legacy and versioned layouts.

use std::sync::Arc;

use actioncodes_core::canonical::generation_message;
use actioncodes_core::config::CodeGenerationConfig;
use actioncodes_core::types::ActionCode;
use actioncodes_crypto::{code_hash, Ed25519Keypair};
use actioncodes_meta::ProtocolMetaFields;
use actioncodes_protocol::WalletStrategy;
use actioncodes_solana::{
    compile_legacy_message, parse_transaction, AccountMeta, AddressLookupTableAccount,
    CompiledInstruction, Instruction, LegacyMessage, MessageAddressTableLookup, MessageHeader,
    Pubkey, SolanaAdapter, SolSignature, StaticLookupResolver, V0Message, VersionedMessage,
    VersionedTransaction,
};
use actioncodes_solana::tx::{memo_program_key, Blockhash};

const WINDOW_START: i64 = 1_759_737_720_000;

fn wallet_keypair() -> Ed25519Keypair {
    Ed25519Keypair::from_seed([77u8; 32])
}

/// An action code generated with a real wallet signature.
fn wallet_code() -> ActionCode {
    let keypair = wallet_keypair();
    let message = generation_message(&keypair.pubkey_b58(), WINDOW_START).unwrap();
    let signature = keypair.sign_b58(&message);
    WalletStrategy::new(CodeGenerationConfig::new(8, 120_000))
        .unwrap()
        .generate_code(&message, "solana", &signature)
        .unwrap()
}

/// A one-signer legacy transaction paying from `payer`, no memo yet.
fn base_transaction(payer: Pubkey) -> VersionedTransaction {
    let program = Pubkey::from_bytes([0xEE; 32]);
    VersionedTransaction::new_unsigned(VersionedMessage::Legacy(LegacyMessage {
        header: MessageHeader {
            num_required_signatures: 1,
            num_readonly_signed_accounts: 0,
            num_readonly_unsigned_accounts: 1,
        },
        account_keys: vec![payer, program],
        recent_blockhash: Blockhash([3u8; 32]),
        instructions: vec![CompiledInstruction {
            program_id_index: 1,
            accounts: vec![0],
            data: vec![0x01],
        }],
    }))
}

fn payer_of(code: &ActionCode) -> Pubkey {
    code.pubkey.parse().unwrap()
}

// ── Meta extraction and binding ──────────────────────────────────────────────

#[test]
fn attach_then_extract_round_trips() {
    let adapter = SolanaAdapter::new();
    let code = wallet_code();
    let meta = ProtocolMetaFields::for_code(&code);

    let tx = adapter
        .attach_protocol_meta(&base_transaction(payer_of(&code)), &meta)
        .unwrap();

    assert_eq!(adapter.parse_meta(&tx), Some(meta.clone()));
    assert_eq!(adapter.get_protocol_meta(&tx), Some(meta.build().unwrap()));
}

#[test]
fn a_transaction_without_memo_has_no_meta() {
    let adapter = SolanaAdapter::new();
    let tx = base_transaction(Pubkey::from_bytes([1u8; 32]));
    assert_eq!(adapter.parse_meta(&tx), None);

    let err = adapter
        .verify_transaction_matches_code_at(&wallet_code(), &tx, WINDOW_START)
        .unwrap_err();
    assert_eq!(err.code(), "MISSING_META");
}

#[test]
fn matching_code_and_transaction_verify() {
    let adapter = SolanaAdapter::new();
    let code = wallet_code();
    let meta = ProtocolMetaFields::for_code(&code);
    let tx = adapter
        .attach_protocol_meta(&base_transaction(payer_of(&code)), &meta)
        .unwrap();

    adapter
        .verify_transaction_matches_code_at(&code, &tx, WINDOW_START + 1_000)
        .unwrap();
}

#[test]
fn a_wrong_code_hash_is_a_meta_mismatch_on_id() {
    let adapter = SolanaAdapter::new();
    let code = wallet_code();
    let meta = ProtocolMetaFields::new("wrong-hash", code.pubkey.clone());
    let tx = adapter
        .attach_protocol_meta(&base_transaction(payer_of(&code)), &meta)
        .unwrap();

    let err = adapter
        .verify_transaction_matches_code_at(&code, &tx, WINDOW_START)
        .unwrap_err();
    assert_eq!(err.code(), "META_MISMATCH");
    assert!(err.to_string().contains("id"));
}

#[test]
fn a_wrong_intent_owner_is_a_meta_mismatch_on_int() {
    let adapter = SolanaAdapter::new();
    let code = wallet_code();
    let meta = ProtocolMetaFields::new(code_hash(&code.code), "someone-else");
    let tx = adapter
        .attach_protocol_meta(&base_transaction(payer_of(&code)), &meta)
        .unwrap();

    let err = adapter
        .verify_transaction_matches_code_at(&code, &tx, WINDOW_START)
        .unwrap_err();
    assert_eq!(err.code(), "META_MISMATCH");
    assert!(err.to_string().contains("int"));
}

#[test]
fn binding_fails_once_the_code_expires() {
    let adapter = SolanaAdapter::new();
    let code = wallet_code();
    let meta = ProtocolMetaFields::for_code(&code);
    let tx = adapter
        .attach_protocol_meta(&base_transaction(payer_of(&code)), &meta)
        .unwrap();

    let err = adapter
        .verify_transaction_matches_code_at(&code, &tx, code.expires_at + 1)
        .unwrap_err();
    assert_eq!(err.code(), "EXPIRED_CODE");
}

// ── Signer checks ────────────────────────────────────────────────────────────

#[test]
fn intent_owner_must_actually_sign() {
    let adapter = SolanaAdapter::new();
    let code = wallet_code();
    let meta = ProtocolMetaFields::for_code(&code);
    let mut tx = adapter
        .attach_protocol_meta(&base_transaction(payer_of(&code)), &meta)
        .unwrap();

    // Zero-filled placeholder: not an actual signer yet.
    let err = adapter
        .verify_transaction_signed_by_intent_owner(&tx)
        .unwrap_err();
    assert_eq!(err.code(), "TRANSACTION_NOT_SIGNED_BY_INTENDED_OWNER");

    tx.sign(&[&wallet_keypair()]).unwrap();
    adapter.verify_transaction_signed_by_intent_owner(&tx).unwrap();
}

#[test]
fn a_distinct_issuer_must_also_sign() {
    let adapter = SolanaAdapter::new();
    let code = wallet_code();
    let issuer_keypair = Ed25519Keypair::from_seed([0x21u8; 32]);
    let issuer = Pubkey::from_bytes(issuer_keypair.public_key_bytes());
    let meta = ProtocolMetaFields::for_code(&code).with_issuer(issuer.to_b58());

    // Two required signers: the intent owner (fee payer) and the issuer.
    let program = Pubkey::from_bytes([0xEE; 32]);
    let message = compile_legacy_message(
        payer_of(&code),
        &[Instruction::new_with_bytes(
            program,
            &[0x09],
            vec![AccountMeta::new(issuer, true)],
        )],
        Blockhash::default(),
    )
    .unwrap();
    let base = VersionedTransaction::new_unsigned(VersionedMessage::Legacy(message));
    let mut tx = adapter.attach_protocol_meta(&base, &meta).unwrap();

    tx.sign(&[&wallet_keypair()]).unwrap();
    let err = adapter
        .verify_transaction_signed_by_intent_owner(&tx)
        .unwrap_err();
    assert_eq!(err.code(), "TRANSACTION_NOT_SIGNED_BY_ISSUER");

    tx.sign(&[&issuer_keypair]).unwrap();
    adapter.verify_transaction_signed_by_intent_owner(&tx).unwrap();
}

#[test]
fn an_undecodable_intent_pubkey_is_a_format_error() {
    let adapter = SolanaAdapter::new();
    let meta = ProtocolMetaFields::new("hash", "not!base58");
    let tx = adapter
        .attach_protocol_meta(&base_transaction(Pubkey::from_bytes([9u8; 32])), &meta)
        .unwrap();

    let err = adapter
        .verify_transaction_signed_by_intent_owner(&tx)
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_PUBKEY_FORMAT");
}

// ── Attachment ───────────────────────────────────────────────────────────────

#[test]
fn attaching_twice_is_refused() {
    let adapter = SolanaAdapter::new();
    let code = wallet_code();
    let meta = ProtocolMetaFields::for_code(&code);
    let tx = adapter
        .attach_protocol_meta(&base_transaction(payer_of(&code)), &meta)
        .unwrap();

    let err = adapter.attach_protocol_meta(&tx, &meta).unwrap_err();
    assert_eq!(err.code(), "INVALID_TRANSACTION_FORMAT");
}

#[test]
fn attachment_preserves_existing_instruction_indexes() {
    let adapter = SolanaAdapter::new();
    let code = wallet_code();
    let base = base_transaction(payer_of(&code));
    let before = base.message.instructions().to_vec();

    let tx = adapter
        .attach_protocol_meta(&base, &ProtocolMetaFields::for_code(&code))
        .unwrap();

    let after = tx.message.instructions();
    assert_eq!(&after[..before.len()], &before[..]);

    // The memo key was appended at the end of the static list.
    let keys = tx.message.static_account_keys();
    assert_eq!(*keys.last().unwrap(), memo_program_key());
    assert_eq!(
        after.last().unwrap().program_id_index as usize,
        keys.len() - 1
    );

    // Signatures were reset to placeholders for the rewritten message.
    assert_eq!(tx.signatures.len(), 1);
    assert!(tx.signatures.iter().all(SolSignature::is_placeholder));

    // The result still parses from wire bytes.
    assert_eq!(parse_transaction(&tx.to_bytes()).unwrap(), tx);
}

#[test]
fn lookup_transactions_require_the_resolver() {
    let adapter = SolanaAdapter::new();
    let code = wallet_code();
    let tx = lookup_transaction(payer_of(&code));

    let err = adapter
        .attach_protocol_meta(&tx, &ProtocolMetaFields::for_code(&code))
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_TRANSACTION_FORMAT");
}

/// A v0 transaction loading two accounts from a lookup table: one writable
/// (combined index 2) and one readonly (combined index 3).
fn lookup_transaction(payer: Pubkey) -> VersionedTransaction {
    let program = Pubkey::from_bytes([0xEE; 32]);
    VersionedTransaction::new_unsigned(VersionedMessage::V0(V0Message {
        header: MessageHeader {
            num_required_signatures: 1,
            num_readonly_signed_accounts: 0,
            num_readonly_unsigned_accounts: 1,
        },
        account_keys: vec![payer, program],
        recent_blockhash: Blockhash::default(),
        instructions: vec![CompiledInstruction {
            program_id_index: 1,
            accounts: vec![0, 2, 3],
            data: vec![0x07],
        }],
        address_table_lookups: vec![MessageAddressTableLookup {
            account_key: Pubkey::from_bytes([0xAA; 32]),
            writable_indexes: vec![0],
            readonly_indexes: vec![1],
        }],
    }))
}

fn lookup_table() -> AddressLookupTableAccount {
    AddressLookupTableAccount {
        key: Pubkey::from_bytes([0xAA; 32]),
        addresses: vec![Pubkey::from_bytes([0xC1; 32]), Pubkey::from_bytes([0xC2; 32])],
    }
}

#[test]
fn lookup_transactions_are_promoted_without_renumbering() {
    let resolver = Arc::new(StaticLookupResolver::new([lookup_table()]));
    let adapter = SolanaAdapter::with_lookup_resolver(resolver);
    let code = wallet_code();
    let base = lookup_transaction(payer_of(&code));

    let tx = adapter
        .attach_protocol_meta(&base, &ProtocolMetaFields::for_code(&code))
        .unwrap();

    // Existing instruction is untouched; its combined indexes now resolve to
    // the same addresses from the static list.
    let instructions = tx.message.instructions();
    assert_eq!(instructions[0], base.message.instructions()[0]);

    let keys = tx.message.static_account_keys();
    assert_eq!(keys[2], Pubkey::from_bytes([0xC1; 32])); // was writable-loaded
    assert_eq!(keys[3], Pubkey::from_bytes([0xC2; 32])); // was readonly-loaded
    assert_eq!(*keys.last().unwrap(), memo_program_key());

    // The lookups are gone and the memo instruction references the new tail.
    assert!(tx.message.address_table_lookups().is_empty());
    assert_eq!(
        instructions.last().unwrap().program_id_index as usize,
        keys.len() - 1
    );

    // Readonly tail: the promoted readonly address plus the memo key.
    assert_eq!(tx.message.header().num_readonly_unsigned_accounts, 2);
    assert!(tx.signatures.iter().all(SolSignature::is_placeholder));
}

#[test]
fn an_unknown_lookup_table_fails_resolution() {
    let resolver = Arc::new(StaticLookupResolver::new(std::iter::empty()));
    let adapter = SolanaAdapter::with_lookup_resolver(resolver);
    let code = wallet_code();

    let err = adapter
        .attach_protocol_meta(&lookup_transaction(payer_of(&code)), &ProtocolMetaFields::for_code(&code))
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_TRANSACTION_FORMAT");
}
