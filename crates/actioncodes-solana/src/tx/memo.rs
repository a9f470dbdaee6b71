use once_cell::sync::Lazy;

use super::message::VersionedMessage;
use super::pubkey::Pubkey;

/// The SPL memo program, the conventional carrier for the protocol meta
/// string.
pub const MEMO_PROGRAM_ID: &str = "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr";

static MEMO_PROGRAM_KEY: Lazy<Pubkey> = Lazy::new(|| {
    MEMO_PROGRAM_ID
        .parse()
        .expect("the memo program id is a valid base58 pubkey")
});

/// The memo program's key as a [`Pubkey`].
pub fn memo_program_key() -> Pubkey {
    *MEMO_PROGRAM_KEY
}

/// Iterate memo-instruction payloads in instruction order.
///
/// Program ids always index into the static keys (the runtime forbids
/// loading programs through lookup tables), so an index past the static list
/// can never be a memo.
pub fn memo_payloads(message: &VersionedMessage) -> impl Iterator<Item = &[u8]> {
    let static_keys = message.static_account_keys();
    let memo = memo_program_key();
    message.instructions().iter().filter_map(move |instruction| {
        let program = static_keys.get(usize::from(instruction.program_id_index))?;
        (*program == memo).then_some(instruction.data.as_slice())
    })
}

#[cfg(test)]
mod tests {
    use super::super::message::{CompiledInstruction, LegacyMessage, MessageHeader};
    use super::super::pubkey::Blockhash;
    use super::*;

    #[test]
    fn the_memo_program_id_is_a_valid_pubkey() {
        assert_eq!(memo_program_key().to_b58(), MEMO_PROGRAM_ID);
    }

    #[test]
    fn payload_scan_only_yields_memo_instructions() {
        let other_program = Pubkey::from_bytes([4u8; 32]);
        let message = VersionedMessage::Legacy(LegacyMessage {
            header: MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 2,
            },
            account_keys: vec![Pubkey::from_bytes([1u8; 32]), other_program, memo_program_key()],
            recent_blockhash: Blockhash::default(),
            instructions: vec![
                CompiledInstruction {
                    program_id_index: 1,
                    accounts: vec![0],
                    data: b"not a memo".to_vec(),
                },
                CompiledInstruction {
                    program_id_index: 2,
                    accounts: vec![],
                    data: b"first memo".to_vec(),
                },
                CompiledInstruction {
                    program_id_index: 2,
                    accounts: vec![],
                    data: b"second memo".to_vec(),
                },
            ],
        });

        let payloads: Vec<&[u8]> = memo_payloads(&message).collect();
        assert_eq!(payloads, vec![&b"first memo"[..], &b"second memo"[..]]);
    }

    #[test]
    fn out_of_range_program_indexes_are_skipped() {
        let message = VersionedMessage::Legacy(LegacyMessage {
            header: MessageHeader::default(),
            account_keys: vec![Pubkey::from_bytes([1u8; 32])],
            recent_blockhash: Blockhash::default(),
            instructions: vec![CompiledInstruction {
                program_id_index: 9,
                accounts: vec![],
                data: b"dangling".to_vec(),
            }],
        });
        assert_eq!(memo_payloads(&message).count(), 0);
    }
}
