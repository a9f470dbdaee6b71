use std::fmt;

use serde::{
    de::{self, SeqAccess, Unexpected, Visitor},
    ser::SerializeTuple,
    Deserialize, Deserializer, Serialize, Serializer,
};

use super::pubkey::{Blockhash, Pubkey};
use super::short_vec;

/// High bit of the first message byte marks a versioned message; the
/// remaining seven bits carry the version number.
pub const MESSAGE_VERSION_PREFIX: u8 = 0x80;

// ── Header and instructions ──────────────────────────────────────────────────

/// Counts that classify the static account keys: the first
/// `num_required_signatures` keys sign, the trailing
/// `num_readonly_unsigned_accounts` keys are read-only non-signers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

/// An instruction with its accounts resolved to indexes into the
/// transaction's combined account list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledInstruction {
    /// Index of the program id in the static account keys.
    pub program_id_index: u8,

    /// Indexes into the combined account list (static keys, then loaded
    /// writable, then loaded readonly).
    #[serde(with = "short_vec")]
    pub accounts: Vec<u8>,

    /// Opaque program input.
    #[serde(with = "short_vec")]
    pub data: Vec<u8>,
}

// ── Legacy message ───────────────────────────────────────────────────────────

/// The pre-versioning message format: every account is a static key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyMessage {
    pub header: MessageHeader,

    #[serde(with = "short_vec")]
    pub account_keys: Vec<Pubkey>,

    pub recent_blockhash: Blockhash,

    #[serde(with = "short_vec")]
    pub instructions: Vec<CompiledInstruction>,
}

// ── V0 message ───────────────────────────────────────────────────────────────

/// One address-lookup-table reference: which table, and which of its entries
/// to load as writable or readonly accounts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAddressTableLookup {
    pub account_key: Pubkey,

    #[serde(with = "short_vec")]
    pub writable_indexes: Vec<u8>,

    #[serde(with = "short_vec")]
    pub readonly_indexes: Vec<u8>,
}

/// The v0 message format: static keys plus accounts loaded through on-chain
/// address lookup tables.
///
/// Instruction account indexes run over the concatenation of the static
/// keys, every lookup's writable loads (in lookup order), then every
/// lookup's readonly loads. Program ids must live in the static keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct V0Message {
    /// Classifies the static keys only, never the loaded addresses.
    pub header: MessageHeader,

    #[serde(with = "short_vec")]
    pub account_keys: Vec<Pubkey>,

    pub recent_blockhash: Blockhash,

    #[serde(with = "short_vec")]
    pub instructions: Vec<CompiledInstruction>,

    #[serde(with = "short_vec")]
    pub address_table_lookups: Vec<MessageAddressTableLookup>,
}

// ── VersionedMessage ─────────────────────────────────────────────────────────

/// Either message format. Legacy serializes bare; v0 is preceded by the
/// version-prefix byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionedMessage {
    Legacy(LegacyMessage),
    V0(V0Message),
}

impl Default for VersionedMessage {
    fn default() -> Self {
        Self::Legacy(LegacyMessage::default())
    }
}

impl VersionedMessage {
    pub fn header(&self) -> &MessageHeader {
        match self {
            Self::Legacy(message) => &message.header,
            Self::V0(message) => &message.header,
        }
    }

    pub fn static_account_keys(&self) -> &[Pubkey] {
        match self {
            Self::Legacy(message) => &message.account_keys,
            Self::V0(message) => &message.account_keys,
        }
    }

    pub fn instructions(&self) -> &[CompiledInstruction] {
        match self {
            Self::Legacy(message) => &message.instructions,
            Self::V0(message) => &message.instructions,
        }
    }

    pub fn address_table_lookups(&self) -> &[MessageAddressTableLookup] {
        match self {
            Self::Legacy(_) => &[],
            Self::V0(message) => &message.address_table_lookups,
        }
    }

    /// Number of signatures a transaction carrying this message must have.
    pub fn required_signature_count(&self) -> usize {
        usize::from(self.header().num_required_signatures)
    }

    /// Wire bytes of this message (what signers sign).
    pub fn serialize_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("message serialization is infallible")
    }
}

impl Serialize for VersionedMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Legacy(message) => {
                let mut seq = serializer.serialize_tuple(1)?;
                seq.serialize_element(message)?;
                seq.end()
            }
            Self::V0(message) => {
                let mut seq = serializer.serialize_tuple(2)?;
                seq.serialize_element(&MESSAGE_VERSION_PREFIX)?;
                seq.serialize_element(message)?;
                seq.end()
            }
        }
    }
}

/// First message byte: either a legacy header count or a version marker.
enum MessagePrefix {
    Legacy(u8),
    Versioned(u8),
}

impl<'de> Deserialize<'de> for MessagePrefix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<MessagePrefix, D::Error> {
        struct PrefixVisitor;

        impl<'de> Visitor<'de> for PrefixVisitor {
            type Value = MessagePrefix;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a message prefix byte")
            }

            // Integer visitors bubble up to u64, so the check lives here
            // rather than in visit_u8.
            fn visit_u64<E: de::Error>(self, value: u64) -> Result<MessagePrefix, E> {
                if value > u64::from(u8::MAX) {
                    return Err(de::Error::invalid_type(Unexpected::Unsigned(value), &self));
                }
                let byte = value as u8;
                if byte & MESSAGE_VERSION_PREFIX != 0 {
                    Ok(MessagePrefix::Versioned(byte & !MESSAGE_VERSION_PREFIX))
                } else {
                    Ok(MessagePrefix::Legacy(byte))
                }
            }
        }

        deserializer.deserialize_u8(PrefixVisitor)
    }
}

impl<'de> Deserialize<'de> for VersionedMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<VersionedMessage, D::Error> {
        struct MessageVisitor;

        impl<'de> Visitor<'de> for MessageVisitor {
            type Value = VersionedMessage;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("message bytes")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<VersionedMessage, A::Error> {
                let prefix: MessagePrefix = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;

                match prefix {
                    MessagePrefix::Legacy(num_required_signatures) => {
                        // The first header byte was consumed as the prefix.
                        #[derive(Deserialize)]
                        struct RemainingLegacyMessage {
                            num_readonly_signed_accounts: u8,
                            num_readonly_unsigned_accounts: u8,
                            #[serde(with = "short_vec")]
                            account_keys: Vec<Pubkey>,
                            recent_blockhash: Blockhash,
                            #[serde(with = "short_vec")]
                            instructions: Vec<CompiledInstruction>,
                        }

                        let rest: RemainingLegacyMessage = seq
                            .next_element()?
                            .ok_or_else(|| de::Error::invalid_length(1, &self))?;

                        Ok(VersionedMessage::Legacy(LegacyMessage {
                            header: MessageHeader {
                                num_required_signatures,
                                num_readonly_signed_accounts: rest.num_readonly_signed_accounts,
                                num_readonly_unsigned_accounts: rest.num_readonly_unsigned_accounts,
                            },
                            account_keys: rest.account_keys,
                            recent_blockhash: rest.recent_blockhash,
                            instructions: rest.instructions,
                        }))
                    }
                    MessagePrefix::Versioned(0) => Ok(VersionedMessage::V0(
                        seq.next_element()?
                            .ok_or_else(|| de::Error::invalid_length(1, &self))?,
                    )),
                    MessagePrefix::Versioned(version) => Err(de::Error::invalid_value(
                        Unexpected::Unsigned(u64::from(version)),
                        &"a supported transaction message version",
                    )),
                }
            }
        }

        deserializer.deserialize_tuple(2, MessageVisitor)
    }
}
