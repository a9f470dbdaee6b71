use std::fmt;
use std::str::FromStr;

use serde::{
    de::{self, SeqAccess, Visitor},
    ser::SerializeTuple,
    Deserialize, Deserializer, Serialize, Serializer,
};

use actioncodes_core::error::ProtocolError;

// ── Pubkey ───────────────────────────────────────────────────────────────────

/// A 32-byte Ed25519 account address, displayed as base58.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pubkey(pub [u8; 32]);

impl Pubkey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }
}

impl FromStr for Pubkey {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| ProtocolError::InvalidPubkeyFormat { field: "pubkey" })?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ProtocolError::InvalidPubkeyFormat { field: "pubkey" })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({}…)", &self.to_b58()[..8.min(self.to_b58().len())])
    }
}

// ── Blockhash ────────────────────────────────────────────────────────────────

/// A recent-blockhash slot in a message (32 bytes).
#[derive(Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blockhash(pub [u8; 32]);

impl fmt::Debug for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blockhash({}…)", &bs58::encode(&self.0).into_string()[..8])
    }
}

// ── SolSignature ─────────────────────────────────────────────────────────────

/// A 64-byte Ed25519 transaction signature.
///
/// Serde cannot derive for 64-byte arrays, so the wire encoding (a bare
/// 64-byte run, matching the chain format) is written out by hand.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SolSignature(pub [u8; 64]);

impl SolSignature {
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// The all-zeros placeholder that fills unsigned slots.
    pub fn is_placeholder(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0[..]).into_string()
    }
}

impl Default for SolSignature {
    fn default() -> Self {
        Self([0u8; 64])
    }
}

impl fmt::Debug for SolSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_placeholder() {
            write!(f, "SolSignature(placeholder)")
        } else {
            write!(f, "SolSignature({}…)", &self.to_b58()[..8])
        }
    }
}

impl Serialize for SolSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_tuple(64)?;
        for byte in &self.0 {
            seq.serialize_element(byte)?;
        }
        seq.end()
    }
}

struct SolSignatureVisitor;

impl<'de> Visitor<'de> for SolSignatureVisitor {
    type Value = SolSignature;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("64 signature bytes")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<SolSignature, A::Error> {
        let mut bytes = [0u8; 64];
        for (index, slot) in bytes.iter_mut().enumerate() {
            *slot = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(index, &self))?;
        }
        Ok(SolSignature(bytes))
    }
}

impl<'de> Deserialize<'de> for SolSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<SolSignature, D::Error> {
        deserializer.deserialize_tuple(64, SolSignatureVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pubkey_b58_round_trip() {
        let key = Pubkey::from_bytes([17u8; 32]);
        let parsed: Pubkey = key.to_b58().parse().unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn pubkey_rejects_wrong_lengths_and_bad_alphabets() {
        assert!(bs58::encode([1u8; 31]).into_string().parse::<Pubkey>().is_err());
        assert!("0OIl".parse::<Pubkey>().is_err());
    }

    #[test]
    fn signature_bincode_encoding_is_sixty_four_raw_bytes() {
        let sig = SolSignature::from_bytes([0xABu8; 64]);
        let bytes = bincode::serialize(&sig).unwrap();
        assert_eq!(bytes, vec![0xABu8; 64]);

        let back: SolSignature = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn default_signature_is_the_placeholder() {
        assert!(SolSignature::default().is_placeholder());
        assert!(!SolSignature::from_bytes([1u8; 64]).is_placeholder());
    }
}
