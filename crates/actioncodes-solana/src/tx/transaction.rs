use serde::{Deserialize, Serialize};

use actioncodes_core::error::ProtocolError;
use actioncodes_crypto::Ed25519Keypair;

use super::message::{LegacyMessage, VersionedMessage};
use super::pubkey::{Pubkey, SolSignature};
use super::short_vec;

/// A transaction in the pre-versioning wire layout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyTransaction {
    #[serde(with = "short_vec")]
    pub signatures: Vec<SolSignature>,

    pub message: LegacyMessage,
}

/// A transaction wrapping either message format. The first signatures
/// correspond one-to-one with the leading signer keys of the message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedTransaction {
    #[serde(with = "short_vec")]
    pub signatures: Vec<SolSignature>,

    pub message: VersionedMessage,
}

impl From<LegacyTransaction> for VersionedTransaction {
    fn from(transaction: LegacyTransaction) -> Self {
        Self {
            signatures: transaction.signatures,
            message: VersionedMessage::Legacy(transaction.message),
        }
    }
}

impl VersionedTransaction {
    /// Wrap a message with the zero-filled signature placeholders its header
    /// requires.
    pub fn new_unsigned(message: VersionedMessage) -> Self {
        Self {
            signatures: vec![SolSignature::default(); message.required_signature_count()],
            message,
        }
    }

    /// The bytes signers sign.
    pub fn message_data(&self) -> Vec<u8> {
        self.message.serialize_bytes()
    }

    /// Full wire encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("transaction serialization is infallible")
    }

    /// True when every required signature slot holds a real signature.
    pub fn is_fully_signed(&self) -> bool {
        self.signatures.len() == self.message.required_signature_count()
            && self.signatures.iter().all(|sig| !sig.is_placeholder())
    }

    /// Sign the message with each keypair, filling the signature slot of the
    /// matching signer key. A keypair whose key is not among the required
    /// signers is an error; other slots keep whatever they held.
    pub fn sign(&mut self, keypairs: &[&Ed25519Keypair]) -> Result<(), ProtocolError> {
        let message_data = self.message_data();
        let required = self.message.required_signature_count();
        if self.message.static_account_keys().len() < required {
            return Err(ProtocolError::InvalidTransactionFormat(
                "message lists fewer static keys than required signatures".into(),
            ));
        }
        if self.signatures.len() != required {
            self.signatures.resize(required, SolSignature::default());
        }
        for keypair in keypairs {
            let pubkey = Pubkey::from_bytes(keypair.public_key_bytes());
            let position = self.message.static_account_keys()[..required]
                .iter()
                .position(|key| *key == pubkey)
                .ok_or_else(|| ProtocolError::InvalidInput {
                    field: "signer",
                    detail: format!("{pubkey} is not a required signer of this transaction"),
                })?;
            self.signatures[position] = SolSignature::from_bytes(keypair.sign(&message_data));
        }
        Ok(())
    }
}

/// Parse transaction bytes, attempting the versioned layout first and
/// falling back to the legacy layout.
pub fn parse_transaction(bytes: &[u8]) -> Result<VersionedTransaction, ProtocolError> {
    if let Ok(transaction) = bincode::deserialize::<VersionedTransaction>(bytes) {
        return Ok(transaction);
    }
    bincode::deserialize::<LegacyTransaction>(bytes)
        .map(VersionedTransaction::from)
        .map_err(|e| ProtocolError::InvalidTransactionFormat(format!("undecodable bytes: {e}")))
}
