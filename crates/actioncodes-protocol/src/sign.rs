use async_trait::async_trait;

use actioncodes_core::error::ProtocolError;
use actioncodes_crypto::Ed25519Keypair;

/// The host-supplied signing capability.
///
/// The core never holds a private key: generation and revocation hand the
/// canonical message bytes to this trait and await the signature in the
/// chain's string encoding (base58 for Ed25519 chains). Errors surface to the
/// caller unchanged; no partially-built record escapes a failed signing call.
#[async_trait]
pub trait SignMessage: Send + Sync {
    async fn sign(&self, message: &[u8], chain: &str) -> Result<String, ProtocolError>;
}

/// In-process signer backed by an [`Ed25519Keypair`]. Convenience for hosts
/// that keep the key locally (wallets, tests); remote-signer hosts implement
/// [`SignMessage`] themselves.
pub struct LocalSigner {
    keypair: Ed25519Keypair,
}

impl LocalSigner {
    pub fn new(keypair: Ed25519Keypair) -> Self {
        Self { keypair }
    }

    /// Base58 public key of the underlying keypair.
    pub fn pubkey_b58(&self) -> String {
        self.keypair.pubkey_b58()
    }
}

#[async_trait]
impl SignMessage for LocalSigner {
    async fn sign(&self, message: &[u8], _chain: &str) -> Result<String, ProtocolError> {
        Ok(self.keypair.sign_b58(message))
    }
}
