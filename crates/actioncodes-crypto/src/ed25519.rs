use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

/// Decode a base58 public key, accepting exactly 32 bytes.
pub fn decode_pubkey(encoded: &str) -> Option<[u8; 32]> {
    let bytes = bs58::decode(encoded).into_vec().ok()?;
    bytes.try_into().ok()
}

/// Decode a base58 signature, accepting exactly 64 bytes.
pub fn decode_signature(encoded: &str) -> Option<[u8; 64]> {
    let bytes = bs58::decode(encoded).into_vec().ok()?;
    bytes.try_into().ok()
}

/// Verify a detached Ed25519 signature. Returns `false` for any failure —
/// an off-curve key, a malformed signature, or a mismatch — so callers can
/// keep a fixed control flow regardless of the cause.
pub fn verify_detached(pubkey: &[u8; 32], message: &[u8], signature: &[u8; 64]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(pubkey) else {
        return false;
    };
    let sig = Signature::from_bytes(signature);
    verifying_key.verify(message, &sig).is_ok()
}

/// An Ed25519 keypair for hosts and tests. The protocol core itself never
/// holds one — signing always goes through the injected capability.
pub struct Ed25519Keypair {
    signing_key: SigningKey,
}

impl Ed25519Keypair {
    /// Generate a fresh keypair.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut rand::thread_rng()),
        }
    }

    /// Restore from a 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Base58-encoded public key.
    pub fn pubkey_b58(&self) -> String {
        bs58::encode(self.signing_key.verifying_key().as_bytes()).into_string()
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Sign a message; Ed25519 is deterministic, no RNG involved.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Sign and return the signature base58-encoded, the protocol's wire
    /// form.
    pub fn sign_b58(&self, message: &[u8]) -> String {
        bs58::encode(self.sign(message)).into_string()
    }
}

impl Drop for Ed25519Keypair {
    fn drop(&mut self) {
        // Wipe the seed copy on drop.
        use zeroize::Zeroize;
        let mut seed = self.signing_key.to_bytes();
        seed.zeroize();
    }
}

impl std::fmt::Debug for Ed25519Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Keypair {{ pubkey: {} }}", self.pubkey_b58())
    }
}
