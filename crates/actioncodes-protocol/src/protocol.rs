use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use actioncodes_core::canonical::{generation_message, revoke_message};
use actioncodes_core::config::CodeGenerationConfig;
use actioncodes_core::error::ProtocolError;
use actioncodes_core::types::{
    now_ms, ActionCode, DelegatedActionCode, DelegationProof, IssuedCode, RevokedCode, TimestampMs,
};
use actioncodes_crypto::code_hash;

use crate::adapter::ChainAdapter;
use crate::sign::SignMessage;
use crate::strategy::{delegation::DelegationStrategy, wallet::WalletStrategy};

/// What to generate: a direct wallet code, or a delegated one under a
/// pre-signed proof.
#[derive(Clone, Debug)]
pub enum GenerateRequest {
    Wallet { pubkey: String },
    Delegation { proof: DelegationProof },
}

/// The protocol façade.
///
/// Owns the configuration, the two strategies, and the chain→adapter
/// registry. Everything else is injected: signing arrives through
/// [`SignMessage`], chain verification through registered [`ChainAdapter`]s.
/// Instances are independent; nothing here is process-global.
pub struct ActionCodesProtocol {
    wallet: WalletStrategy,
    delegation: DelegationStrategy,
    // Written at construction and through register_adapter; read-mostly
    // afterwards. Entries are immutable once inserted.
    adapters: RwLock<HashMap<String, Arc<dyn ChainAdapter>>>,
}

impl ActionCodesProtocol {
    pub fn new(config: CodeGenerationConfig) -> Result<Self, ProtocolError> {
        Ok(Self {
            wallet: WalletStrategy::new(config.clone())?,
            delegation: DelegationStrategy::new(config)?,
            adapters: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &CodeGenerationConfig {
        self.wallet.config()
    }

    // ── Adapter registry ─────────────────────────────────────────────────────

    pub fn register_adapter(&self, chain: impl Into<String>, adapter: Arc<dyn ChainAdapter>) {
        let chain = chain.into();
        debug!(%chain, "registering chain adapter");
        self.adapters
            .write()
            .expect("adapter registry lock poisoned")
            .insert(chain, adapter);
    }

    /// Look up the adapter for `chain`, or fail with `INVALID_ADAPTER`.
    pub fn get_adapter(&self, chain: &str) -> Result<Arc<dyn ChainAdapter>, ProtocolError> {
        self.adapters
            .read()
            .expect("adapter registry lock poisoned")
            .get(chain)
            .cloned()
            .ok_or_else(|| ProtocolError::InvalidAdapter(chain.to_string()))
    }

    // ── Generation ───────────────────────────────────────────────────────────

    /// Generate an action code, dispatching on the request variant. The only
    /// suspension point is the host's signing capability; if it fails, the
    /// error surfaces unchanged and no partial record escapes.
    pub async fn generate(
        &self,
        request: GenerateRequest,
        chain: &str,
        signer: &dyn SignMessage,
    ) -> Result<IssuedCode, ProtocolError> {
        match request {
            GenerateRequest::Wallet { pubkey } => self
                .generate_with_wallet(&pubkey, chain, signer)
                .await
                .map(IssuedCode::Wallet),
            GenerateRequest::Delegation { proof } => self
                .generate_with_delegation(proof, chain, signer)
                .await
                .map(IssuedCode::Delegated),
        }
    }

    pub async fn generate_with_wallet(
        &self,
        pubkey: &str,
        chain: &str,
        signer: &dyn SignMessage,
    ) -> Result<ActionCode, ProtocolError> {
        self.get_adapter(chain)?;

        let window_start = now_ms();
        let message = generation_message(pubkey, window_start)?;
        let signature = signer.sign(&message, chain).await?;
        let code = self.wallet.generate_code(&message, chain, &signature)?;
        debug!(chain, expires_at = code.expires_at, "issued wallet action code");
        Ok(code)
    }

    pub async fn generate_with_delegation(
        &self,
        proof: DelegationProof,
        chain: &str,
        signer: &dyn SignMessage,
    ) -> Result<DelegatedActionCode, ProtocolError> {
        self.get_adapter(chain)?;

        let window_start = now_ms();
        self.delegation.validate_proof_at(&proof, window_start)?;

        let message = generation_message(&proof.delegated_pubkey, window_start)?;
        let signature = signer.sign(&message, chain).await?;
        let code = self
            .delegation
            .generate_delegated_code_at(&proof, &message, chain, &signature, window_start)?;
        debug!(
            chain,
            expires_at = code.code.expires_at,
            "issued delegated action code"
        );
        Ok(code)
    }

    // ── Validation ───────────────────────────────────────────────────────────

    pub fn validate(&self, code: &IssuedCode) -> Result<(), ProtocolError> {
        self.validate_at(code, now_ms())
    }

    /// Strategy invariants first (precise error kinds), then the chain
    /// adapter; an adapter `false` is reported as `INVALID_SIGNATURE`.
    pub fn validate_at(&self, code: &IssuedCode, now: TimestampMs) -> Result<(), ProtocolError> {
        let adapter = self.get_adapter(code.chain())?;
        let verified = match code {
            IssuedCode::Wallet(code) => {
                self.wallet.validate_code_at(code, now)?;
                adapter.verify_with_wallet(code)
            }
            IssuedCode::Delegated(delegated) => {
                self.delegation.validate_delegated_code_at(delegated, now)?;
                adapter.verify_with_delegation(delegated)
            }
        };
        if !verified {
            return Err(ProtocolError::InvalidSignature);
        }
        debug!(chain = code.chain(), "action code validated");
        Ok(())
    }

    // ── Revocation ───────────────────────────────────────────────────────────

    /// Sign and verify a revocation. The returned receipt is the only record
    /// of the revocation — the core stores nothing.
    pub async fn revoke(
        &self,
        code: &IssuedCode,
        signer: &dyn SignMessage,
    ) -> Result<RevokedCode, ProtocolError> {
        let adapter = self.get_adapter(code.chain())?;
        let action_code = code.action_code();

        let hash = code_hash(&action_code.code);
        let message = revoke_message(&action_code.pubkey, &hash, action_code.timestamp)?;
        let revoke_signature = signer.sign(&message, &action_code.chain).await?;
        if revoke_signature.is_empty() {
            return Err(ProtocolError::InvalidSignature);
        }

        let verified = match code {
            IssuedCode::Wallet(wallet) => {
                adapter.verify_revoke_with_wallet(wallet, &revoke_signature)
            }
            IssuedCode::Delegated(delegated) => {
                adapter.verify_revoke_with_delegation(delegated, &revoke_signature)
            }
        };
        if !verified {
            return Err(ProtocolError::InvalidSignature);
        }

        debug!(chain = code.chain(), "action code revoked");
        Ok(RevokedCode {
            issued: code.clone(),
            revoke_signature,
            revoked_at: now_ms(),
        })
    }
}
