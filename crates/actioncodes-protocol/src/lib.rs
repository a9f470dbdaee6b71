//! Strategy and façade layer of the action-code protocol.
//!
//! Hosts construct an [`ActionCodesProtocol`], register one adapter per
//! chain, and drive generation/validation/revocation through it. Private keys
//! never enter this crate: signing goes through the [`SignMessage`]
//! capability, verification through the registered [`ChainAdapter`]s.

pub mod adapter;
pub mod protocol;
pub mod sign;
pub mod strategy;

pub use adapter::ChainAdapter;
pub use protocol::{ActionCodesProtocol, GenerateRequest};
pub use sign::{LocalSigner, SignMessage};
pub use strategy::{delegation::DelegationStrategy, wallet::WalletStrategy};
