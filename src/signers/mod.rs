//! Signer capability.

mod r#dyn;
pub use r#dyn::DynSigner;

use alloy::primitives::{Address, B256, Signature};

/// Capability trait for everything the core signs.
///
/// Private-key-backed and external-wallet-backed implementations both satisfy
/// it; nothing downstream ever sees a raw key string.
#[async_trait::async_trait]
pub trait PayloadSigner: std::fmt::Debug + Send + Sync {
    /// The signer's address.
    fn address(&self) -> Address;

    /// Signs a 32-byte payload hash, such as an EIP-712 digest.
    async fn sign_payload_hash(&self, payload_hash: B256) -> eyre::Result<Signature>;

    /// Signs arbitrary bytes under the EIP-191 personal-message prefix.
    async fn sign_message(&self, message: &[u8]) -> eyre::Result<Signature>;
}
