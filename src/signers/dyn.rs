//! Multi-signer abstraction.
//!
//! A signer abstracted over multiple underlying signers.
use super::PayloadSigner;
use alloy::{
    network::{FullSigner, TxSigner},
    primitives::{Address, B256, Signature},
    signers::{Signer, local::PrivateKeySigner},
};
use std::{fmt, ops::Deref, str::FromStr, sync::Arc};

/// Abstraction over local signer.
#[derive(Clone)]
pub struct DynSigner(pub Arc<dyn FullSigner<Signature> + Send + Sync>);

impl fmt::Debug for DynSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DynSigner").field(&self.address()).finish()
    }
}

impl DynSigner {
    /// Load a private key.
    pub fn from_signing_key(key: &str) -> eyre::Result<Self> {
        Ok(Self(Arc::new(PrivateKeySigner::from_str(key)?)))
    }

    /// Returns the signer's Ethereum Address.
    pub fn address(&self) -> Address {
        TxSigner::address(&self.0)
    }
}

impl From<PrivateKeySigner> for DynSigner {
    fn from(signer: PrivateKeySigner) -> Self {
        Self(Arc::new(signer))
    }
}

impl Deref for DynSigner {
    type Target = dyn FullSigner<Signature> + Send + Sync;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

#[async_trait::async_trait]
impl PayloadSigner for DynSigner {
    fn address(&self) -> Address {
        DynSigner::address(self)
    }

    async fn sign_payload_hash(&self, payload_hash: B256) -> eyre::Result<Signature> {
        Ok(self.sign_hash(&payload_hash).await?)
    }

    async fn sign_message(&self, message: &[u8]) -> eyre::Result<Signature> {
        Ok(Signer::sign_message(&*self.0, message).await?)
    }
}
