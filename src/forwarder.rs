//! Forwarder meta-transaction construction.
//!
//! Two forwarder generations exist in the wild with different request shapes
//! and EIP-712 domains. A request hashed under the wrong schema still yields a
//! recoverable signature, just for the wrong address, so the schema is a
//! tagged property of the forwarder deployment and never inferred from a
//! request.

use crate::{
    constants::META_TX_GAS_LIMIT,
    error::{ConfigError, SednError},
    signers::PayloadSigner,
    types::{minimal_forwarder, sedn_forwarder},
};
use alloy::{
    primitives::{Address, B256, Bytes, ChainId, Signature, U256},
    providers::DynProvider,
    sol_types::{Eip712Domain, SolStruct},
    transports::RpcError,
};
use serde::{Deserialize, Serialize};

/// Wire schema of a deployed forwarder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForwarderSchema {
    /// Legacy six-field `ForwardRequest`, domain name `MinimalForwarder`.
    Minimal,
    /// Extended eight-field `ForwardRequest`, domain name `SednForwarder`.
    Sedn,
}

impl ForwarderSchema {
    /// EIP-712 domain for a forwarder deployed at `address` on `chain_id`.
    pub fn domain(&self, address: Address, chain_id: ChainId) -> Eip712Domain {
        match self {
            Self::Minimal => Eip712Domain {
                name: Some("MinimalForwarder".into()),
                version: Some("0.0.1".into()),
                chain_id: Some(U256::from(chain_id)),
                verifying_contract: Some(address),
                salt: None,
            },
            // The extended request signs the chain id as a message field, so
            // the domain omits it.
            Self::Sedn => Eip712Domain {
                name: Some("SednForwarder".into()),
                version: Some("0.0.2".into()),
                chain_id: None,
                verifying_contract: Some(address),
                salt: None,
            },
        }
    }
}

/// Meta-transaction parameters prior to nonce assignment and signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTxParams {
    /// The original signer the forwarder re-executes as.
    pub from: Address,
    /// The contract the inner call targets.
    pub to: Address,
    /// Chain the forwarder is deployed on.
    pub chain_id: ChainId,
    /// Native value forwarded with the inner call.
    pub value: U256,
    /// Deadline after which the request is no longer executable, as a unix
    /// timestamp. Ignored by the legacy schema.
    pub valid_until: u64,
    /// ABI-encoded inner call.
    pub data: Bytes,
}

/// A forward request in either wire schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForwardRequest {
    /// Legacy request shape.
    Minimal(minimal_forwarder::ForwardRequest),
    /// Extended request shape.
    Sedn(sedn_forwarder::ForwardRequest),
}

impl ForwardRequest {
    /// Builds the request for `params` at `nonce` under `schema`.
    ///
    /// The gas field is fixed to [`META_TX_GAS_LIMIT`]: exact estimation of
    /// the inner call is impractical client-side, so a generous upper bound is
    /// signed instead.
    pub fn build(schema: ForwarderSchema, params: &MetaTxParams, nonce: U256) -> Self {
        match schema {
            ForwarderSchema::Minimal => Self::Minimal(minimal_forwarder::ForwardRequest {
                from: params.from,
                to: params.to,
                value: params.value,
                gas: U256::from(META_TX_GAS_LIMIT),
                nonce,
                data: params.data.clone(),
            }),
            ForwarderSchema::Sedn => Self::Sedn(sedn_forwarder::ForwardRequest {
                from: params.from,
                to: params.to,
                chainid: U256::from(params.chain_id),
                value: params.value,
                gas: U256::from(META_TX_GAS_LIMIT),
                nonce,
                valid: U256::from(params.valid_until),
                data: params.data.clone(),
            }),
        }
    }

    /// The schema this request was built under.
    pub fn schema(&self) -> ForwarderSchema {
        match self {
            Self::Minimal(_) => ForwarderSchema::Minimal,
            Self::Sedn(_) => ForwarderSchema::Sedn,
        }
    }

    /// The nonce signed into the request.
    pub fn nonce(&self) -> U256 {
        match self {
            Self::Minimal(request) => request.nonce,
            Self::Sedn(request) => request.nonce,
        }
    }

    /// The original signer.
    pub fn from(&self) -> Address {
        match self {
            Self::Minimal(request) => request.from,
            Self::Sedn(request) => request.from,
        }
    }

    /// The EIP-712 signing hash of the request under `domain`.
    pub fn signing_hash(&self, domain: &Eip712Domain) -> B256 {
        match self {
            Self::Minimal(request) => request.eip712_signing_hash(domain),
            Self::Sedn(request) => request.eip712_signing_hash(domain),
        }
    }
}

/// A signed forwarder request, ready for relay submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMetaTx {
    /// The forwarder the request is addressed to.
    pub forwarder: Address,
    /// Chain the forwarder lives on.
    pub chain_id: ChainId,
    /// The signed request.
    pub request: ForwardRequest,
    /// Signature over the request's EIP-712 digest.
    pub signature: Signature,
}

impl SignedMetaTx {
    /// Re-derives the EIP-712 digest the signature covers.
    pub fn signing_hash(&self) -> B256 {
        self.request.signing_hash(&self.request.schema().domain(self.forwarder, self.chain_id))
    }

    /// Recovers the signer address from the signature.
    ///
    /// Run before submission: a key or domain mismatch surfaces here instead
    /// of as an opaque rejection at the relay.
    pub fn recover_signer(&self) -> Result<Address, alloy::primitives::SignatureError> {
        self.signature.recover_address_from_prehash(&self.signing_hash())
    }

    /// The signature in its 65-byte r || s || v wire encoding.
    pub fn signature_bytes(&self) -> Bytes {
        self.signature.as_bytes().to_vec().into()
    }
}

/// Reads the forwarder's current nonce for `from`.
///
/// The nonce is read fresh before every signing and never cached: it is the
/// one shared mutable resource owned by the chain, and a retry after a nonce
/// race requires re-signing against the new value. A revert here means the
/// forwarder is not deployed on this chain, which is a configuration error
/// and not retried.
pub async fn fetch_nonce(
    provider: &DynProvider,
    forwarder: Address,
    from: Address,
    chain_id: ChainId,
) -> Result<U256, SednError> {
    sedn_forwarder::ISednForwarder::new(forwarder, provider.clone())
        .getNonce(from)
        .call()
        .await
        .map_err(|err| match err {
            alloy::contract::Error::TransportError(RpcError::ErrorResp(_)) => {
                ConfigError::MissingForwarder(chain_id).into()
            }
            other => SednError::from(other),
        })
}

/// Signs `params` at an explicit `nonce` under `schema`, self-verifying the
/// produced signature.
pub async fn sign_meta_tx(
    forwarder: Address,
    schema: ForwarderSchema,
    params: &MetaTxParams,
    nonce: U256,
    signer: &dyn PayloadSigner,
) -> Result<SignedMetaTx, SednError> {
    let request = ForwardRequest::build(schema, params, nonce);
    let digest = request.signing_hash(&schema.domain(forwarder, params.chain_id));
    let signature = signer.sign_payload_hash(digest).await?;

    let signed =
        SignedMetaTx { forwarder, chain_id: params.chain_id, request, signature };

    let recovered = signed.recover_signer()?;
    if recovered != signer.address() {
        return Err(SednError::SignerMismatch { expected: signer.address(), got: recovered });
    }

    Ok(signed)
}

/// Builds and signs a meta-transaction against the forwarder's current
/// on-chain nonce.
pub async fn build_meta_tx(
    provider: &DynProvider,
    forwarder: Address,
    schema: ForwarderSchema,
    params: MetaTxParams,
    signer: &dyn PayloadSigner,
) -> Result<SignedMetaTx, SednError> {
    let nonce = fetch_nonce(provider, forwarder, params.from, params.chain_id).await?;
    sign_meta_tx(forwarder, schema, &params, nonce, signer).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signers::DynSigner;
    use alloy::{primitives::address, signers::local::PrivateKeySigner};

    fn params(from: Address) -> MetaTxParams {
        MetaTxParams {
            from,
            to: address!("00000000000000000000000000000000000000aa"),
            chain_id: 137,
            value: U256::ZERO,
            valid_until: 1_900_000_000,
            data: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
        }
    }

    #[tokio::test]
    async fn recover_round_trips_for_both_schemas() {
        let signer = DynSigner::from(PrivateKeySigner::random());
        let forwarder = address!("00000000000000000000000000000000000000f0");

        for schema in [ForwarderSchema::Minimal, ForwarderSchema::Sedn] {
            let signed =
                sign_meta_tx(forwarder, schema, &params(signer.address()), U256::ZERO, &signer)
                    .await
                    .unwrap();
            assert_eq!(signed.recover_signer().unwrap(), signer.address());
        }
    }

    #[tokio::test]
    async fn schema_mismatch_recovers_a_different_signer() {
        let signer = DynSigner::from(PrivateKeySigner::random());
        let forwarder = address!("00000000000000000000000000000000000000f0");
        let params = params(signer.address());

        let signed =
            sign_meta_tx(forwarder, ForwarderSchema::Sedn, &params, U256::ZERO, &signer)
                .await
                .unwrap();

        // Re-hash the same signature under the legacy domain and schema.
        let wrong_request =
            ForwardRequest::build(ForwarderSchema::Minimal, &params, U256::ZERO);
        let wrong_digest = wrong_request
            .signing_hash(&ForwarderSchema::Minimal.domain(forwarder, params.chain_id));
        let recovered =
            signed.signature.recover_address_from_prehash(&wrong_digest).unwrap();
        assert_ne!(recovered, signer.address());
    }

    #[tokio::test]
    async fn nonces_are_signed_in_sequence() {
        let signer = DynSigner::from(PrivateKeySigner::random());
        let forwarder = address!("00000000000000000000000000000000000000f0");
        let params = params(signer.address());

        let mut previous = None;
        for nonce in 0u64..3 {
            let signed = sign_meta_tx(
                forwarder,
                ForwarderSchema::Sedn,
                &params,
                U256::from(nonce),
                &signer,
            )
            .await
            .unwrap();

            if let Some(previous) = previous {
                assert!(signed.request.nonce() > previous);
            }
            previous = Some(signed.request.nonce());
        }
    }

    #[test]
    fn gas_bound_is_fixed() {
        let request = ForwardRequest::build(
            ForwarderSchema::Minimal,
            &params(address!("00000000000000000000000000000000000000bb")),
            U256::from(7),
        );
        let ForwardRequest::Minimal(request) = request else { panic!("wrong schema") };
        assert_eq!(request.gas, U256::from(META_TX_GAS_LIMIT));
        assert_eq!(request.nonce, U256::from(7));
    }
}
