//! Relay submission client.
//!
//! Two submission paths exist. The gasless path hands a signed forwarder
//! request to the relay webhook, which verifies it on-chain and executes it
//! with the relayer's own funds. The direct path signs and broadcasts the
//! call from the sender's own key, paying gas, for setups where no relay is
//! available or wanted.

use crate::{
    constants::RELAY_GAS_BUFFER,
    error::{RelayApiError, SednError},
    fees::FeeOracle,
    forwarder::{ForwardRequest, SignedMetaTx},
    signers::DynSigner,
    types::{minimal_forwarder::IMinimalForwarder, sedn_forwarder::ISednForwarder},
};
use alloy::{
    consensus::{SignableTransaction, TxEip1559, TxEnvelope},
    eips::eip2718::Encodable2718,
    network::{TransactionBuilder, TxSigner},
    primitives::{Address, B256, Bytes, ChainId, U256},
    providers::{DynProvider, Provider},
    rpc::types::TransactionRequest,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// Webhook request body: the signed forwarder request.
#[derive(Debug, Serialize)]
struct RelayPayload<'a> {
    request: &'a ForwardRequest,
    signature: Bytes,
}

/// Webhook response body, JSON-wrapped.
#[derive(Debug, Deserialize)]
struct RelayResponse {
    result: RelayResult,
}

#[derive(Debug, Deserialize)]
struct RelayResult {
    #[serde(rename = "txHash")]
    tx_hash: B256,
}

/// Client for both submission paths.
#[derive(Debug, Clone, Default)]
pub struct RelayClient {
    http: reqwest::Client,
}

impl RelayClient {
    /// Creates a new [`RelayClient`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Submits a signed meta-transaction to the relay webhook.
    ///
    /// The request is checked against the forwarder's `verify()` first, so an
    /// invalid signature or stale nonce surfaces as a typed
    /// [`RelayApiError::Rejected`] instead of an opaque relay failure. A
    /// rejected request must be re-derived against a fresh nonce and
    /// re-signed, never re-submitted as-is.
    pub async fn submit_meta_tx(
        &self,
        provider: &DynProvider,
        endpoint: &Url,
        signed: &SignedMetaTx,
    ) -> Result<B256, SednError> {
        let verified = match &signed.request {
            ForwardRequest::Minimal(request) => {
                IMinimalForwarder::new(signed.forwarder, provider.clone())
                    .verify(request.clone(), signed.signature_bytes())
                    .call()
                    .await?
            }
            ForwardRequest::Sedn(request) => {
                ISednForwarder::new(signed.forwarder, provider.clone())
                    .verify(request.clone(), signed.signature_bytes())
                    .call()
                    .await?
            }
        };
        if !verified {
            return Err(
                RelayApiError::Rejected("invalid signature or stale nonce".to_string()).into()
            );
        }

        let response = self
            .http
            .post(endpoint.clone())
            .json(&RelayPayload { request: &signed.request, signature: signed.signature_bytes() })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayApiError::Status(status).into());
        }

        let body: RelayResponse = response
            .json()
            .await
            .map_err(|err| RelayApiError::MalformedResponse(err.to_string()))?;

        debug!(
            chain_id = signed.chain_id,
            from = %signed.request.from(),
            tx_hash = %body.result.tx_hash,
            "relay accepted meta-transaction"
        );
        Ok(body.result.tx_hash)
    }

    /// Signs and broadcasts a contract call from the sender's own key.
    ///
    /// Gas is estimated against the node and padded with the same fixed
    /// margin the relay applies to forwarded executions; fee parameters come
    /// from the chain's fee oracle.
    pub async fn submit_direct(
        &self,
        provider: &DynProvider,
        fees: &FeeOracle,
        chain_id: ChainId,
        signer: &DynSigner,
        to: Address,
        data: Bytes,
        value: U256,
    ) -> Result<B256, SednError> {
        let from = signer.address();
        let estimation = fees.estimate(chain_id, provider).await?;
        let gas_limit = provider
            .estimate_gas(
                TransactionRequest::default()
                    .with_from(from)
                    .with_to(to)
                    .with_input(data.clone())
                    .with_value(value),
            )
            .await?
            + RELAY_GAS_BUFFER;
        let nonce = provider.get_transaction_count(from).pending().await?;

        let mut tx = TxEip1559 {
            chain_id,
            nonce,
            gas_limit,
            max_fee_per_gas: estimation.max_fee_per_gas,
            max_priority_fee_per_gas: estimation.max_priority_fee_per_gas,
            to: to.into(),
            value,
            input: data,
            access_list: Default::default(),
        };
        let signature =
            TxSigner::sign_transaction(&*signer.0, &mut tx).await.map_err(eyre::Error::from)?;
        let envelope = TxEnvelope::from(tx.into_signed(signature));

        let pending = provider.send_raw_transaction(&envelope.encoded_2718()).await?;
        let tx_hash = *pending.tx_hash();
        debug!(chain_id, %from, %tx_hash, "broadcasted direct transaction");
        Ok(tx_hash)
    }
}
