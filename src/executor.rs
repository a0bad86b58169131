//! Plan execution pipeline.
//!
//! Drives a plan through sign → relay → poll. Within one chain, descriptors
//! run strictly in order: each is signed against the freshly read forwarder
//! nonce and must confirm before its successor is submitted (allowance bumps
//! gate the pulls that depend on them). Chains run concurrently with no join
//! barrier beyond final aggregation, and a failure on one chain never rolls
//! back another; there is no cross-chain atomicity at this layer.

use crate::{
    chains::{Chain, Chains},
    config::SednConfig,
    constants::{DEFAULT_RECEIPT_TIMEOUT, META_TX_VALIDITY_SECS},
    error::SednError,
    execution::{ExecutionClient, ExecutionKind, ExecutionStatus, aggregate_status},
    fees::FeeOracle,
    forwarder::{MetaTxParams, build_meta_tx},
    poll::watch_receipt,
    relay::RelayClient,
    signers::DynSigner,
    types::{DescriptorStatus, TransactionDescriptor, TransactionPlan},
};
use alloy::primitives::ChainId;
use futures_util::future::join_all;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Executes transaction plans against the supported chains.
#[derive(Debug, Clone)]
pub struct Executor {
    chains: Chains,
    relay: RelayClient,
    fees: FeeOracle,
    execution: Option<ExecutionClient>,
    gasless: bool,
    receipt_timeout: Duration,
}

impl Executor {
    /// Builds an executor from the registry and configuration.
    pub fn new(chains: Chains, config: &SednConfig) -> Self {
        Self {
            chains,
            relay: RelayClient::new(),
            fees: FeeOracle::new(),
            execution: config.execution_api.clone().map(ExecutionClient::new),
            gasless: config.relay.gasless,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
        }
    }

    /// Overrides the per-receipt wait bound.
    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    /// Overrides the fee oracle used on the direct submission path.
    pub fn with_fee_oracle(mut self, fees: FeeOracle) -> Self {
        self.fees = fees;
        self
    }

    /// Executes a plan in place, updating each descriptor's status.
    ///
    /// Returns the aggregate status. The execution record (when a status
    /// service is configured) flips to `failed` on the first terminal
    /// descriptor error, while descriptors on other chains keep running.
    pub async fn execute(
        &self,
        kind: ExecutionKind,
        plan: &mut TransactionPlan,
        signer: &DynSigner,
    ) -> Result<ExecutionStatus, SednError> {
        let execution_id = match &self.execution {
            Some(client) => Some(client.create(kind, &plan.descriptors).await?.id),
            None => None,
        };

        let groups = group_by_chain(std::mem::take(&mut plan.descriptors));
        let results = join_all(groups.into_iter().map(|(chain_id, group)| {
            let execution_id = execution_id.clone();
            async move {
                match self.chains.get(chain_id) {
                    Ok(chain) => {
                        self.run_chain(chain, group, signer, execution_id.as_deref()).await
                    }
                    Err(err) => {
                        let reason = err.to_string();
                        group
                            .into_iter()
                            .map(|(index, mut descriptor)| {
                                descriptor.status = DescriptorStatus::Failed(reason.clone());
                                (index, descriptor)
                            })
                            .collect()
                    }
                }
            }
        }))
        .await;

        let mut descriptors: Vec<_> = results.into_iter().flatten().collect();
        descriptors.sort_by_key(|(index, _)| *index);
        plan.descriptors = descriptors.into_iter().map(|(_, descriptor)| descriptor).collect();

        let status = aggregate_status(&plan.descriptors);
        if let (Some(client), Some(id)) = (&self.execution, execution_id.as_deref())
            && status.is_terminal()
            && let Err(err) = client.update(id, status).await
        {
            warn!(%err, "failed to report final execution status");
        }
        Ok(status)
    }

    /// Runs one chain's descriptors in order.
    ///
    /// After a terminal failure the rest of the queue is not submitted: the
    /// remaining descriptors depend on their predecessors (allowances,
    /// nonces) and would either revert or execute against the wrong state.
    async fn run_chain(
        &self,
        chain: &Chain,
        group: Vec<(usize, TransactionDescriptor)>,
        signer: &DynSigner,
        execution_id: Option<&str>,
    ) -> Vec<(usize, TransactionDescriptor)> {
        let mut done = Vec::with_capacity(group.len());
        let mut halted: Option<&'static str> = None;
        for (index, mut descriptor) in group {
            if let Some(reason) = halted {
                descriptor.status = DescriptorStatus::Failed(format!("not submitted: {reason}"));
                done.push((index, descriptor));
                continue;
            }

            if let Err(err) = self.run_descriptor(chain, &mut descriptor, signer).await {
                if matches!(err, SednError::Timeout(_)) {
                    // The transaction may still confirm later; the descriptor
                    // stays submitted, but nothing that depends on it can be
                    // safely fired.
                    warn!(chain_id = chain.chain_id(), %err, "receipt wait timed out");
                    halted = Some("predecessor unconfirmed");
                } else {
                    descriptor.status = DescriptorStatus::Failed(err.to_string());
                    halted = Some("predecessor failed");
                    if let (Some(client), Some(id)) = (&self.execution, execution_id)
                        && let Err(report_err) = client.update(id, ExecutionStatus::Failed).await
                    {
                        warn!(%report_err, "failed to report execution failure");
                    }
                }
            }
            done.push((index, descriptor));
        }
        done
    }

    /// Signs, submits and confirms a single descriptor.
    async fn run_descriptor(
        &self,
        chain: &Chain,
        descriptor: &mut TransactionDescriptor,
        signer: &DynSigner,
    ) -> Result<(), SednError> {
        if descriptor.from != signer.address() {
            return Err(SednError::SignerMismatch {
                expected: descriptor.from,
                got: signer.address(),
            });
        }

        let data = descriptor.call.abi_encode();
        let target = descriptor.call.target(chain.network.token, chain.network.sedn);

        let tx_hash = match (&chain.network.relay_endpoint, self.gasless) {
            (Some(endpoint), true) => {
                let params = MetaTxParams {
                    from: descriptor.from,
                    to: target,
                    chain_id: chain.chain_id(),
                    value: descriptor.value,
                    valid_until: unix_now() + META_TX_VALIDITY_SECS,
                    data,
                };
                let signed = build_meta_tx(
                    &chain.provider,
                    chain.network.forwarder,
                    chain.network.forwarder_schema,
                    params,
                    signer,
                )
                .await?;
                descriptor.status = DescriptorStatus::Signed;
                self.relay.submit_meta_tx(&chain.provider, endpoint, &signed).await?
            }
            _ => {
                self.relay
                    .submit_direct(
                        &chain.provider,
                        &self.fees,
                        chain.chain_id(),
                        signer,
                        target,
                        data,
                        descriptor.value,
                    )
                    .await?
            }
        };
        descriptor.status = DescriptorStatus::Submitted(tx_hash);
        debug!(chain_id = chain.chain_id(), %tx_hash, "descriptor submitted");

        let receipt = watch_receipt(&chain.provider, tx_hash, self.receipt_timeout).await?;
        if receipt.status() {
            descriptor.status = DescriptorStatus::Confirmed(tx_hash);
            Ok(())
        } else {
            Err(SednError::Reverted { tx_hash, reason: None })
        }
    }
}

/// Groups descriptors by chain, keeping each chain's emission order and
/// tagging every descriptor with its position in the plan.
fn group_by_chain(
    descriptors: Vec<TransactionDescriptor>,
) -> Vec<(ChainId, Vec<(usize, TransactionDescriptor)>)> {
    let mut groups: Vec<(ChainId, Vec<(usize, TransactionDescriptor)>)> = Vec::new();
    for (index, descriptor) in descriptors.into_iter().enumerate() {
        match groups.iter_mut().find(|(chain_id, _)| *chain_id == descriptor.chain_id) {
            Some((_, group)) => group.push((index, descriptor)),
            None => groups.push((descriptor.chain_id, vec![(index, descriptor)])),
        }
    }
    groups
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|elapsed| elapsed.as_secs()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SednCall;
    use alloy::primitives::{Address, U256};

    fn descriptor(chain_id: ChainId, amount: u64) -> TransactionDescriptor {
        TransactionDescriptor::new(
            chain_id,
            Address::ZERO,
            SednCall::TransferKnown { amount: U256::from(amount), to: Address::ZERO },
        )
    }

    #[test]
    fn grouping_keeps_per_chain_order_across_interleaved_plans() {
        let groups = group_by_chain(vec![
            descriptor(137, 1),
            descriptor(42161, 2),
            descriptor(137, 3),
            descriptor(10, 4),
            descriptor(42161, 5),
        ]);

        let chains: Vec<_> = groups.iter().map(|(chain_id, _)| *chain_id).collect();
        assert_eq!(chains, [137, 42161, 10]);

        let polygon: Vec<_> = groups[0].1.iter().map(|(index, _)| *index).collect();
        assert_eq!(polygon, [0, 2]);
        let arbitrum: Vec<_> = groups[1].1.iter().map(|(index, _)| *index).collect();
        assert_eq!(arbitrum, [1, 4]);
    }
}
