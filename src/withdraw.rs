//! Withdrawal planning.
//!
//! Aggregated in-protocol balances are delivered to one destination chain
//! and address: a same-chain `withdraw` where source and destination match,
//! and a routed `bridgeWithdraw` everywhere else. Descriptors are
//! independent across chains: they may be submitted concurrently, and each
//! confirmation is awaited on its own; final balance deltas are aggregated
//! only after every descriptor reaches a terminal state.

use crate::{
    bridge::{RouteQuery, RouteSource},
    chains::Chains,
    error::{PlanError, SednError},
    types::{SednCall, TransactionDescriptor, TransactionPlan},
};
use alloy::primitives::{Address, ChainId, U256};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A request to deliver in-protocol balances to one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    /// The account whose deposited balances are paid out.
    pub sender: Address,
    /// Total amount to deliver, before bridge fees.
    pub total_amount: U256,
    /// The wallet receiving the funds.
    pub destination: Address,
    /// The chain the funds are delivered on.
    pub destination_chain_id: ChainId,
    /// How much each source chain contributes, in submission order.
    pub per_chain_amounts: Vec<(ChainId, U256)>,
}

/// Plans a withdrawal.
///
/// Bridge routes are fetched up front for every cross-chain leg, so a
/// routing failure aborts planning before anything is submitted.
pub async fn plan_withdrawal(
    chains: &Chains,
    route_source: &dyn RouteSource,
    request: &WithdrawalRequest,
) -> Result<TransactionPlan, SednError> {
    if request.total_amount.is_zero() {
        return Err(PlanError::ZeroAmount.into());
    }
    let split: U256 = request
        .per_chain_amounts
        .iter()
        .fold(U256::ZERO, |acc, (_, amount)| acc.saturating_add(*amount));
    if split != request.total_amount {
        return Err(PlanError::SplitMismatch {
            requested: request.total_amount,
            planned: split,
        }
        .into());
    }

    let destination_token = chains.get(request.destination_chain_id)?.network.token;

    let mut descriptors = Vec::new();
    for &(chain_id, amount) in &request.per_chain_amounts {
        if amount.is_zero() {
            continue;
        }
        let chain = chains.get(chain_id)?;

        let call = if chain_id == request.destination_chain_id {
            SednCall::Withdraw { amount, to: request.destination }
        } else {
            let route = route_source
                .best_route(&RouteQuery {
                    from_chain_id: chain_id,
                    to_chain_id: request.destination_chain_id,
                    from_token: chain.network.token,
                    to_token: destination_token,
                    amount,
                    sender: request.sender,
                    recipient: request.destination,
                })
                .await?;
            SednCall::BridgeWithdraw {
                amount,
                user_request: route.user_request,
                bridge_impl: route.bridge_impl,
            }
        };
        descriptors.push(TransactionDescriptor::new(chain_id, request.sender, call));
    }

    let plan = TransactionPlan::new(request.total_amount, descriptors)?;
    debug!(
        total = %request.total_amount,
        destination_chain = request.destination_chain_id,
        legs = plan.descriptors.len(),
        "planned withdrawal"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bridge::StubRouteSource, chains::Chain, config::NetworkConfig, forwarder::ForwarderSchema,
    };
    use alloy::{primitives::address, providers::{Provider, ProviderBuilder}};

    const POLYGON: ChainId = 137;
    const ARBITRUM: ChainId = 42161;
    const SENDER: Address = address!("00000000000000000000000000000000000000a1");
    const DESTINATION: Address = address!("00000000000000000000000000000000000000b2");

    fn chain(chain_id: ChainId) -> Chain {
        let network = NetworkConfig {
            chain_id,
            rpc_url: "http://localhost:8545".parse().unwrap(),
            forwarder: address!("00000000000000000000000000000000000000f0"),
            forwarder_schema: ForwarderSchema::Sedn,
            sedn: address!("00000000000000000000000000000000000000c3"),
            token: address!("00000000000000000000000000000000000000d4"),
            relay_endpoint: None,
        };
        Chain::with_provider(
            network,
            ProviderBuilder::new().connect_http("http://localhost:8545".parse().unwrap()).erased(),
        )
    }

    fn chains() -> Chains {
        Chains::new([chain(POLYGON), chain(ARBITRUM)])
    }

    fn stub() -> StubRouteSource {
        StubRouteSource { bridge_impl: address!("00000000000000000000000000000000000000c9") }
    }

    #[tokio::test]
    async fn destination_chain_withdraws_and_the_rest_bridges() {
        let request = WithdrawalRequest {
            sender: SENDER,
            total_amount: U256::from(2_000_000u64),
            destination: DESTINATION,
            destination_chain_id: POLYGON,
            per_chain_amounts: vec![
                (POLYGON, U256::from(1_000_000u64)),
                (ARBITRUM, U256::from(1_000_000u64)),
            ],
        };
        let plan = plan_withdrawal(&chains(), &stub(), &request).await.unwrap();

        assert_eq!(plan.descriptors.len(), 2);
        assert_eq!(
            plan.descriptors[0].call,
            SednCall::Withdraw { amount: U256::from(1_000_000u64), to: DESTINATION }
        );
        let SednCall::BridgeWithdraw { amount, user_request, .. } =
            plan.descriptors[1].call.clone()
        else {
            panic!("expected a bridged withdrawal")
        };
        assert_eq!(amount, U256::from(1_000_000u64));
        assert_eq!(user_request.toChainId, U256::from(POLYGON));
        assert_eq!(user_request.receiverAddress, DESTINATION);
        plan.verify_conservation().unwrap();
    }

    #[tokio::test]
    async fn split_must_sum_to_the_total() {
        let request = WithdrawalRequest {
            sender: SENDER,
            total_amount: U256::from(2_000_000u64),
            destination: DESTINATION,
            destination_chain_id: POLYGON,
            per_chain_amounts: vec![(POLYGON, U256::from(1_000_000u64))],
        };
        let err = plan_withdrawal(&chains(), &stub(), &request).await.unwrap_err();
        assert!(matches!(err, SednError::Plan(PlanError::SplitMismatch { .. })));
    }

    #[tokio::test]
    async fn zero_contributions_are_skipped() {
        let request = WithdrawalRequest {
            sender: SENDER,
            total_amount: U256::from(1_000_000u64),
            destination: DESTINATION,
            destination_chain_id: POLYGON,
            per_chain_amounts: vec![
                (POLYGON, U256::from(1_000_000u64)),
                (ARBITRUM, U256::ZERO),
            ],
        };
        let plan = plan_withdrawal(&chains(), &stub(), &request).await.unwrap();
        assert_eq!(plan.descriptors.len(), 1);
    }
}
