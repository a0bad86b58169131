//! Transfer planning.
//!
//! Turns a transfer intent plus the sender's observed funding into an
//! ordered transaction plan. The decision per contributing chain:
//!
//! - deposited balance covers the contribution → `transferKnown` /
//!   `transferUnknown`
//! - only wallet tokens cover it → `sednKnown` / `sednUnknown`
//! - both are needed → the hybrid variants, whose two portions must sum to
//!   the contribution
//!
//! Any pull from the wallet is gated on the current token allowance; when it
//! falls short, an `increaseAllowance` descriptor is emitted immediately
//! before the pull and must confirm before the pull is submitted.

use crate::{
    chains::Chains,
    error::{PlanError, SednError},
    types::{
        ChainFunds, FundingState, Recipient, SednCall, Secret, Solution, TransactionDescriptor,
        TransactionPlan, TransferIntent,
    },
};
use alloy::primitives::{Address, ChainId, U256};
use tracing::debug;

/// A planned transfer: the plan itself plus, for unknown recipients, the
/// claim credential that must reach the claimant out of band.
#[derive(Debug)]
pub struct PlannedTransfer {
    /// The ordered descriptors to execute.
    pub plan: TransactionPlan,
    /// The commit-reveal pair backing the transfer, when the recipient could
    /// not be resolved to an address. One pair per transfer, shared across
    /// all contributing chains.
    pub claim: Option<(Solution, Secret)>,
}

/// Reads the sender's funding on every origin chain.
pub async fn observe_funding(
    chains: &Chains,
    sender: Address,
    origin_chains: &[ChainId],
) -> Result<FundingState, SednError> {
    let mut state = FundingState::new();
    for chain_id in origin_chains {
        let chain = chains.get(*chain_id)?;
        let token = chain.token();
        let sedn = chain.sedn();
        let token_balance_call = token.balanceOf(sender);
        let allowance_call = token.allowance(sender, chain.network.sedn);
        let deposited_call = sedn.balanceOf(sender);
        let (token_balance, allowance, deposited) = tokio::try_join!(
            token_balance_call.call(),
            allowance_call.call(),
            deposited_call.call(),
        )?;
        state = state.with_chain(*chain_id, ChainFunds { token_balance, deposited, allowance });
    }
    Ok(state)
}

/// Plans a transfer against the observed funding.
///
/// Draws from the intent's origin chains in order until the amount is
/// covered. Insufficient aggregate balance is a terminal planning error: no
/// descriptors are emitted. The returned plan satisfies the conservation
/// invariant (descriptor amounts sum exactly to the requested amount).
pub fn plan_transfer(
    chains: &Chains,
    intent: &TransferIntent,
    funding: &FundingState,
) -> Result<PlannedTransfer, SednError> {
    if intent.amount.is_zero() {
        return Err(PlanError::ZeroAmount.into());
    }

    let available = funding.available_on(&intent.origin_chains);
    if available < intent.amount {
        return Err(PlanError::InsufficientBalance {
            required: intent.amount,
            available,
            deficit: intent.amount - available,
        }
        .into());
    }

    let claim = match &intent.recipient {
        Recipient::Known(_) => None,
        Recipient::Unknown(_) => {
            let solution = Solution::generate();
            let secret = solution.secret();
            Some((solution, secret))
        }
    };

    let mut descriptors = Vec::new();
    let mut remaining = intent.amount;
    for &chain_id in &intent.origin_chains {
        if remaining.is_zero() {
            break;
        }
        let spender = chains.get(chain_id)?.network.sedn;
        let funds = funding.get(chain_id).ok_or(PlanError::UnknownChain(chain_id))?;
        let contribution = remaining.min(funds.available());
        if contribution.is_zero() {
            continue;
        }

        plan_chain_contribution(
            &mut descriptors,
            chain_id,
            spender,
            intent,
            funds,
            contribution,
            claim.as_ref().map(|(_, secret)| *secret),
        )?;
        remaining -= contribution;
    }

    let plan = TransactionPlan::new(intent.amount, descriptors)?;
    debug!(
        amount = %intent.amount,
        descriptors = plan.descriptors.len(),
        chains = ?plan.chains(),
        unknown_recipient = claim.is_some(),
        "planned transfer"
    );
    Ok(PlannedTransfer { plan, claim })
}

/// Emits the descriptor(s) covering one chain's contribution.
fn plan_chain_contribution(
    descriptors: &mut Vec<TransactionDescriptor>,
    chain_id: ChainId,
    spender: Address,
    intent: &TransferIntent,
    funds: &ChainFunds,
    contribution: U256,
    secret: Option<Secret>,
) -> Result<(), PlanError> {
    let from_deposit = contribution.min(funds.deposited);
    let pulled = contribution - from_deposit;

    // The hybrid split must reassemble the contribution exactly.
    if pulled + from_deposit != contribution {
        return Err(PlanError::SplitMismatch {
            requested: contribution,
            planned: pulled + from_deposit,
        });
    }

    if !pulled.is_zero() && funds.allowance < pulled {
        descriptors.push(TransactionDescriptor::new(
            chain_id,
            intent.sender,
            SednCall::IncreaseAllowance { spender, amount: pulled - funds.allowance },
        ));
    }

    let call = match (&intent.recipient, secret) {
        (Recipient::Known(to), _) => {
            if pulled.is_zero() {
                SednCall::TransferKnown { amount: contribution, to: *to }
            } else if from_deposit.is_zero() {
                SednCall::SednKnown { amount: contribution, to: *to }
            } else {
                SednCall::HybridKnown { amount: pulled, balance_amount: from_deposit, to: *to }
            }
        }
        (Recipient::Unknown(_), Some(secret)) => {
            if pulled.is_zero() {
                SednCall::TransferUnknown { amount: contribution, secret }
            } else if from_deposit.is_zero() {
                SednCall::SednUnknown { amount: contribution, secret }
            } else {
                SednCall::HybridUnknown { amount: pulled, balance_amount: from_deposit, secret }
            }
        }
        (Recipient::Unknown(_), None) => unreachable!("unknown recipient always has a secret"),
    };
    descriptors.push(TransactionDescriptor::new(chain_id, intent.sender, call));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chains::Chain, config::NetworkConfig, forwarder::ForwarderSchema};
    use alloy::{primitives::address, providers::{Provider, ProviderBuilder}};

    const POLYGON: ChainId = 137;
    const ARBITRUM: ChainId = 42161;

    const SENDER: Address = address!("00000000000000000000000000000000000000a1");
    const RECIPIENT: Address = address!("00000000000000000000000000000000000000b2");
    const SEDN: Address = address!("00000000000000000000000000000000000000c3");

    fn chain(chain_id: ChainId) -> Chain {
        let network = NetworkConfig {
            chain_id,
            rpc_url: "http://localhost:8545".parse().unwrap(),
            forwarder: address!("00000000000000000000000000000000000000f0"),
            forwarder_schema: ForwarderSchema::Sedn,
            sedn: SEDN,
            token: address!("00000000000000000000000000000000000000d4"),
            relay_endpoint: None,
        };
        // The planner never touches the transport.
        Chain::with_provider(network, ProviderBuilder::new().connect_http("http://localhost:8545".parse().unwrap()).erased())
    }

    fn chains() -> Chains {
        Chains::new([chain(POLYGON), chain(ARBITRUM)])
    }

    fn usdc(amount: u64) -> U256 {
        U256::from(amount)
    }

    fn intent(amount: u64, recipient: Recipient, origin_chains: &[ChainId]) -> TransferIntent {
        TransferIntent {
            sender: SENDER,
            recipient,
            amount: usdc(amount),
            origin_chains: origin_chains.to_vec(),
        }
    }

    #[test]
    fn pull_based_send_prepends_an_allowance_bump() {
        let funding = FundingState::new().with_chain(
            POLYGON,
            ChainFunds { token_balance: usdc(1_000_000), deposited: U256::ZERO, allowance: U256::ZERO },
        );
        let planned = plan_transfer(
            &chains(),
            &intent(1_000_000, Recipient::Known(RECIPIENT), &[POLYGON]),
            &funding,
        )
        .unwrap();

        assert!(planned.claim.is_none());
        let calls: Vec<_> = planned.plan.descriptors.iter().map(|d| &d.call).collect();
        assert_eq!(
            calls,
            [
                &SednCall::IncreaseAllowance { spender: SEDN, amount: usdc(1_000_000) },
                &SednCall::SednKnown { amount: usdc(1_000_000), to: RECIPIENT },
            ]
        );
        planned.plan.verify_conservation().unwrap();
    }

    #[test]
    fn sufficient_allowance_skips_the_bump() {
        let funding = FundingState::new().with_chain(
            POLYGON,
            ChainFunds { token_balance: usdc(1_000_000), deposited: U256::ZERO, allowance: U256::MAX },
        );
        let planned = plan_transfer(
            &chains(),
            &intent(1_000_000, Recipient::Known(RECIPIENT), &[POLYGON]),
            &funding,
        )
        .unwrap();
        assert_eq!(planned.plan.descriptors.len(), 1);
        assert!(matches!(planned.plan.descriptors[0].call, SednCall::SednKnown { .. }));
    }

    #[test]
    fn deposited_balance_is_spent_before_pulling() {
        let funding = FundingState::new().with_chain(
            POLYGON,
            ChainFunds { token_balance: usdc(500_000), deposited: usdc(800_000), allowance: U256::ZERO },
        );
        let planned = plan_transfer(
            &chains(),
            &intent(800_000, Recipient::Known(RECIPIENT), &[POLYGON]),
            &funding,
        )
        .unwrap();
        assert_eq!(
            planned.plan.descriptors[0].call,
            SednCall::TransferKnown { amount: usdc(800_000), to: RECIPIENT }
        );
    }

    #[test]
    fn unknown_recipient_locks_against_a_fresh_secret() {
        let funding = FundingState::new().with_chain(
            POLYGON,
            ChainFunds { token_balance: usdc(1_000_000), deposited: U256::ZERO, allowance: U256::MAX },
        );
        let planned = plan_transfer(
            &chains(),
            &intent(500_000, Recipient::Unknown("+15551234567".to_string()), &[POLYGON]),
            &funding,
        )
        .unwrap();

        let (solution, secret) = planned.claim.expect("unknown recipient must yield a claim pair");
        assert_eq!(solution.secret(), secret);
        assert_eq!(
            planned.plan.descriptors[0].call,
            SednCall::SednUnknown { amount: usdc(500_000), secret }
        );
    }

    #[test]
    fn hybrid_split_sums_to_the_contribution() {
        let funding = FundingState::new().with_chain(
            POLYGON,
            ChainFunds { token_balance: usdc(700_000), deposited: usdc(300_000), allowance: usdc(700_000) },
        );
        let planned = plan_transfer(
            &chains(),
            &intent(1_000_000, Recipient::Known(RECIPIENT), &[POLYGON]),
            &funding,
        )
        .unwrap();

        let SednCall::HybridKnown { amount, balance_amount, to } =
            planned.plan.descriptors[0].call.clone()
        else {
            panic!("expected a hybrid call, got {:?}", planned.plan.descriptors[0].call)
        };
        assert_eq!(amount + balance_amount, usdc(1_000_000));
        assert_eq!(to, RECIPIENT);
        planned.plan.verify_conservation().unwrap();
    }

    #[test]
    fn multi_chain_amounts_conserve_the_total() {
        let funding = FundingState::new()
            .with_chain(
                POLYGON,
                ChainFunds { token_balance: U256::ZERO, deposited: usdc(400_000), allowance: U256::ZERO },
            )
            .with_chain(
                ARBITRUM,
                ChainFunds { token_balance: usdc(600_000), deposited: U256::ZERO, allowance: U256::ZERO },
            );
        let planned = plan_transfer(
            &chains(),
            &intent(1_000_000, Recipient::Known(RECIPIENT), &[POLYGON, ARBITRUM]),
            &funding,
        )
        .unwrap();

        assert_eq!(planned.plan.chains(), vec![POLYGON, ARBITRUM]);
        assert_eq!(planned.plan.total_moved(), usdc(1_000_000));
        let calls: Vec<_> = planned.plan.descriptors.iter().map(|d| &d.call).collect();
        assert_eq!(
            calls,
            [
                &SednCall::TransferKnown { amount: usdc(400_000), to: RECIPIENT },
                &SednCall::IncreaseAllowance { spender: SEDN, amount: usdc(600_000) },
                &SednCall::SednKnown { amount: usdc(600_000), to: RECIPIENT },
            ]
        );
    }

    #[test]
    fn insufficient_aggregate_balance_emits_nothing() {
        let funding = FundingState::new().with_chain(
            POLYGON,
            ChainFunds { token_balance: usdc(400_000), deposited: U256::ZERO, allowance: U256::MAX },
        );
        let err = plan_transfer(
            &chains(),
            &intent(1_000_000, Recipient::Known(RECIPIENT), &[POLYGON]),
            &funding,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SednError::Plan(PlanError::InsufficientBalance { deficit, .. }) if deficit == usdc(600_000)
        ));
    }

    #[test]
    fn funding_scenarios_plan_without_allowance_bumps() {
        use crate::types::FundingScenario;

        // Seeded environments grant an unlimited allowance up front.
        let scenario = FundingScenario {
            token_target: usdc(250_000),
            deposited_target: usdc(250_000),
        };
        let funding = FundingState::new().with_chain(POLYGON, scenario.as_funds());
        let planned = plan_transfer(
            &chains(),
            &intent(500_000, Recipient::Known(RECIPIENT), &[POLYGON]),
            &funding,
        )
        .unwrap();

        assert_eq!(planned.plan.descriptors.len(), 1);
        assert!(matches!(planned.plan.descriptors[0].call, SednCall::HybridKnown { .. }));
    }

    #[test]
    fn zero_amount_is_rejected() {
        let err = plan_transfer(
            &chains(),
            &intent(0, Recipient::Known(RECIPIENT), &[POLYGON]),
            &FundingState::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SednError::Plan(PlanError::ZeroAmount)));
    }
}
