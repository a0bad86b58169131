//! Transaction plans and their descriptors.

use crate::{
    error::PlanError,
    types::{
        IERC20, ISedn, Secret, Solution, UserRequest,
    },
};
use alloy::{
    primitives::{Address, B256, Bytes, ChainId, U256},
    sol_types::SolCall,
};
use serde::{Deserialize, Serialize};

/// A call against the value contract (or, for allowances, the token).
///
/// One variant per external contract method the core is allowed to emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SednCall {
    /// Raise the token allowance granted to the value contract.
    ///
    /// Always precedes a pull-based call and must be confirmed before it.
    IncreaseAllowance {
        /// The value contract being approved.
        spender: Address,
        /// Allowance delta required on top of the current allowance.
        amount: U256,
    },
    /// Pull tokens from the sender and credit a known recipient.
    SednKnown {
        /// Amount pulled from the sender's wallet.
        amount: U256,
        /// The recipient's address.
        to: Address,
    },
    /// Pull tokens from the sender and lock them against a secret.
    SednUnknown {
        /// Amount pulled from the sender's wallet.
        amount: U256,
        /// Commitment the funds are locked against.
        secret: Secret,
    },
    /// Move already-deposited balance to a known recipient.
    TransferKnown {
        /// Amount moved from the sender's deposited balance.
        amount: U256,
        /// The recipient's address.
        to: Address,
    },
    /// Lock already-deposited balance against a secret.
    TransferUnknown {
        /// Amount moved from the sender's deposited balance.
        amount: U256,
        /// Commitment the funds are locked against.
        secret: Secret,
    },
    /// Split funding: pull `amount` from the wallet and take `balance_amount`
    /// from the deposited balance, for a known recipient.
    HybridKnown {
        /// Portion pulled from the sender's wallet.
        amount: U256,
        /// Portion taken from the deposited balance.
        balance_amount: U256,
        /// The recipient's address.
        to: Address,
    },
    /// Split funding variant locking against a secret.
    HybridUnknown {
        /// Portion pulled from the sender's wallet.
        amount: U256,
        /// Portion taken from the deposited balance.
        balance_amount: U256,
        /// Commitment the funds are locked against.
        secret: Secret,
    },
    /// Pay out deposited balance on this chain.
    Withdraw {
        /// Amount paid out.
        amount: U256,
        /// Destination wallet.
        to: Address,
    },
    /// Pay out deposited balance through a bridge towards another chain.
    BridgeWithdraw {
        /// Amount paid out before bridge fees.
        amount: U256,
        /// Externally computed route payload.
        user_request: UserRequest,
        /// The bridge implementation the route was computed for.
        bridge_impl: Address,
    },
    /// Release value locked against a secret to an authorized receiver.
    Claim {
        /// The revealed solution.
        solution: Solution,
        /// The commitment being claimed.
        secret: Secret,
        /// Authorization expiry as a unix timestamp.
        till: U256,
        /// Recovery id of the verifier signature.
        v: u8,
        /// `r` component of the verifier signature.
        r: B256,
        /// `s` component of the verifier signature.
        s: B256,
    },
    /// Claim and route the released value through a bridge in one transaction.
    BridgeClaim {
        /// The revealed solution.
        solution: Solution,
        /// The commitment being claimed.
        secret: Secret,
        /// Authorization expiry as a unix timestamp.
        till: U256,
        /// Recovery id of the verifier signature.
        v: u8,
        /// `r` component of the verifier signature.
        r: B256,
        /// `s` component of the verifier signature.
        s: B256,
        /// Externally computed route payload, validated before planning.
        user_request: UserRequest,
        /// The bridge implementation the route was computed for.
        bridge_impl: Address,
    },
}

impl SednCall {
    /// ABI-encodes the call.
    pub fn abi_encode(&self) -> Bytes {
        match self.clone() {
            Self::IncreaseAllowance { spender, amount } => {
                IERC20::increaseAllowanceCall { spender, addedValue: amount }.abi_encode()
            }
            Self::SednKnown { amount, to } => ISedn::sednKnownCall { amount, to }.abi_encode(),
            Self::SednUnknown { amount, secret } => {
                ISedn::sednUnknownCall { amount, secret: secret.0 }.abi_encode()
            }
            Self::TransferKnown { amount, to } => {
                ISedn::transferKnownCall { amount, to }.abi_encode()
            }
            Self::TransferUnknown { amount, secret } => {
                ISedn::transferUnknownCall { amount, secret: secret.0 }.abi_encode()
            }
            Self::HybridKnown { amount, balance_amount, to } => {
                ISedn::hybridKnownCall { amount, balanceAmount: balance_amount, to }.abi_encode()
            }
            Self::HybridUnknown { amount, balance_amount, secret } => {
                ISedn::hybridUnknownCall { amount, balanceAmount: balance_amount, secret: secret.0 }
                    .abi_encode()
            }
            Self::Withdraw { amount, to } => ISedn::withdrawCall { amount, to }.abi_encode(),
            Self::BridgeWithdraw { amount, user_request, bridge_impl } => {
                ISedn::bridgeWithdrawCall { amount, userRequest: user_request, bridgeImpl: bridge_impl }
                    .abi_encode()
            }
            Self::Claim { solution, secret, till, v, r, s } => ISedn::claimCall {
                solution: solution.reveal().to_string(),
                secret: secret.0,
                till,
                v,
                r,
                s,
            }
            .abi_encode(),
            Self::BridgeClaim { solution, secret, till, v, r, s, user_request, bridge_impl } => {
                ISedn::bridgeClaimCall {
                    solution: solution.reveal().to_string(),
                    secret: secret.0,
                    till,
                    v,
                    r,
                    s,
                    userRequest: user_request,
                    bridgeImpl: bridge_impl,
                }
                .abi_encode()
            }
        }
        .into()
    }

    /// The contract this call targets: the token for allowance bumps, the
    /// value contract for everything else.
    pub fn target(&self, token: Address, sedn: Address) -> Address {
        match self {
            Self::IncreaseAllowance { .. } => token,
            _ => sedn,
        }
    }

    /// The value this call contributes to a transfer or withdrawal total.
    ///
    /// `None` for calls that move no sender value themselves (allowance
    /// bumps, claims). Hybrid variants contribute both portions.
    pub fn moved_amount(&self) -> Option<U256> {
        match self {
            Self::IncreaseAllowance { .. } | Self::Claim { .. } | Self::BridgeClaim { .. } => None,
            Self::SednKnown { amount, .. }
            | Self::SednUnknown { amount, .. }
            | Self::TransferKnown { amount, .. }
            | Self::TransferUnknown { amount, .. }
            | Self::Withdraw { amount, .. }
            | Self::BridgeWithdraw { amount, .. } => Some(*amount),
            Self::HybridKnown { amount, balance_amount, .. }
            | Self::HybridUnknown { amount, balance_amount, .. } => {
                Some(amount.saturating_add(*balance_amount))
            }
        }
    }

    /// Whether this call pulls tokens from the sender's wallet, and therefore
    /// must be preceded by a sufficient allowance.
    pub fn pulls_tokens(&self) -> bool {
        matches!(
            self,
            Self::SednKnown { .. }
                | Self::SednUnknown { .. }
                | Self::HybridKnown { .. }
                | Self::HybridUnknown { .. }
        )
    }
}

/// Lifecycle of a descriptor through the sign/relay/poll pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptorStatus {
    /// Planned, not yet signed.
    #[default]
    Pending,
    /// A signed request is attached, not yet submitted.
    Signed,
    /// Accepted by the relay or the node.
    Submitted(B256),
    /// A successful receipt was observed.
    Confirmed(B256),
    /// Terminally failed; carries the surfaced reason.
    Failed(String),
}

impl DescriptorStatus {
    /// Whether the descriptor has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed(_) | Self::Failed(_))
    }
}

/// One contract call the orchestrator decided to make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDescriptor {
    /// Chain the call executes on.
    pub chain_id: ChainId,
    /// The signer the call executes as.
    pub from: Address,
    /// The contract method and arguments.
    pub call: SednCall,
    /// Native value attached to the call.
    pub value: U256,
    /// Pipeline state.
    pub status: DescriptorStatus,
}

impl TransactionDescriptor {
    /// Creates a pending descriptor with no native value attached.
    pub fn new(chain_id: ChainId, from: Address, call: SednCall) -> Self {
        Self { chain_id, from, call, value: U256::ZERO, status: DescriptorStatus::Pending }
    }

    /// The submitted transaction hash, once one exists.
    pub fn tx_hash(&self) -> Option<B256> {
        match self.status {
            DescriptorStatus::Submitted(hash) | DescriptorStatus::Confirmed(hash) => Some(hash),
            _ => None,
        }
    }
}

/// Ordered sequence of descriptors produced by an orchestrator.
///
/// Order matters: allowance bumps precede the pull they enable, and per-chain
/// subsequences execute in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPlan {
    /// The amount the plan was asked to move.
    pub requested: U256,
    /// The ordered descriptors.
    pub descriptors: Vec<TransactionDescriptor>,
}

impl TransactionPlan {
    /// Creates a plan, checking that the descriptors move exactly the
    /// requested amount.
    pub fn new(
        requested: U256,
        descriptors: Vec<TransactionDescriptor>,
    ) -> Result<Self, PlanError> {
        let plan = Self { requested, descriptors };
        plan.verify_conservation()?;
        Ok(plan)
    }

    /// Sum of the value moved by all descriptors.
    pub fn total_moved(&self) -> U256 {
        self.descriptors
            .iter()
            .filter_map(|descriptor| descriptor.call.moved_amount())
            .fold(U256::ZERO, |acc, amount| acc.saturating_add(amount))
    }

    /// Checks the conservation invariant: descriptor amounts sum exactly to
    /// the requested amount.
    pub fn verify_conservation(&self) -> Result<(), PlanError> {
        let planned = self.total_moved();
        if planned != self.requested {
            return Err(PlanError::SplitMismatch { requested: self.requested, planned });
        }
        Ok(())
    }

    /// The chains this plan touches, deduplicated, in first-use order.
    pub fn chains(&self) -> Vec<ChainId> {
        let mut chains = Vec::new();
        for descriptor in &self.descriptors {
            if !chains.contains(&descriptor.chain_id) {
                chains.push(descriptor.chain_id);
            }
        }
        chains
    }
}
