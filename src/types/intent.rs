//! Transfer intents and observed funding state.

use alloy::primitives::{Address, ChainId, U256, map::HashMap};
use serde::{Deserialize, Serialize};

/// Recipient of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// A resolvable on-chain address.
    Known(Address),
    /// An opaque external identifier (e.g. a phone number), resolved to an
    /// address out of band, possibly after the transfer has settled.
    Unknown(String),
}

impl Recipient {
    /// The on-chain address, if the recipient is already resolvable.
    pub fn address(&self) -> Option<Address> {
        match self {
            Self::Known(address) => Some(*address),
            Self::Unknown(_) => None,
        }
    }
}

/// A request to move `amount` of the token from `sender` to `recipient`.
///
/// Immutable once created; consumed by the planner to produce a
/// [`TransactionPlan`](crate::types::TransactionPlan).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIntent {
    /// The funding sender.
    pub sender: Address,
    /// Who gets paid.
    pub recipient: Recipient,
    /// Amount in the smallest token unit.
    pub amount: U256,
    /// Chains holding sender funds, in the order they should be drawn from.
    pub origin_chains: Vec<ChainId>,
}

/// Funding state of one sender on one chain, observed before planning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainFunds {
    /// External token balance held in the sender's own wallet.
    pub token_balance: U256,
    /// In-protocol balance already deposited with the value contract.
    pub deposited: U256,
    /// Current token allowance granted to the value contract.
    pub allowance: U256,
}

impl ChainFunds {
    /// Total value this chain can contribute to a transfer.
    pub fn available(&self) -> U256 {
        self.token_balance.saturating_add(self.deposited)
    }
}

/// Observed funding across chains for one sender.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingState {
    funds: HashMap<ChainId, ChainFunds>,
}

impl FundingState {
    /// Creates an empty funding state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the observed funds for a chain.
    pub fn with_chain(mut self, chain_id: ChainId, funds: ChainFunds) -> Self {
        self.funds.insert(chain_id, funds);
        self
    }

    /// Funds observed on `chain_id`, if any.
    pub fn get(&self, chain_id: ChainId) -> Option<&ChainFunds> {
        self.funds.get(&chain_id)
    }

    /// Aggregate value available across the given chains.
    pub fn available_on(&self, chains: &[ChainId]) -> U256 {
        chains
            .iter()
            .filter_map(|chain_id| self.funds.get(chain_id))
            .fold(U256::ZERO, |acc, funds| acc.saturating_add(funds.available()))
    }
}

/// Per-chain target balances used to set up a desired starting state before
/// exercising a transfer.
///
/// Environment/test setup only; never part of production runtime state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingScenario {
    /// Target external token balance on the chain.
    pub token_target: U256,
    /// Target in-protocol balance on the chain.
    pub deposited_target: U256,
}

impl FundingScenario {
    /// The funding state this scenario describes, assuming an unlimited
    /// pre-existing allowance.
    pub fn as_funds(&self) -> ChainFunds {
        ChainFunds {
            token_balance: self.token_target,
            deposited: self.deposited_target,
            allowance: U256::MAX,
        }
    }
}
