use alloy::primitives::{ChainId, U256};
use thiserror::Error;

/// Errors produced while turning a transfer or withdrawal request into a
/// transaction plan.
///
/// Planning errors are terminal: no descriptors are emitted and nothing has
/// been submitted on-chain.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The requested amount is zero.
    #[error("transfer amount must be non-zero")]
    ZeroAmount,
    /// Aggregate balance across all origin chains does not cover the amount.
    #[error("insufficient balance: required {required}, available {available}, deficit {deficit}")]
    InsufficientBalance {
        /// The required amount for the transfer.
        required: U256,
        /// The aggregate balance available across all origin chains.
        available: U256,
        /// The deficit amount (required - available).
        deficit: U256,
    },
    /// The descriptor amounts do not sum to the requested amount.
    #[error("planned amounts sum to {planned}, requested {requested}")]
    SplitMismatch {
        /// The amount the caller requested.
        requested: U256,
        /// The amount the plan would actually move.
        planned: U256,
    },
    /// A per-chain withdrawal amount references a chain with no funds entry.
    #[error("no funding entry for chain {0}")]
    UnknownChain(ChainId),
}
