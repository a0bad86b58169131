//! Core error types.

use alloy::{
    primitives::{Address, ChainId},
    transports::TransportErrorKind,
};
use std::time::Duration;
use thiserror::Error;

mod claim;
pub use claim::ClaimError;

mod plan;
pub use plan::PlanError;

mod relay;
pub use relay::RelayApiError;

/// The overarching error type for the transfer-execution core.
#[derive(Debug, Error)]
pub enum SednError {
    /// Errors related to configuration. Fail fast, never retried.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Errors related to transfer planning.
    #[error(transparent)]
    Plan(#[from] PlanError),
    /// Errors related to the claim protocol.
    #[error(transparent)]
    Claim(#[from] ClaimError),
    /// Errors related to the relay endpoint.
    #[error(transparent)]
    RelayApi(#[from] RelayApiError),
    /// The chain is not part of the network registry.
    #[error("unsupported chain {0}")]
    UnsupportedChain(ChainId),
    /// A signature failed to verify against the expected signer.
    #[error("signature recovered to {got}, expected {expected}")]
    SignerMismatch {
        /// The address the signature was expected to recover to.
        expected: Address,
        /// The address it actually recovered to.
        got: Address,
    },
    /// An on-chain execution reverted. Terminal for the descriptor.
    #[error("transaction {tx_hash} reverted: {}", .reason.as_deref().unwrap_or("no reason"))]
    Reverted {
        /// Hash of the reverted transaction.
        tx_hash: alloy::primitives::B256,
        /// Decoded revert reason, when the receipt carried one.
        reason: Option<String>,
    },
    /// A bounded wait elapsed without observing the awaited condition.
    ///
    /// Distinct from a revert: the transaction may still confirm later, so
    /// callers must not treat a timeout as proof of failure.
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
    /// An error occurred during ABI encoding/decoding.
    #[error(transparent)]
    Abi(#[from] alloy::sol_types::Error),
    /// An error occurred during signing or signature parsing.
    #[error(transparent)]
    Signature(#[from] alloy::primitives::SignatureError),
    /// An error occurred in a contract call.
    #[error(transparent)]
    Contract(#[from] alloy::contract::Error),
    /// An error occurred talking to RPC.
    #[error(transparent)]
    Rpc(#[from] alloy::transports::RpcError<TransportErrorKind>),
    /// An error occurred talking to an HTTP collaborator.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// An internal error occurred.
    #[error(transparent)]
    Internal(#[from] eyre::Error),
}

impl SednError {
    /// Whether the error is a transient transport failure that may be retried
    /// at the transport level.
    ///
    /// Signature, revert, plan and configuration errors are terminal for
    /// their descriptor and must never be retried with the same inputs.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Rpc(err) => matches!(err, alloy::transports::RpcError::Transport(_)),
            Self::Http(err) => {
                err.is_timeout()
                    || err.is_connect()
                    || err.status().is_some_and(|status| status.is_server_error())
            }
            _ => false,
        }
    }
}

/// Errors caused by missing or inconsistent configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No forwarder contract is configured or deployed for the chain.
    #[error("no forwarder available on chain {0}")]
    MissingForwarder(ChainId),
    /// No relay endpoint is configured for the chain.
    #[error("no relay endpoint configured for chain {0}")]
    MissingRelayEndpoint(ChainId),
    /// No execution-status service is configured.
    #[error("no execution-status service configured")]
    MissingExecutionApi,
    /// No bridge routing source is configured.
    #[error("no bridge route source configured")]
    MissingRouteSource,
    /// The named network is not known to the registry.
    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}

/// A bounded wait elapsed without observing the awaited condition.
#[derive(Debug, Clone, Copy, Error)]
#[error("timed out after {max_wait:?} waiting for {target}")]
pub struct TimeoutError {
    /// The wait bound that elapsed.
    pub max_wait: Duration,
    /// What was being awaited.
    pub target: &'static str,
}
