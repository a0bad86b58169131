//! Client for the external execution-status service.
//!
//! The service is the durable record correlating a plan's submitted hashes
//! with an overall status; the core owns no persisted state of its own. The
//! status must flip to `failed` as soon as any descriptor fails terminally,
//! even while descriptors on other chains are still pending.

use crate::{
    constants::RECEIPT_POLL_INTERVAL,
    error::SednError,
    poll::wait_until,
    types::{DescriptorStatus, TransactionDescriptor},
};
use alloy::primitives::{B256, ChainId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Overall status of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Some transactions have not reached a terminal state.
    Pending,
    /// Every transaction confirmed.
    Executed,
    /// At least one transaction failed terminally.
    Failed,
}

impl ExecutionStatus {
    /// Whether the execution has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// The kind of operation an execution tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionKind {
    /// A transfer to a recipient.
    Wire,
    /// A withdrawal to an external wallet.
    Withdraw,
    /// A claim of committed funds.
    Claim,
}

/// One submitted transaction within an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionTransaction {
    /// Chain the transaction was submitted on.
    #[serde(rename = "chainId")]
    pub chain_id: ChainId,
    /// The submitted hash.
    #[serde(rename = "txHash")]
    pub tx_hash: B256,
}

/// A server-side execution record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Server-assigned execution id.
    pub id: String,
    /// Overall status.
    pub status: ExecutionStatus,
    /// The transactions the execution correlates.
    pub transactions: Vec<ExecutionTransaction>,
}

#[derive(Debug, Serialize)]
struct CreateExecutionRequest {
    #[serde(rename = "type")]
    kind: ExecutionKind,
    transactions: Vec<ExecutionTransaction>,
}

#[derive(Debug, Serialize)]
struct UpdateExecutionRequest {
    status: ExecutionStatus,
}

/// HTTP client for the execution-status service.
#[derive(Debug, Clone)]
pub struct ExecutionClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ExecutionClient {
    /// Creates a client against the service at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self { http: reqwest::Client::new(), base_url }
    }

    /// Registers a new execution for the submitted descriptors.
    pub async fn create(
        &self,
        kind: ExecutionKind,
        descriptors: &[TransactionDescriptor],
    ) -> Result<ExecutionRecord, SednError> {
        let transactions = descriptors
            .iter()
            .filter_map(|descriptor| {
                descriptor.tx_hash().map(|tx_hash| ExecutionTransaction {
                    chain_id: descriptor.chain_id,
                    tx_hash,
                })
            })
            .collect();

        let record: ExecutionRecord = self
            .http
            .post(self.base_url.join("executeTransactions").map_err(eyre::Error::from)?)
            .json(&CreateExecutionRequest { kind, transactions })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(id = %record.id, ?kind, "registered execution");
        Ok(record)
    }

    /// Reports a status transition for an execution.
    pub async fn update(&self, id: &str, status: ExecutionStatus) -> Result<(), SednError> {
        self.http
            .post(self.base_url.join(&format!("executions/{id}/status")).map_err(eyre::Error::from)?)
            .json(&UpdateExecutionRequest { status })
            .send()
            .await?
            .error_for_status()?;
        debug!(id, ?status, "reported execution status");
        Ok(())
    }

    /// Fetches the current state of an execution.
    pub async fn status(&self, id: &str) -> Result<ExecutionRecord, SednError> {
        Ok(self
            .http
            .get(self.base_url.join(&format!("executionStatus/{id}")).map_err(eyre::Error::from)?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    /// Polls the execution until it reaches a terminal status.
    pub async fn await_terminal(
        &self,
        id: &str,
        max_wait: Duration,
    ) -> Result<ExecutionRecord, SednError> {
        wait_until(max_wait, RECEIPT_POLL_INTERVAL, "execution status", || async move {
            let record = self.status(id).await?;
            Ok(record.status.is_terminal().then_some(record))
        })
        .await
    }
}

/// The execution status implied by a set of descriptor states.
///
/// `Failed` wins over everything: one terminal failure fails the execution
/// even while other chains are still pending, and there is no cross-chain
/// rollback of the descriptors that did confirm.
pub fn aggregate_status(descriptors: &[TransactionDescriptor]) -> ExecutionStatus {
    if descriptors.iter().any(|d| matches!(d.status, DescriptorStatus::Failed(_))) {
        ExecutionStatus::Failed
    } else if descriptors.iter().all(|d| matches!(d.status, DescriptorStatus::Confirmed(_))) {
        ExecutionStatus::Executed
    } else {
        ExecutionStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SednCall, TransactionDescriptor};
    use alloy::primitives::{Address, U256};

    fn descriptor(status: DescriptorStatus) -> TransactionDescriptor {
        let mut descriptor = TransactionDescriptor::new(
            137,
            Address::ZERO,
            SednCall::TransferKnown { amount: U256::from(1u64), to: Address::ZERO },
        );
        descriptor.status = status;
        descriptor
    }

    #[test]
    fn one_failure_fails_the_execution_even_while_pending_elsewhere() {
        let descriptors = [
            descriptor(DescriptorStatus::Confirmed(B256::ZERO)),
            descriptor(DescriptorStatus::Failed("reverted".to_string())),
            descriptor(DescriptorStatus::Submitted(B256::ZERO)),
        ];
        assert_eq!(aggregate_status(&descriptors), ExecutionStatus::Failed);
    }

    #[test]
    fn all_confirmed_is_executed() {
        let descriptors = [
            descriptor(DescriptorStatus::Confirmed(B256::ZERO)),
            descriptor(DescriptorStatus::Confirmed(B256::ZERO)),
        ];
        assert_eq!(aggregate_status(&descriptors), ExecutionStatus::Executed);
        assert!(aggregate_status(&descriptors).is_terminal());
    }

    #[test]
    fn anything_else_is_pending() {
        let descriptors =
            [descriptor(DescriptorStatus::Confirmed(B256::ZERO)), descriptor(DescriptorStatus::Pending)];
        assert_eq!(aggregate_status(&descriptors), ExecutionStatus::Pending);
    }
}
