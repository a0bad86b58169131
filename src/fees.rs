//! Fee parameters for directly submitted transactions.

use crate::error::SednError;
use alloy::{
    eips::eip1559::Eip1559Estimation,
    primitives::ChainId,
    providers::{DynProvider, Provider},
};
use std::collections::HashMap;

/// Per-chain gas fee suggestion source.
///
/// Defaults to the node's own EIP-1559 estimator; explicit per-chain
/// overrides take precedence for networks whose node-side estimates are
/// known to be unusable.
#[derive(Debug, Clone, Default)]
pub struct FeeOracle {
    overrides: HashMap<ChainId, Eip1559Estimation>,
}

impl FeeOracle {
    /// Creates an oracle that defers to the node everywhere.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the fee estimation for a chain.
    pub fn with_override(mut self, chain_id: ChainId, fees: Eip1559Estimation) -> Self {
        self.overrides.insert(chain_id, fees);
        self
    }

    /// The fee estimation to use on `chain_id`.
    pub async fn estimate(
        &self,
        chain_id: ChainId,
        provider: &DynProvider,
    ) -> Result<Eip1559Estimation, SednError> {
        if let Some(fees) = self.overrides.get(&chain_id) {
            return Ok(*fees);
        }
        Ok(provider.estimate_eip1559_fees().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn overrides_take_precedence_without_touching_the_node() {
        use alloy::providers::ProviderBuilder;

        let pinned =
            Eip1559Estimation { max_fee_per_gas: 40_000_000_000, max_priority_fee_per_gas: 2_000_000_000 };
        let oracle = FeeOracle::new().with_override(137, pinned);

        // The endpoint is unreachable; the override must short-circuit it.
        let provider =
            ProviderBuilder::new().connect_http("http://127.0.0.1:1".parse().unwrap()).erased();
        let fees = oracle.estimate(137, &provider).await.unwrap();
        assert_eq!(fees.max_fee_per_gas, pinned.max_fee_per_gas);
        assert_eq!(fees.max_priority_fee_per_gas, pinned.max_priority_fee_per_gas);
    }
}
