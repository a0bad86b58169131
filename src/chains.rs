//! A collection of providers for the supported chains.

use crate::{
    config::NetworkConfig,
    error::SednError,
    types::{IERC20, ISedn, sedn_forwarder::ISednForwarder},
};
use alloy::{
    primitives::ChainId,
    providers::{DynProvider, Provider, ProviderBuilder},
};
use std::collections::HashMap;

/// A single supported chain: a provider plus the deployed contract addresses.
#[derive(Debug, Clone)]
pub struct Chain {
    /// Provider for the chain.
    pub provider: DynProvider,
    /// The network description this chain was connected from.
    pub network: NetworkConfig,
}

impl Chain {
    /// Connects to the network's RPC endpoint and checks it reports the
    /// expected chain id.
    pub async fn connect(network: NetworkConfig) -> eyre::Result<Self> {
        let provider = ProviderBuilder::new().connect_http(network.rpc_url.clone()).erased();
        let reported = provider.get_chain_id().await?;
        eyre::ensure!(
            reported == network.chain_id,
            "rpc endpoint for chain {} reports chain id {reported}",
            network.chain_id
        );
        Ok(Self { provider, network })
    }

    /// Wraps an already-connected provider. Used by tests and embedders that
    /// manage their own transports.
    pub fn with_provider(network: NetworkConfig, provider: DynProvider) -> Self {
        Self { provider, network }
    }

    /// The chain id.
    pub fn chain_id(&self) -> ChainId {
        self.network.chain_id
    }

    /// The external token contract.
    pub fn token(&self) -> IERC20::IERC20Instance<DynProvider> {
        IERC20::new(self.network.token, self.provider.clone())
    }

    /// The value contract.
    pub fn sedn(&self) -> ISedn::ISednInstance<DynProvider> {
        ISedn::new(self.network.sedn, self.provider.clone())
    }

    /// The forwarder contract.
    pub fn forwarder(&self) -> ISednForwarder::ISednForwarderInstance<DynProvider> {
        ISednForwarder::new(self.network.forwarder, self.provider.clone())
    }
}

/// Registry of the supported chains, keyed by chain id.
///
/// Constructed once and passed into every component that talks to a chain;
/// never a singleton.
#[derive(Debug, Clone, Default)]
pub struct Chains {
    chains: HashMap<ChainId, Chain>,
}

impl Chains {
    /// Creates a registry from already-connected chains.
    pub fn new(chains: impl IntoIterator<Item = Chain>) -> Self {
        Self { chains: chains.into_iter().map(|chain| (chain.chain_id(), chain)).collect() }
    }

    /// Connects to every configured network.
    pub async fn connect(networks: Vec<NetworkConfig>) -> eyre::Result<Self> {
        let chains =
            futures_util::future::try_join_all(networks.into_iter().map(Chain::connect)).await?;
        Ok(Self::new(chains))
    }

    /// The chain with the given id.
    pub fn get(&self, chain_id: ChainId) -> Result<&Chain, SednError> {
        self.chains.get(&chain_id).ok_or(SednError::UnsupportedChain(chain_id))
    }

    /// Iterator over the supported chain ids.
    pub fn chain_ids_iter(&self) -> impl Iterator<Item = &ChainId> {
        self.chains.keys()
    }
}
