//! Core configuration.
//!
//! All network and collaborator endpoints are explicit values handed to the
//! components at construction. There is no ambient lookup table and no
//! singleton.

use crate::{
    bridge::{HttpRouteSource, RouteSource, StubRouteSource},
    constants::DEFAULT_CLAIM_VALIDITY_SECS,
    error::ConfigError,
    forwarder::ForwarderSchema,
};
use alloy::primitives::{Address, ChainId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// Static description of one supported network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// The chain id.
    pub chain_id: ChainId,
    /// RPC endpoint.
    pub rpc_url: Url,
    /// The deployed forwarder contract.
    pub forwarder: Address,
    /// Wire schema of that forwarder deployment.
    pub forwarder_schema: ForwarderSchema,
    /// The deployed value contract.
    pub sedn: Address,
    /// The stablecoin the value contract settles in.
    pub token: Address,
    /// Relay webhook accepting signed forwarder requests for this chain, if
    /// gasless submission is available here.
    pub relay_endpoint: Option<Url>,
}

/// Relay behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Submit through the relay webhook where one is configured. When false,
    /// every call is signed and broadcast directly by the sender's own key.
    pub gasless: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { gasless: true }
    }
}

/// Bridge routing configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Base URL of the route aggregator API.
    pub base_url: Option<Url>,
    /// API key for the aggregator, if it requires one.
    pub api_key: Option<String>,
    /// Degraded/testnet mode: bypass the aggregator and synthesize routes
    /// naming this bridge implementation, so the bridging code path can be
    /// exercised without a live route. Explicit opt-in, never a silent
    /// fallback.
    pub testnet_stub: Option<Address>,
}

/// Top-level configuration for the transfer-execution core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SednConfig {
    /// The supported networks.
    #[serde(default)]
    pub networks: Vec<NetworkConfig>,
    /// The trusted verifier whose signature authorizes claims.
    pub verifier: Address,
    /// Relay behavior.
    #[serde(default)]
    pub relay: RelayConfig,
    /// Bridge routing.
    #[serde(default)]
    pub bridge: BridgeConfig,
    /// Base URL of the execution-status service, if one is deployed.
    #[serde(default)]
    pub execution_api: Option<Url>,
    /// Validity horizon granted to claim authorizations, in seconds.
    #[serde(default = "default_claim_validity")]
    pub claim_validity_secs: u64,
}

fn default_claim_validity() -> u64 {
    DEFAULT_CLAIM_VALIDITY_SECS
}

impl SednConfig {
    /// Creates a configuration trusting `verifier`, with no networks yet.
    pub fn new(verifier: Address) -> Self {
        Self {
            networks: Vec::new(),
            verifier,
            relay: RelayConfig::default(),
            bridge: BridgeConfig::default(),
            execution_api: None,
            claim_validity_secs: DEFAULT_CLAIM_VALIDITY_SECS,
        }
    }

    /// Adds a supported network.
    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.networks.push(network);
        self
    }

    /// Disables gasless submission; every call pays its own gas.
    pub fn with_direct_submission(mut self) -> Self {
        self.relay.gasless = false;
        self
    }

    /// Sets the bridge routing configuration.
    pub fn with_bridge(mut self, bridge: BridgeConfig) -> Self {
        self.bridge = bridge;
        self
    }

    /// Sets the execution-status service endpoint.
    pub fn with_execution_api(mut self, base_url: Url) -> Self {
        self.execution_api = Some(base_url);
        self
    }

    /// The network entry for `chain_id`, if it is supported.
    pub fn network(&self, chain_id: ChainId) -> Option<&NetworkConfig> {
        self.networks.iter().find(|network| network.chain_id == chain_id)
    }

    /// Builds the route source this configuration selects.
    ///
    /// The testnet stub wins when set; otherwise a live aggregator client is
    /// required.
    pub fn route_source(&self) -> Result<Arc<dyn RouteSource>, ConfigError> {
        if let Some(bridge_impl) = self.bridge.testnet_stub {
            return Ok(Arc::new(StubRouteSource { bridge_impl }));
        }
        match &self.bridge.base_url {
            Some(base_url) => {
                Ok(Arc::new(HttpRouteSource::new(base_url.clone(), self.bridge.api_key.clone())))
            }
            None => Err(ConfigError::MissingRouteSource),
        }
    }
}
