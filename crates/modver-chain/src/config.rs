//! Chain layer configuration.

use std::time::Duration;

use modver_types::{Endpoint, Network};
use serde::{Deserialize, Serialize};

/// Configuration for the failover requestor and chain client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Path or name of the external chain client binary.
    pub client_bin: String,

    /// Retry count passed through to the client binary itself.
    pub grpc_retry: u32,

    /// Endpoint pool for the production chain.
    pub mainnet_nodes: Vec<Endpoint>,

    /// Endpoint pool for the test chain.
    pub testnet_nodes: Vec<Endpoint>,

    /// Deadline for a single invocation attempt.
    #[serde(with = "duration_secs")]
    pub attempt_timeout: Duration,

    /// Full sweeps over the pool before a query is abandoned.
    pub max_cycles: u32,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            client_bin: "concordium-client".to_string(),
            grpc_retry: 3,
            mainnet_nodes: vec![Endpoint::new("localhost", 20000)],
            testnet_nodes: vec![Endpoint::new("localhost", 20001)],
            attempt_timeout: Duration::from_secs(5),
            max_cycles: 3,
        }
    }
}

impl ChainConfig {
    /// Endpoint pool for a network.
    pub fn nodes(&self, network: Network) -> &[Endpoint] {
        match network {
            Network::Mainnet => &self.mainnet_nodes,
            Network::Testnet => &self.testnet_nodes,
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
