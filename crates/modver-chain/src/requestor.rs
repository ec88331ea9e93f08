//! Failover requestor.
//!
//! Issues a command against the endpoint pool of a network, advancing to the
//! next endpoint whenever an attempt is classified as failed. A query only
//! errors once every endpoint has failed for `max_cycles` full sweeps.

use dashmap::DashMap;
use modver_types::{Endpoint, Network};
use tracing::{debug, warn};

use crate::config::ChainConfig;
use crate::error::ChainError;
use crate::runner::{InvocationRunner, ProcessRunner, RawOutput};

/// Output lines the client binary emits when a node is reachable but not
/// serving, treated the same as a connection failure.
const TRANSIENT_SIGNATURES: [&str; 2] = [
    "Cannot establish connection to GRPC endpoint.",
    "gRPC error: not enough bytes",
];

/// Cycles a command over a per-network endpoint pool until one attempt
/// succeeds.
///
/// All bookkeeping (pool cursor, per-endpoint failure counts) is owned by the
/// instance, so requestors for different pools never share state. Each call
/// scans the pool with its own cursor starting at index 0.
pub struct FailoverRequestor<R = ProcessRunner> {
    config: ChainConfig,
    runner: R,
    failure_counts: DashMap<String, u64>,
}

impl FailoverRequestor<ProcessRunner> {
    pub fn new(config: ChainConfig) -> Self {
        Self::with_runner(config, ProcessRunner)
    }
}

impl<R: InvocationRunner> FailoverRequestor<R> {
    pub fn with_runner(config: ChainConfig, runner: R) -> Self {
        Self {
            config,
            runner,
            failure_counts: DashMap::new(),
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn runner_ref(&self) -> &R {
        &self.runner
    }

    /// How often an endpoint has been classified as failed since startup.
    pub fn failure_count(&self, endpoint: &Endpoint) -> u64 {
        self.failure_counts
            .get(&endpoint.to_string())
            .map(|c| *c)
            .unwrap_or(0)
    }

    /// Execute `command` against the network's pool, failing over between
    /// endpoints until an attempt succeeds.
    pub async fn execute(
        &self,
        network: Network,
        command: &[String],
    ) -> Result<RawOutput, ChainError> {
        let pool = self.config.nodes(network);

        for cycle in 0..self.config.max_cycles {
            for endpoint in pool {
                match self.attempt(endpoint, command).await {
                    Some(output) => return Ok(output),
                    None => {
                        warn!(%endpoint, %network, cycle, "endpoint attempt failed, rotating");
                        *self
                            .failure_counts
                            .entry(endpoint.to_string())
                            .or_insert(0) += 1;
                    }
                }
            }
        }

        Err(ChainError::PoolExhausted {
            network,
            pool_size: pool.len(),
            cycles: self.config.max_cycles,
        })
    }

    /// Probe every endpoint in the pool with a single status query.
    pub async fn probe_endpoints(&self, network: Network) -> Vec<(Endpoint, bool)> {
        let command = ["raw".to_string(), "GetBlockInfo".to_string()];
        let mut results = Vec::new();
        for endpoint in self.config.nodes(network) {
            let healthy = self.attempt(endpoint, &command).await.is_some();
            results.push((endpoint.clone(), healthy));
        }
        results
    }

    /// One attempt against one endpoint. `None` means the attempt is
    /// classified as failed and the caller should rotate.
    async fn attempt(&self, endpoint: &Endpoint, command: &[String]) -> Option<RawOutput> {
        let args = self.invocation_args(endpoint, command);

        match self
            .runner
            .run(&self.config.client_bin, &args, self.config.attempt_timeout)
            .await
        {
            Ok(output) if !attempt_failed(&output) => {
                debug!(%endpoint, "endpoint attempt succeeded");
                Some(output)
            }
            Ok(_) => None,
            Err(err) => {
                debug!(%endpoint, %err, "endpoint attempt errored");
                None
            }
        }
    }

    /// Endpoint-specific invocation prefix followed by the opaque command.
    fn invocation_args(&self, endpoint: &Endpoint, command: &[String]) -> Vec<String> {
        let mut args = vec![
            "--grpc-retry".to_string(),
            self.config.grpc_retry.to_string(),
            "--grpc-ip".to_string(),
            endpoint.host.clone(),
            "--grpc-port".to_string(),
            endpoint.port.to_string(),
        ];
        args.extend(command.iter().cloned());
        args
    }
}

/// Classify one completed attempt.
fn attempt_failed(output: &RawOutput) -> bool {
    if !output.success {
        return true;
    }
    let stdout = output.stdout.trim_end();
    TRANSIENT_SIGNATURES.iter().any(|sig| stdout == *sig)
}
