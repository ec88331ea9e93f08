//! `modver` — one-shot entry points for the module verification service.
//!
//! The production deployment drives these flows from a message-bus trigger;
//! this binary exposes the same flows directly: observe a module's metadata,
//! run a verification, or probe the endpoint pools.

mod config;
mod decoder;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use modver_chain::{ChainClient, FailoverRequestor};
use modver_notify::{Notifier, TracingNotifier, WebhookNotifier};
use modver_store::{InMemoryModuleStore, ModuleStoreAdapter};
use modver_types::Network;
use modver_verify::{
    MetadataExtractor, ModuleDecoder, PipelineConfig, ProcessToolchain, VerificationPipeline,
};

use config::ServiceConfig;
use decoder::{NoDecoder, ProcessDecoder};

#[derive(Parser)]
#[command(name = "modver", about = "On-chain module build verification")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "MODVER_CONFIG")]
    config: Option<String>,

    /// Log level when RUST_LOG is unset
    #[arg(long, env = "MODVER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a module's metadata and persist its base record
    Extract {
        #[arg(short, long, default_value = "mainnet")]
        network: Network,

        /// Content-addressed module reference
        module_ref: String,
    },

    /// Run the full build verification pipeline for a module
    Verify {
        #[arg(short, long, default_value = "mainnet")]
        network: Network,

        /// Content-addressed module reference
        module_ref: String,
    },

    /// Probe every endpoint in a network's pool
    CheckNodes {
        #[arg(short, long, default_value = "mainnet")]
        network: Network,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let service = Service::new(config);

    match cli.command {
        Commands::Extract {
            network,
            module_ref,
        } => service.extract(network, &module_ref).await,
        Commands::Verify {
            network,
            module_ref,
        } => service.verify(network, &module_ref).await,
        Commands::CheckNodes { network } => service.check_nodes(network).await,
    }
}

/// Wired-up collaborators for one invocation.
struct Service {
    chain: Arc<ChainClient>,
    store: ModuleStoreAdapter,
    notifier: Arc<dyn Notifier>,
    decoder: Arc<dyn ModuleDecoder>,
    config: ServiceConfig,
}

impl Service {
    fn new(config: ServiceConfig) -> Self {
        let chain = Arc::new(ChainClient::new(FailoverRequestor::new(
            config.chain.clone(),
        )));
        let store = ModuleStoreAdapter::new(Arc::new(InMemoryModuleStore::new()));
        let notifier: Arc<dyn Notifier> = match &config.webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(reqwest::Client::new(), url.clone())),
            None => Arc::new(TracingNotifier),
        };
        let decoder: Arc<dyn ModuleDecoder> = match &config.decoder_bin {
            Some(bin) => Arc::new(ProcessDecoder::new(bin.clone())),
            None => Arc::new(NoDecoder),
        };
        Self {
            chain,
            store,
            notifier,
            decoder,
            config,
        }
    }

    fn extractor(&self) -> MetadataExtractor {
        MetadataExtractor::new(
            self.chain.clone(),
            self.decoder.clone(),
            self.notifier.clone(),
        )
    }

    async fn extract(&self, network: Network, module_ref: &str) -> anyhow::Result<()> {
        let summary = self
            .extractor()
            .process_new_module(&self.store, network, module_ref)
            .await?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        Ok(())
    }

    async fn verify(&self, network: Network, module_ref: &str) -> anyhow::Result<()> {
        // The pipeline attaches to an observed record, so extraction runs
        // first within this process.
        self.extractor()
            .process_new_module(&self.store, network, module_ref)
            .await?;

        let pipeline = VerificationPipeline::new(
            self.chain.clone(),
            Arc::new(ProcessToolchain::new(self.config.toolchain_bin.clone())),
            self.store.clone(),
            self.notifier.clone(),
            reqwest::Client::new(),
            PipelineConfig {
                workdir_root: self.config.workdir_root.clone(),
            },
        );
        let result = pipeline.verify_module(network, module_ref).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }

    async fn check_nodes(&self, network: Network) -> anyhow::Result<()> {
        let probes = self.chain.requestor().probe_endpoints(network).await;
        for (endpoint, healthy) in probes {
            let status = if healthy { "ok" } else { "unreachable" };
            println!("{endpoint}\t{status}");
        }
        Ok(())
    }
}
