//! Load balancer binary: flag parsing, logging setup, and wiring.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tcp_balancer::config::{self, BalancerConfig, UpstreamConfig};
use tcp_balancer::{LoadBalancer, NetworkFamily, TcpHost};

#[derive(Parser)]
#[command(name = "tcp-balancer")]
#[command(about = "Layer-4 TCP load balancer", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Port to listen on; 0 picks an available port. Overrides the
    /// configured bind address.
    #[arg(short, long)]
    port: Option<u16>,

    /// Upstream host address to register, in addition to any configured
    /// ones (repeatable).
    #[arg(short, long = "upstream", value_name = "ADDR")]
    upstreams: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tcp_balancer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => BalancerConfig::default(),
    };
    if let Some(port) = args.port {
        config.listener.bind_address = format!("0.0.0.0:{port}");
    }
    config.upstreams.extend(args.upstreams.into_iter().map(|address| UpstreamConfig {
        address,
        network: NetworkFamily::Tcp,
    }));

    let mut balancer = LoadBalancer::bind(
        &config.listener.bind_address,
        config.listener.network,
        config.host_timeout(),
    )
    .await?;

    for upstream in &config.upstreams {
        let host = TcpHost::new(&upstream.address, upstream.network, config.failure_threshold)?;
        tracing::info!(
            host = %host.address(),
            network = %host.network(),
            id = %host.id(),
            "registered upstream host"
        );
        balancer.add_upstream(Arc::new(host));
    }

    tracing::info!(
        address = %balancer.local_addr()?,
        upstreams = config.upstreams.len(),
        "load balancer listening"
    );

    balancer.run().await?;

    Ok(())
}
