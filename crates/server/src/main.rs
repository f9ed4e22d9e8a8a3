mod config;
mod server;

use anyhow::{Context, Result};
use clap::Parser;

use config::ServerConfig;
use server::OffloadServer;

#[derive(Parser)]
#[command(name = "roam-server")]
#[command(about = "Wireless offloading controller")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, default_value_t = roam::DEFAULT_SERVER_PORT)]
    port: u16,

    #[arg(
        short,
        long,
        default_value_t = roam::DEFAULT_AGENT_PORT,
        help = "Port agents listen on for controller replies"
    )]
    agent_port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig {
        port: args.port,
        agent_port: args.agent_port,
    };
    let server = OffloadServer::bind(&args.bind, config).await.with_context(|| {
        format!(
            "failed to bind controller socket on {}:{}",
            args.bind, args.port
        )
    })?;
    log::info!("controller listening on {}", server.local_addr());

    let registry = server.registry();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        interval.tick().await;
        loop {
            interval.tick().await;
            log::info!("tracking {} clients", registry.len());
            for line in registry.summaries() {
                log::debug!("{}", line);
            }
        }
    });

    server.run().await.context("controller socket failed")?;
    log::info!("controller shutting down");

    Ok(())
}
