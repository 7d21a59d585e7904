//! chainsyncd: multi-chain event synchronizer daemon binary.
//! Single-process binary embedding all pipelines in-process.

use clap::Parser;

mod cli;
mod config;
mod pool;
mod run;
mod store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    match args.command {
        cli::Command::Run => {
            let filter = std::env::var("CHAINSYNC_LOG")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string());
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
                .init();

            tracing::info!("chainsyncd starting");

            let config_path = args.config.unwrap_or_else(cli::default_config_path);
            let config = config::DaemonConfig::load(&config_path)?;
            run::run_daemon(config).await?;
        }
        cli::Command::Check => {
            let config_path = args.config.unwrap_or_else(cli::default_config_path);
            let config = config::DaemonConfig::load(&config_path)?;
            config.sync_config().validate()?;

            println!("{}: OK", config_path.display());
            for network in &config.networks {
                println!(
                    "  chain {} from block {} via {}",
                    network.chain_id,
                    network.start_cursor,
                    network.socket.display()
                );
            }
            println!(
                "  factory from block {} via {}",
                config.factory.start_cursor,
                config.factory.socket.display()
            );
            println!("  store at {}", config.store.path.display());
        }
    }

    Ok(())
}
