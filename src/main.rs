//! `auction-sim` command line.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, TxHash};
use clap::{Parser, Subcommand};

use auction_sim::blockchain::{check_successful_tx, Keypair, RpcClient};
use auction_sim::config::{load_config, SimConfig};
use auction_sim::events::types::parse_block;
use auction_sim::events::{load_abi, log_printer, BlockRange, LogFilter};
use auction_sim::funding::assign_funds_to_bidders;
use auction_sim::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "auction-sim")]
#[command(about = "Chain helpers for auction simulations", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate fresh keypairs
    Keygen {
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
    /// Wait for a transaction and check it did not run out of gas
    Confirm { tx_hash: TxHash },
    /// Print a contract event's history, then follow it until Ctrl-C
    Watch {
        /// JSON ABI or compiler artifact of the contract
        #[arg(long)]
        abi: PathBuf,
        #[arg(long)]
        address: Address,
        #[arg(long)]
        event: String,
        #[arg(long)]
        from_block: Option<String>,
        #[arg(long, default_value = "latest")]
        to_block: String,
        /// Indexed argument constraint, repeatable
        #[arg(long = "arg", value_name = "NAME=VALUE", value_parser = parse_key_val)]
        args: Vec<(String, String)>,
    },
    /// Distribute the owner's balance among bidders
    Fund {
        /// Overrides `funding.owner`
        #[arg(long)]
        owner: Option<Address>,
        /// Recipient addresses; `funding.bidder_count` keypairs are generated when empty
        #[arg(long, value_delimiter = ',')]
        bidders: Vec<Address>,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SimConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("auction-sim v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(addr) = &config.observability.metrics_address {
        metrics::init_metrics(addr.parse()?)?;
    }

    match cli.command {
        Commands::Keygen { count } => {
            for keypair in Keypair::generate_many(count) {
                println!("{} {}", keypair.address_hex(), keypair.private_key_hex());
            }
        }
        Commands::Confirm { tx_hash } => {
            let client = RpcClient::new(config.chain.clone())?;
            let receipt = check_successful_tx(
                &client,
                tx_hash,
                Duration::from_secs(config.chain.tx_timeout_secs),
                Duration::from_millis(config.chain.receipt_poll_interval_ms),
            )
            .await?;
            println!(
                "{} confirmed in block {:?}, gas used {}",
                receipt.transaction_hash, receipt.block_number, receipt.gas_used
            );
        }
        Commands::Watch {
            abi,
            address,
            event,
            from_block,
            to_block,
            args,
        } => {
            let abi = load_abi(&abi)?;
            let from = match from_block {
                Some(block) => parse_block(&block)?,
                None => config.watcher.from_block.into(),
            };
            let range = BlockRange::new(from, parse_block(&to_block)?);
            let args: BTreeMap<String, String> = args.into_iter().collect();

            let filter = LogFilter::new(&abi, address, &event, range, &args)?;
            let client = Arc::new(RpcClient::new(config.chain.clone())?);
            let subscription = filter
                .start(
                    client,
                    log_printer(event),
                    Duration::from_millis(config.watcher.poll_interval_ms),
                )
                .await?;

            tokio::signal::ctrl_c().await?;
            subscription.stop().await?;
        }
        Commands::Fund { owner, bidders } => {
            let owner = match (owner, &config.funding.owner) {
                (Some(owner), _) => owner,
                (None, Some(owner)) => owner.parse()?,
                (None, None) => {
                    return Err("no owner given: pass --owner or set funding.owner".into())
                }
            };

            let bidders = if bidders.is_empty() {
                let keypairs = Keypair::generate_many(config.funding.bidder_count);
                for keypair in &keypairs {
                    println!("bidder {} {}", keypair.address_hex(), keypair.private_key_hex());
                }
                keypairs.iter().map(Keypair::address).collect()
            } else {
                bidders
            };

            let client = RpcClient::new(config.chain.clone())?;
            let transfers = assign_funds_to_bidders(
                &client,
                &config.chain,
                &config.funding,
                owner,
                &bidders,
                &mut rand::thread_rng(),
            )
            .await?;

            for transfer in transfers {
                println!(
                    "{} {} ETH {}",
                    transfer.recipient,
                    format_ether(transfer.value),
                    transfer.tx_hash
                );
            }
        }
    }

    tracing::info!("Done");
    Ok(())
}
