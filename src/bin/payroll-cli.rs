//! Payroll CLI - Command-line interface for the TRON Payroll SDK
//!
//! Converts amounts, checks transaction outcomes and token balances, and
//! sends single or batch payroll transfers through an external signer.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use tron_payroll_sdk::address::parse_address;
use tron_payroll_sdk::amount::{from_token_units, to_token_units};
use tron_payroll_sdk::classifier::OutcomeClassifier;
use tron_payroll_sdk::client::RpcClient;
use tron_payroll_sdk::config::Config;
use tron_payroll_sdk::payments::PayrollApiClient;
use tron_payroll_sdk::poller::{PollingDriver, StatusSource, TokioSleeper};
use tron_payroll_sdk::transaction::{BatchTransfer, ChainContext, SingleTransfer, TransferSettings};
use tron_payroll_sdk::types::{utils, TransactionIntent, TransactionOutcome};
use tron_payroll_sdk::wallet::RemoteSigner;

#[derive(Parser)]
#[command(name = "payroll-cli")]
#[command(about = "TRON Payroll SDK Command Line Interface", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (optional, defaults to standard location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a decimal amount to token units
    Units {
        /// Decimal amount, e.g. 530.31
        amount: Decimal,
        /// Token decimals
        #[arg(short, long, default_value = "6")]
        decimals: u32,
    },
    /// Classify a transaction once
    Status {
        /// Transaction id
        txid: String,
        /// Ask the payroll backend instead of the node
        #[arg(long)]
        api: bool,
    },
    /// Poll a transaction until it reaches a terminal outcome
    Wait {
        /// Transaction id
        txid: String,
    },
    /// Show the token balance of an address
    Balance {
        /// Address to check
        address: String,
    },
    /// Pay one employee
    Send {
        /// Paying wallet address (must be known to the signer)
        #[arg(short, long)]
        from: String,
        /// Recipient address
        #[arg(short, long)]
        to: String,
        /// Amount in tokens
        #[arg(short, long)]
        amount: Decimal,
        /// Employee id to record the payment against
        #[arg(short, long)]
        employee: u64,
    },
    /// Pay a group in one batch transfer (approve, then batchTransfer)
    Batch {
        /// Paying wallet address (must be known to the signer)
        #[arg(short, long)]
        from: String,
        /// Group id to record the payment against
        #[arg(short, long)]
        group: u64,
        /// Payee as ADDRESS:AMOUNT, repeatable
        #[arg(short, long = "payee", required = true)]
        payees: Vec<String>,
    },
}

fn parse_payee(payee: &str, decimals: u32) -> anyhow::Result<(String, u128)> {
    let (address, amount) = payee
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("Payee '{}' must be ADDRESS:AMOUNT", payee))?;
    parse_address(address)?;
    let amount: Decimal = amount
        .parse()
        .with_context(|| format!("Invalid amount in payee '{}'", payee))?;
    Ok((address.to_string(), to_token_units(amount, decimals)?))
}

fn node_client(config: &Config) -> RpcClient {
    match config.api_key {
        Some(ref key) => RpcClient::with_api_key(
            config.rpc_url(),
            SecretString::new(key.expose_secret().clone()),
        ),
        None => RpcClient::new(config.rpc_url()),
    }
}

fn api_client(config: &Config) -> anyhow::Result<PayrollApiClient> {
    let url = config
        .api_url
        .as_deref()
        .ok_or_else(|| anyhow!("api_url is not configured"))?;
    Ok(PayrollApiClient::new(url))
}

fn signer(config: &Config, from: &str) -> anyhow::Result<RemoteSigner> {
    let url = config
        .signer_url
        .as_deref()
        .ok_or_else(|| anyhow!("signer_url is not configured"))?;
    Ok(RemoteSigner::new(url, from).with_chain_id(config.expected_chain_id()))
}

fn describe(outcome: &TransactionOutcome) -> String {
    match outcome {
        TransactionOutcome::Pending => "pending".to_string(),
        TransactionOutcome::Success => "success".to_string(),
        TransactionOutcome::Reverted { reason } => format!("reverted: {}", reason),
        TransactionOutcome::Error { message } => format!("error: {}", message),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt().with_env_filter("debug").init();
    } else {
        tracing_subscriber::fmt().with_env_filter("info").init();
    }

    // Unit conversion works without configuration
    if let Commands::Units { amount, decimals } = &cli.command {
        let units = to_token_units(*amount, *decimals)?;
        println!("{}", units);
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match &cli.command {
        Commands::Units { .. } => unreachable!("handled above"),
        Commands::Status { txid, api } => {
            let outcome = if *api {
                api_client(&config)?.status(txid).await
            } else {
                OutcomeClassifier::new(node_client(&config))
                    .classify(txid)
                    .await
            };
            println!("{}", describe(&outcome));
        }
        Commands::Wait { txid } => {
            let driver = PollingDriver::with_sleeper(
                OutcomeClassifier::new(node_client(&config)),
                TokioSleeper,
                config.poll,
            );
            println!(
                "Waiting up to {}s for {}...",
                driver.config().worst_case().as_secs(),
                txid
            );
            let report = driver.poll(txid).await;
            println!(
                "{} after {} attempt(s)",
                describe(&report.outcome),
                report.attempts.len()
            );
            report.into_result()?;
        }
        Commands::Balance { address } => {
            let owner = parse_address(address)?;
            let units = node_client(&config)
                .balance_of(&config.token_address()?, &owner)
                .await?;
            let amount = from_token_units(units, config.token_decimals)?;
            println!("{}", utils::format_token(amount, &config.token_symbol));
        }
        Commands::Send {
            from,
            to,
            amount,
            employee,
        } => {
            let node = node_client(&config);
            let api = api_client(&config)?;
            let wallet = signer(&config, from)?;
            let flow = SingleTransfer::new(
                TransferSettings::from_config(&config)?,
                PollingDriver::with_sleeper(api_client(&config)?, TokioSleeper, config.poll),
            );

            let units = to_token_units(*amount, config.token_decimals)?;
            let intent = TransactionIntent::single(*employee, to.clone(), units);
            let ctx = ChainContext {
                wallet: Some(&wallet),
                submitter: &node,
                recorder: &api,
            };

            println!(
                "Sending {} to {}...",
                utils::format_token(*amount, &config.token_symbol),
                to
            );
            match flow.execute(&ctx, &intent).await? {
                Some(tx_id) => println!("✓ Payment confirmed and recorded: {}", tx_id),
                None => println!("No wallet connected; nothing sent."),
            }
        }
        Commands::Batch {
            from,
            group,
            payees,
        } => {
            let node = node_client(&config);
            let api = api_client(&config)?;
            let wallet = signer(&config, from)?;
            let flow = BatchTransfer::new(
                TransferSettings::from_config(&config)?,
                PollingDriver::with_sleeper(api_client(&config)?, TokioSleeper, config.poll),
            );

            let (recipients, amounts): (Vec<String>, Vec<u128>) = payees
                .iter()
                .map(|p| parse_payee(p, config.token_decimals))
                .collect::<anyhow::Result<Vec<_>>>()?
                .into_iter()
                .unzip();
            let intent = TransactionIntent::batch(*group, recipients, amounts);
            let ctx = ChainContext {
                wallet: Some(&wallet),
                submitter: &node,
                recorder: &api,
            };

            println!(
                "Paying {} recipients {} in total...",
                intent.recipients().len(),
                utils::format_token(
                    from_token_units(intent.total_units()?, config.token_decimals)?,
                    &config.token_symbol
                )
            );
            match flow.execute(&ctx, &intent).await? {
                Some(tx_id) => println!("✓ Batch confirmed and recorded: {}", tx_id),
                None => println!("No wallet connected; nothing sent."),
            }
        }
    }

    Ok(())
}
