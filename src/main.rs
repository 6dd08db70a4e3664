//! Valuation Bridge CLI
//!
//! Terminal front-end for the real estate valuation contract:
//! 1. Connects to the wallet provider at start-up
//! 2. Listens for SmartZip, ProspectNow and Average valuation events
//! 3. Submits valuation requests and LINK withdrawals on demand
//!
//! `session` (the default) keeps listening and reads commands from stdin;
//! the other subcommands perform one action and exit.

use std::sync::Arc;

use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use eyre::eyre;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use valuation_bridge::config::Config;
use valuation_bridge::evm::LocalWalletProvider;
use valuation_bridge::view::{self, Input, ZipCodeField};
use valuation_bridge::{BridgeCommand, BridgeError, ValuationBridge, WalletProvider};

#[derive(Parser, Debug)]
#[command(name = "valuation-bridge", version, about = "Real estate valuation oracle client")]
struct Cli {
    /// Print the final status log as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect, listen for valuation events and read commands from stdin
    Session,
    /// Request a SmartZip valuation
    Smartzip {
        #[arg(long = "zip-code")]
        zip_code: String,
    },
    /// Request a ProspectNow valuation; the average arrives later as an event
    Average {
        #[arg(long = "zip-code")]
        zip_code: String,
    },
    /// Withdraw the contract's remaining LINK tokens
    Withdraw,
    /// Read the stored valuations
    Query,
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> eyre::Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    init_logging(config.json_logs);

    info!(
        contract = %config.contract_address,
        rpc_url = ?config.rpc_url,
        "Configuration loaded"
    );

    let provider = LocalWalletProvider::detect(&config)?
        .map(|p| Arc::new(p) as Arc<dyn WalletProvider>);
    let mut bridge = ValuationBridge::new(provider, config.contract_address);

    let view_task = tokio::spawn(view::run_view(bridge.updates()));

    // Page-load equivalent: one connection attempt, never retried
    let connection = bridge.connect().await;

    match cli.command.unwrap_or(Command::Session) {
        Command::Session => {
            if connection.is_ok() {
                run_session(&mut bridge).await?;
            }
        }
        Command::Smartzip { zip_code } => {
            bridge
                .execute(BridgeCommand::RequestSmartZipValue(zip_code))
                .await
        }
        Command::Average { zip_code } => {
            bridge
                .execute(BridgeCommand::GetAverageValue(zip_code))
                .await
        }
        Command::Withdraw => bridge.execute(BridgeCommand::WithdrawLink).await,
        Command::Query => bridge.execute(BridgeCommand::QueryValuations).await,
    }

    let entries = bridge.status().entries().to_vec();
    drop(bridge);
    let _ = view_task.await;

    if cli.json {
        for entry in entries {
            println!("{}", serde_json::to_string(&entry)?);
        }
    }

    info!("Valuation bridge stopped");
    connection_outcome(connection)
}

/// Process result for the start-up connection; a failed connect exits non-zero
fn connection_outcome(connection: Result<Address, BridgeError>) -> eyre::Result<()> {
    connection
        .map(|_| ())
        .map_err(|e| eyre!("Wallet connection failed: {}", e))
}

async fn run_session(bridge: &mut ValuationBridge) -> eyre::Result<()> {
    let (command_tx, command_rx) = mpsc::channel::<BridgeCommand>(16);
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

    let signal_shutdown = shutdown_tx.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        let _ = signal_shutdown.send(()).await;
    });

    tokio::spawn(async move {
        println!("{}", view::HELP);

        let mut zip_field = ZipCodeField::default();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            match view::parse_command(&line, &mut zip_field) {
                Some(Input::Command(command)) => {
                    if command_tx.send(command).await.is_err() {
                        break;
                    }
                }
                Some(Input::ZipCodeSet) => {
                    println!("{} = {:?}", ZipCodeField::ID, zip_field.value());
                }
                Some(Input::Help) => println!("{}", view::HELP),
                Some(Input::Quit) => break,
                Some(Input::Unknown(verb)) => {
                    println!("Unknown command '{}'. Type 'help' for commands.", verb)
                }
                None => {}
            }
        }

        let _ = shutdown_tx.send(()).await;
    });

    bridge.run(command_rx, shutdown_rx).await
}

fn init_logging(json: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,valuation_bridge=debug"));

    // Logs go to stderr so stdout stays the page
    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_connection_is_an_error() {
        let err = connection_outcome(Err(BridgeError::AuthorizationDenied(
            "no signing key configured".to_string(),
        )))
        .unwrap_err();
        assert!(err.to_string().contains("no signing key configured"));

        assert!(connection_outcome(Err(BridgeError::ProviderAbsent)).is_err());
    }

    #[test]
    fn test_successful_connection_exits_cleanly() {
        assert!(connection_outcome(Ok(Address::repeat_byte(0x11))).is_ok());
    }

    #[test]
    fn test_cli_defaults_to_session() {
        let cli = Cli::parse_from(["valuation-bridge"]);
        assert!(cli.command.is_none());
        assert!(!cli.json);

        let cli = Cli::parse_from([
            "valuation-bridge",
            "smartzip",
            "--zip-code",
            "94107",
            "--json",
        ]);
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Some(Command::Smartzip { zip_code }) if zip_code == "94107"
        ));
    }
}
