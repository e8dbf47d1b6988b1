/*
[INPUT]:  CLI arguments, configuration file, local Solana keypair
[OUTPUT]: Challenges, signatures, cached sessions and auth headers on stdout
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags or subcommands
*/

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use smart_money_auth::auth::sign_challenge;
use smart_money_auth::verifier::verify_wallet_signature;
use smart_money_auth::{
    AuthChallenge, AuthClient, BrokerConfig, FileStore, KeypairWallet, MessageBuilder, SessionBroker,
    SessionCache, WalletEvent,
};
use smart_money_auth_cli::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "smart-money-auth", version, about = "Wallet signature session client")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", global = true)]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a fresh authentication challenge
    Challenge,
    /// Sign a challenge (or the given message) with the configured keypair
    Sign {
        #[arg(long)]
        message: Option<String>,
    },
    /// Create a session and cache it
    Login,
    /// Print the headers for an authenticated request
    Headers,
    /// Show the cached session, if any
    Status,
    /// Clear the cached session
    Logout,
    /// Check a detached signature against a wallet address
    Verify {
        #[arg(long)]
        address: String,
        #[arg(long)]
        signature: String,
        #[arg(long)]
        message: String,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let config = CliConfig::load(args.config_path.as_deref()).context("load config")?;
    info!(api_base_url = %config.api_base_url, "configuration loaded");

    match args.command {
        Command::Challenge => {
            println!("{}", message_builder(&config)?.build().message);
        }
        Command::Sign { message } => {
            let wallet = load_wallet(&config)?;
            let challenge = match message {
                Some(message) => AuthChallenge {
                    message,
                    issued_at_ms: 0,
                },
                None => message_builder(&config)?.build(),
            };
            let credential = sign_challenge(&wallet, &challenge)
                .await
                .context("sign challenge")?;
            println!("{}", serde_json::to_string_pretty(&credential)?);
        }
        Command::Login => {
            let wallet = load_wallet(&config)?;
            let broker = build_broker(&config)?;
            broker.on_wallet_event(&WalletEvent::Connected(wallet.address().to_string()));
            let session = broker.session(&wallet).await.context("create session")?;
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        Command::Headers => {
            let wallet = load_wallet(&config)?;
            let broker = build_broker(&config)?;
            broker.on_wallet_event(&WalletEvent::Connected(wallet.address().to_string()));
            let headers = broker
                .get_auth_headers(&wallet)
                .await
                .context("assemble auth headers")?;
            for (name, value) in headers.pairs() {
                println!("{name}: {value}");
            }
        }
        Command::Status => {
            let broker = build_broker(&config)?;
            match broker.cache().load() {
                Some(session) => println!("{}", serde_json::to_string_pretty(&session)?),
                None => println!("no active session"),
            }
        }
        Command::Logout => {
            let broker = build_broker(&config)?;
            broker.on_wallet_event(&WalletEvent::Disconnected);
            println!("session cleared");
        }
        Command::Verify {
            address,
            signature,
            message,
        } => match verify_wallet_signature(&address, &signature, &message) {
            Ok(()) => println!("valid"),
            Err(err) => bail!("signature rejected: {err}"),
        },
        Command::Config => {
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn message_builder(config: &CliConfig) -> Result<MessageBuilder> {
    MessageBuilder::new(config.app_label.as_str()).context("invalid app_label")
}

fn load_wallet(config: &CliConfig) -> Result<KeypairWallet> {
    let path = config.keypair_path()?;
    KeypairWallet::from_keypair_file(path)
        .with_context(|| format!("load keypair {}", path.display()))
}

fn build_broker(config: &CliConfig) -> Result<SessionBroker> {
    let client = AuthClient::with_config_and_base_url(config.client_config(), &config.api_base_url)
        .context("create http client")?;
    let store = FileStore::for_origin(config.storage_root()?, client.base_url());
    info!(dir = %store.dir().display(), "using session store");

    let cache = SessionCache::new(Arc::new(store), &config.namespace);
    let broker_config = BrokerConfig {
        app_label: config.app_label.clone(),
        dedupe_in_flight: config.dedupe_in_flight,
    };
    SessionBroker::with_config(Arc::new(client), cache, broker_config).context("create session broker")
}
