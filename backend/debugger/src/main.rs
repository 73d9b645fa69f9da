//! Mentorium console debugger.
//!
//! Standalone tool for troubleshooting the ledger boundary outside the
//! dashboard: inspect roles, balances, offers, and history, submit the
//! same transactions the UI would, and tail contract notifications.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mentorium_gateway::{
    Config, EventTopic, Gateway, HttpTransport, KeyWallet, Role, SharedTransport, WalletProvider,
};

#[derive(Parser, Debug)]
#[command(name = "mentorium-debug")]
#[command(about = "Mentorium - inspect and exercise the tutoring ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Dry run mode - log what would be submitted without sending
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full contract state overview for the configured account
    Status,
    /// Role stored for an address
    Role { address: String },
    /// Set an address's role (owner only)
    SetRole { address: String, role: Role },
    /// Token balance of an address
    Balance { address: String },
    /// Assign tokens to an address (instructors only)
    AssignTokens { to: String, amount: u64 },
    /// List active tutoring offers
    Offers,
    /// List every offer published by the configured account
    MyOffers,
    /// Publish a tutoring offer
    CreateOffer { subject: String, price: u64 },
    /// Cancel one of your offers
    CancelOffer { id: u64 },
    /// Tutoring history involving the configured account
    History,
    /// Pay for a tutoring offer
    RequestTutoring { offer_id: u64 },
    /// Redeem tokens for a benefit
    Redeem { benefit: String },
    /// Tail decoded ledger notifications until Ctrl-C
    Watch,
}

impl Command {
    fn is_mutating(&self) -> bool {
        matches!(
            self,
            Command::SetRole { .. }
                | Command::AssignTokens { .. }
                | Command::CreateOffer { .. }
                | Command::CancelOffer { .. }
                | Command::RequestTutoring { .. }
                | Command::Redeem { .. }
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = Config::from_env().context("loading configuration")?;
    config.validate().context("validating configuration")?;

    let transport: SharedTransport =
        Arc::new(HttpTransport::new(&config).context("building transport")?);
    let wallet: Option<Arc<dyn WalletProvider>> = match KeyWallet::from_config(&config) {
        Ok(wallet) => Some(Arc::new(wallet)),
        Err(_) => None,
    };
    let gateway = Gateway::new(transport, wallet);

    if cli.dry_run && cli.command.is_mutating() {
        warn!("DRY RUN MODE - transaction will not be submitted");
        info!(command = ?cli.command, "would submit");
        return Ok(());
    }

    // Every command acts as the configured account where one exists.
    if let Err(e) = gateway.connect().await {
        warn!(error = %e, "no connected account; reads will still work");
    }

    match cli.command {
        Command::Status => status(&gateway, &config).await,
        Command::Role { address } => {
            let role = gateway.role_of(&address).await;
            println!("{address}: role {role} ({})", role.as_ordinal());
            Ok(())
        }
        Command::SetRole { address, role } => {
            let hash = gateway.set_role(&address, role).await?;
            info!(%hash, "role updated");
            println!("{address} -> {role}");
            Ok(())
        }
        Command::Balance { address } => {
            let balance = gateway.balance_of(&address).await;
            println!("{address}: {balance} tokens");
            Ok(())
        }
        Command::AssignTokens { to, amount } => {
            let hash = gateway.assign_tokens(&to, amount).await?;
            info!(%hash, "tokens assigned");
            println!("{to}: +{amount} tokens (now {})", gateway.balance_of(&to).await);
            Ok(())
        }
        Command::Offers => offers(&gateway).await,
        Command::MyOffers => my_offers(&gateway).await,
        Command::CreateOffer { subject, price } => {
            let hash = gateway.create_offer(&subject, price).await?;
            info!(%hash, "offer created");
            println!("offer published: {subject} @ {price} tokens");
            Ok(())
        }
        Command::CancelOffer { id } => {
            let hash = gateway.cancel_offer(id).await?;
            info!(%hash, "offer cancelled");
            println!("offer {id} cancelled");
            Ok(())
        }
        Command::History => history(&gateway).await,
        Command::RequestTutoring { offer_id } => {
            let hash = gateway.request_tutoring(offer_id).await?;
            info!(%hash, "tutoring paid");
            println!("tutoring requested for offer {offer_id}");
            Ok(())
        }
        Command::Redeem { benefit } => {
            let hash = gateway.redeem_tokens(&benefit).await?;
            info!(%hash, "tokens redeemed");
            println!("redeemed for: {benefit}");
            Ok(())
        }
        Command::Watch => watch(&gateway, &config).await,
    }
}

/// Contract state overview, including the accessor/storage cross-checks
/// the browser-console diagnostics used to do by hand.
async fn status(gateway: &Gateway, config: &Config) -> Result<()> {
    println!("=== Mentorium contract state ===");
    println!("contract: {}", config.contract_address);

    match gateway.owner().await {
        Some(owner) => println!("owner:    {owner}"),
        None => println!("owner:    <read failed>"),
    }

    if let Some(address) = gateway.account() {
        let role = gateway.role_of(&address).await;
        let balance = gateway.balance_of(&address).await;
        let stored = gateway.stored_balance_of(&address).await;

        println!("account:  {address}");
        println!("role:     {role} (0=none, 1=student, 2=instructor, 3=admin)");
        println!("balance:  {balance} tokens");
        if balance != stored {
            warn!(
                balance,
                stored, "getBalance and balances storage disagree"
            );
            println!("WARNING: balances storage reports {stored} tokens");
        }
    } else {
        println!("account:  <none configured>");
    }

    let total = gateway.offer_count().await;
    let indexed = gateway.active_offers().await.len() as u64;
    let ledger_view = gateway.ledger_active_offer_count().await;
    println!("offers:   {total} total, {indexed} active");
    if indexed != ledger_view {
        warn!(
            indexed,
            ledger_view, "enumerated active offers disagree with getOfertasActivas"
        );
        println!("WARNING: contract active view reports {ledger_view} offers");
    }

    let records = gateway.tutoring_records().await;
    println!("tutoring: {} records", records.len());
    println!("================================");
    Ok(())
}

async fn offers(gateway: &Gateway) -> Result<()> {
    let offers = gateway.active_offers().await;
    if offers.is_empty() {
        println!("no active offers");
        return Ok(());
    }
    for offer in offers {
        println!(
            "#{:<4} {:<24} {:>6} tokens  tutor {}  ({})",
            offer.id,
            offer.subject,
            offer.price,
            offer.tutor,
            format_timestamp(offer.timestamp),
        );
    }
    Ok(())
}

/// Every offer the configured account has published, cancelled ones
/// included.
async fn my_offers(gateway: &Gateway) -> Result<()> {
    let Some(address) = gateway.account() else {
        println!("no account configured; set WALLET_ADDRESS");
        return Ok(());
    };

    let ids = gateway.offers_by_tutor(&address).await;
    if ids.is_empty() {
        println!("no offers published by {address}");
        return Ok(());
    }
    for id in ids {
        match gateway.offer(id).await {
            Some(offer) => println!(
                "#{:<4} {:<24} {:>6} tokens  {}  ({})",
                offer.id,
                offer.subject,
                offer.price,
                if offer.active { "active" } else { "cancelled" },
                format_timestamp(offer.timestamp),
            ),
            None => println!("#{id:<4} <read failed>"),
        }
    }
    Ok(())
}

async fn history(gateway: &Gateway) -> Result<()> {
    let account = gateway.account();
    let records = gateway.tutoring_records().await;
    let mut shown = 0;
    for record in &records {
        // Scope to the configured account when there is one, the way
        // the dashboard history view does.
        if let Some(address) = &account {
            if !record.student.eq_ignore_ascii_case(address)
                && !record.tutor.eq_ignore_ascii_case(address)
            {
                continue;
            }
        }
        shown += 1;
        println!(
            "{}  {} -> {}  {:>6} tokens  {}",
            format_timestamp(record.timestamp),
            record.student,
            record.tutor,
            record.tokens,
            record.subject,
        );
    }
    if shown == 0 {
        println!("no tutoring records");
    }
    Ok(())
}

async fn watch(gateway: &Gateway, config: &Config) -> Result<()> {
    for topic in EventTopic::ALL {
        gateway.subscribe(
            topic,
            Box::new(|event| {
                println!("{event:?}");
            }),
        );
    }

    let poller = gateway.start_event_poller(Duration::from_secs(config.poll_interval_secs));
    info!("watching ledger notifications, Ctrl-C to stop");

    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;

    poller.cancel();
    gateway.unsubscribe_all();
    info!("stopped");
    Ok(())
}

fn format_timestamp(timestamp: u64) -> String {
    DateTime::from_timestamp(timestamp as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
