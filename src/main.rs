//! `guestbook` command-line client.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use stellar_guestbook::app::{
    ConnectionPanel, EntryListView, GuestbookApp, Notification, NotificationVariant, SubmitOutcome,
};
use stellar_guestbook::blockchain::{LedgerRpc, LocalKeypairWallet, SorobanRpcClient, WalletProvider};
use stellar_guestbook::config::loader::default_config;
use stellar_guestbook::config::load_config;
use stellar_guestbook::observability::logging::init_tracing;

#[derive(Parser)]
#[command(name = "guestbook")]
#[command(about = "Read and sign the Stellar guestbook", long_about = None)]
struct Cli {
    /// TOML config file (built-in testnet defaults when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show guestbook messages, newest first
    List,
    /// Show wallet connection and contract details
    Status,
    /// Grant this client access to the wallet account
    Connect,
    /// Sign the guestbook
    Post {
        /// Message text (3-140 characters)
        message: String,
    },
    /// Show messages sent from this machine
    Sent,
    /// Forget messages sent from this machine
    ClearLocal,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => default_config()?,
    };
    init_tracing(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        rpc_url = %config.network.rpc_url,
        contract_id = %config.network.contract_id,
        "guestbook starting"
    );

    let rpc: Arc<dyn LedgerRpc> = Arc::new(SorobanRpcClient::new(&config.network)?);
    let wallet: Arc<dyn WalletProvider> = Arc::new(LocalKeypairWallet::from_env(&config.wallet)?);
    let mut app = GuestbookApp::new(&config, rpc, wallet)?;

    let code = match cli.command {
        Commands::List => {
            app.mount().await;
            print_entries(&app);
            ExitCode::SUCCESS
        }
        Commands::Status => {
            app.mount().await;
            print_connection(&app);
            println!("Contract: {}", app.contract_url());
            ExitCode::SUCCESS
        }
        Commands::Connect => {
            let result = app.connect().await;
            print_notifications(&mut app);
            print_connection(&app);
            if result.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::Post { message } => post(&mut app, &message).await,
        Commands::Sent => {
            let messages = app.local_messages();
            if messages.is_empty() {
                println!("No messages sent from this machine.");
            }
            for stored in messages {
                println!(
                    "{}  {}  {}",
                    stellar_guestbook::app::view::format_timestamp(stored.timestamp),
                    stellar_guestbook::app::view::truncate_sender(&stored.sender),
                    stored.message
                );
            }
            ExitCode::SUCCESS
        }
        Commands::ClearLocal => {
            app.clear_local_messages();
            println!("Local message history cleared.");
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}

async fn post(app: &mut GuestbookApp, message: &str) -> ExitCode {
    app.mount().await;
    if app.session().is_none() {
        // Connect on demand; a refusal surfaces as "Wallet Connection Required" below.
        let _ = app.connect().await;
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling confirmation wait");
            on_interrupt.cancel();
        }
    });

    let outcome = app.submit_message_with_cancel(message, &cancel).await;
    print_notifications(app);

    match outcome {
        Ok(SubmitOutcome::Sent) => {
            print_entries(app);
            ExitCode::SUCCESS
        }
        Ok(SubmitOutcome::Failed(e)) => {
            eprintln!("  {}", e);
            ExitCode::FAILURE
        }
        Ok(SubmitOutcome::WalletRequired) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_connection(app: &GuestbookApp) {
    match app.connection_panel() {
        ConnectionPanel::Disconnected => {
            println!("Wallet: not connected (run `guestbook connect`)");
        }
        ConnectionPanel::Connected {
            short_address,
            explorer_url,
            ..
        } => {
            println!("Wallet: {}", short_address);
            println!("Explorer: {}", explorer_url);
        }
    }
}

fn print_entries(app: &GuestbookApp) {
    match app.entry_list_view() {
        EntryListView::Loading { skeleton_rows } => {
            for _ in 0..skeleton_rows {
                println!("  ...");
            }
        }
        EntryListView::Empty { text } => println!("{}", text),
        EntryListView::Entries { rows, sample } => {
            if sample {
                println!("(ledger unavailable, showing sample data)");
            }
            for row in rows {
                println!("{}  {} ({})", row.short_sender, row.time, row.relative_time);
                println!("    {}", row.message);
            }
        }
    }
}

fn print_notifications(app: &mut GuestbookApp) {
    for Notification {
        title,
        description,
        variant,
    } in app.take_notifications()
    {
        let line = match description {
            Some(description) => format!("{}: {}", title, description),
            None => title,
        };
        match variant {
            NotificationVariant::Default => println!("{}", line),
            NotificationVariant::Destructive => eprintln!("{}", line),
        }
    }
}
