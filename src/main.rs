//! CLI wrapper around the portal client:
//!   bank-portal snapshot --view dashboard
//!   bank-portal export-transactions --account acc-1 --output txs.csv
//!   bank-portal watch

use anyhow::{Result, bail};
use bank_portal::{
    Config, GraphqlTransport, HttpTransport, LoaderRegistry, Session, Views, export,
    session::Gate, socket,
};
use clap::{Arg, ArgMatches, Command};
use serde::Serialize;
use std::{
    fs::File,
    io::{self, Write},
    sync::Arc,
};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const VIEWS: [&str; 8] = [
    "accounts",
    "balances",
    "transactions",
    "currencies",
    "beneficiaries",
    "payment-methods",
    "identity",
    "dashboard",
];

fn cli() -> Command {
    let account = Arg::new("account")
        .long("account")
        .value_name("ID")
        .help("Only records belonging to this account");

    Command::new("bank-portal")
        .about("Banking portal client")
        .args(bank_portal::config::args())
        .subcommand_required(true)
        .subcommand(
            Command::new("snapshot")
                .about("Load everything once and print a view as JSON")
                .arg(
                    Arg::new("view")
                        .long("view")
                        .value_parser(VIEWS)
                        .default_value("dashboard"),
                )
                .arg(account.clone()),
        )
        .subcommand(
            Command::new("export-transactions")
                .about("Load transactions once and write them as CSV")
                .arg(account)
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_name("FILE")
                        .help("Output CSV (defaults to stdout)"),
                ),
        )
        .subcommand(Command::new("watch").about("Follow the socket and reload on events"))
}

fn init_logging(force_debug: bool) {
    // logs go to STDERR, keeping STDOUT clean for JSON / CSV
    let filter = if force_debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
    }
}

async fn load_all(registry: &LoaderRegistry, transport: &dyn GraphqlTransport) {
    let results = registry.refresh_all(transport).await;
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    if failed > 0 {
        warn!(failed, total = results.len(), "some loaders failed; views may be partial");
    } else {
        info!(total = results.len(), "all loaders fetched");
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn snapshot(views: Views<'_>, matches: &ArgMatches) -> Result<()> {
    let account = matches.get_one::<String>("account").map(String::as_str);
    let view = matches
        .get_one::<String>("view")
        .map(String::as_str)
        .unwrap_or("dashboard");

    match (view, account) {
        ("accounts", _) => print_json(&views.accounts()),
        ("balances", _) => print_json(&views.balances(account)),
        ("transactions", _) => print_json(&views.transactions(account)),
        ("currencies", _) => print_json(&views.currencies()),
        ("beneficiaries", _) => print_json(&views.stored_beneficiaries()),
        ("payment-methods", _) => print_json(&views.payment_methods()),
        ("identity", _) => print_json(&views.identity()),
        ("dashboard", Some(id)) => print_json(&views.account_with_balances(id)),
        ("dashboard", None) => print_json(&views.dashboard()),
        (other, _) => bail!("unknown view {other}"),
    }
}

fn export_transactions(views: Views<'_>, matches: &ArgMatches) -> Result<()> {
    let account = matches.get_one::<String>("account").map(String::as_str);
    let txs = views.transactions(account);
    if txs.skipped > 0 {
        warn!(skipped = txs.skipped, "transactions left out of export");
    }

    let sink: Box<dyn Write> = match matches.get_one::<String>("output") {
        Some(p) => Box::new(File::create(p)?),
        None => Box::new(io::stdout()),
    };
    let written = export::write_transactions(&txs.data, sink)?;
    info!(written, "export finished");
    Ok(())
}

async fn watch(
    config: &Config,
    registry: Arc<LoaderRegistry>,
    transport: Arc<dyn GraphqlTransport>,
) -> Result<()> {
    let session = Arc::new(Session::new());
    let mut rx = session.subscribe();
    let fallback_mode = config.fallback_mode;
    let observer = Arc::clone(&session);
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = *rx.borrow_and_update();
            let gate = observer.gate(fallback_mode);
            info!(?state, ?gate, "session update");
        }
    });

    if session.gate(fallback_mode) == Gate::AuthPrompt {
        info!("waiting for authentication from the host wallet");
    }
    socket::run(&config.socket_url, registry, session, transport).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let Some((command, sub)) = matches.subcommand() else {
        bail!("no subcommand given");
    };
    // global flags are visible on the subcommand's matches
    let config = Config::from_matches(sub);
    init_logging(config.force_debug);
    info!(backend = %config.backend_url, "starting");

    let transport: Arc<dyn GraphqlTransport> =
        Arc::new(HttpTransport::new(config.backend_url.clone(), config.timeout)?);
    let registry = Arc::new(LoaderRegistry::with_defaults());

    let outcome = match command {
        "snapshot" => {
            load_all(&registry, transport.as_ref()).await;
            snapshot(Views::new(&registry), sub)
        }
        "export-transactions" => {
            load_all(&registry, transport.as_ref()).await;
            export_transactions(Views::new(&registry), sub)
        }
        "watch" => watch(&config, registry, transport).await,
        other => Err(anyhow::anyhow!("unknown command {other}")),
    };

    if let Err(e) = &outcome {
        error!(%e, "command failed");
    }
    outcome
}
