// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use tcg_collector::{
    load_index, CollectionLedger, Config, LedgerEntry, Overrides, SearchOutcome, Session,
};

/// Record trading cards into a collection file by passcode
#[derive(Parser, Debug)]
#[command(name = "tcg-collector", version, about)]
struct Cli {
    /// JSON config file (defaults to $TCG_COLLECTOR_CONFIG, then ./tcg-collector.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory of reference CSV files
    #[arg(long, global = true)]
    reference_dir: Option<PathBuf>,

    /// Compiled reference artifact (used instead of the CSV directory when present)
    #[arg(long, global = true)]
    artifact: Option<PathBuf>,

    /// Collection file to append to
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive collector (default)
    Ui,
    /// Look a card up by passcode
    Lookup {
        passcode: String,
        /// Also append the card to the collection
        #[arg(long)]
        record: bool,
    },
    /// Append a separator row to the collection
    Separator { label: String },
    /// Print the collection
    Show,
}

fn main() -> Result<ExitCode> {
    // RUST_LOG=debug for per-file loading details
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::resolve(
        cli.config.as_deref(),
        Overrides {
            reference_dir: cli.reference_dir,
            artifact_path: cli.artifact,
            ledger_path: cli.ledger,
        },
    )?;

    match cli.command.unwrap_or(Command::Ui) {
        Command::Ui => run_ui_mode(&config),
        Command::Lookup { passcode, record } => run_lookup(&config, &passcode, record),
        Command::Separator { label } => run_separator(&config, &label),
        Command::Show => run_show(&config),
    }
}

fn open_session(config: &Config) -> Result<Session> {
    let index = load_index(config).context("Failed to load reference data")?;
    let ledger = CollectionLedger::open(&config.ledger_path)?;
    Ok(Session::new(index, ledger)?)
}

fn run_lookup(config: &Config, passcode: &str, record: bool) -> Result<ExitCode> {
    if record {
        let mut session = open_session(config)?;
        let outcome = session.search(passcode)?;
        return match outcome {
            SearchOutcome::Recorded(_) => {
                println!(
                    "✓ {} in {}",
                    outcome.message(),
                    session.ledger().path().display()
                );
                Ok(ExitCode::SUCCESS)
            }
            SearchOutcome::NotFound(_) | SearchOutcome::EmptyInput => {
                eprintln!("❌ {}", outcome.message());
                Ok(ExitCode::FAILURE)
            }
        };
    }

    let index = load_index(config).context("Failed to load reference data")?;
    match index.lookup(passcode) {
        Some(card) => {
            println!("Passcode:  {}", card.passcode);
            println!("Name:      {}", card.name);
            println!("Status:    {}", card.status);
            println!("Attribute: {}", card.attribute);
            println!("Attack:    {}", card.attack);
            println!("Defense:   {}", card.defense);
            println!("Database:  {}", card.source_file);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("❌ Card not found: {}", passcode);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run_separator(config: &Config, label: &str) -> Result<ExitCode> {
    let mut ledger = CollectionLedger::open(&config.ledger_path)?;
    ledger.add_separator(label)?;
    println!("✓ Separator '{}' added to {}", label, ledger.path().display());
    Ok(ExitCode::SUCCESS)
}

fn run_show(config: &Config) -> Result<ExitCode> {
    let ledger = CollectionLedger::open(&config.ledger_path)?;
    let entries = ledger.load_all()?;

    println!(
        "{:<10} {:<40} {:<14} {:>6} {:>7} {:<10} {}",
        "Passcode", "Name", "Status", "Attack", "Defense", "Attribute", "Database"
    );
    for entry in &entries {
        match entry {
            LedgerEntry::Card(c) => println!(
                "{:<10} {:<40} {:<14} {:>6} {:>7} {:<10} {}",
                c.passcode, c.name, c.status, c.attack, c.defense, c.attribute, c.source_file
            ),
            LedgerEntry::Separator(label) => println!("──── {} ────", label),
        }
    }
    println!("\n{} entries in {}", entries.len(), ledger.path().display());

    Ok(ExitCode::SUCCESS)
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<ExitCode> {
    let session = open_session(config)?;

    let mut app = ui::App::new(session);
    ui::run_ui(&mut app)?;

    Ok(ExitCode::SUCCESS)
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<ExitCode> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the lookup / separator / show subcommands");
    Ok(ExitCode::FAILURE)
}
