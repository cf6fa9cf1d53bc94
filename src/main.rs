use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use recipient_picker::config::{self, Config};
use recipient_picker::phone;
use recipient_picker::snapshot::single_contact;
use recipient_picker::providers::file::{FileDirectory, FileHistory, StaticPermissionGate, StderrAlerts};
use recipient_picker::{
    Collaborators, Input, Position, RenderedSection, RowStatus, SelectorEngine, SelectorObserver, SelectorRuntime,
    Snapshot,
};

#[derive(Parser, Debug)]
#[command(name = "recipient-picker")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show how a phone number is read
    Normalize(NormalizeArgs),
    /// List the recipients matching a search text
    Query(QueryArgs),
    /// Search, then pick the first entry
    Pick(QueryArgs),
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    text: String,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Search text (name or phone digits)
    #[arg(default_value = "")]
    text: String,

    /// Ask for directory access before searching
    #[arg(long, default_value_t = false)]
    request_access: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Normalize(args) => {
            handle_normalize(args);
            Ok(())
        }
        Command::Query(args) => {
            let config = config::load(cli.config.as_deref())?;
            let engine = run_session(&args, &config)?;
            print_snapshot(&engine.snapshot());
            Ok(())
        }
        Command::Pick(args) => {
            let config = config::load(cli.config.as_deref())?;
            let engine = run_session(&args, &config)?;
            handle_pick(engine, &config)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_normalize(args: NormalizeArgs) {
    let normalized = phone::normalize(&args.text);
    println!("display\t{}", normalized.display_text);
    println!("digits\t{}", normalized.digits_only);
    println!("country\t{}", normalized.country_name.as_deref().unwrap_or("-"));
}

fn run_session(args: &QueryArgs, config: &Config) -> Result<SelectorEngine> {
    let collaborators = Collaborators {
        gate: StaticPermissionGate::new(config.permission, config.grant_on_request),
        directory: FileDirectory::new(config.directory.path.clone()),
        history: FileHistory::new(config.history.path.clone()),
        alerts: StderrAlerts,
    };
    let runtime = SelectorRuntime::new(SelectorEngine::new(config.engine_options()), collaborators);

    let (tx, rx) = mpsc::unbounded_channel();
    if args.request_access {
        tx.send(Input::RequestAccess).context("picker session ended early")?;
    }
    tx.send(Input::SearchText(args.text.clone()))
        .context("picker session ended early")?;
    drop(tx);

    let executor = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(executor.block_on(runtime.run(rx)))
}

/// Keeps the most recently published snapshot.
struct LastSnapshot(Rc<RefCell<Option<Snapshot>>>);

impl SelectorObserver for LastSnapshot {
    fn render(&mut self, snapshot: &Snapshot) {
        *self.0.borrow_mut() = Some(snapshot.clone());
    }
}

fn handle_pick(mut engine: SelectorEngine, config: &Config) -> Result<()> {
    let published = Rc::new(RefCell::new(None));
    engine.subscribe(Box::new(LastSnapshot(published.clone())));

    // The first row is either a contact or the "not found" entry.
    let commands = engine.select_row(Position::new(0, 0))?;
    if !commands.is_empty() {
        debug!(?commands, "ignoring follow-up commands");
    }

    let snapshot = published.borrow_mut().take().unwrap_or_else(|| engine.snapshot());
    match &snapshot.selection {
        Some(selection) => {
            println!("{}\t{}", selection.contact.name, selection.contact.phone);
            if let Some(state) = snapshot.notify_state {
                println!("fold\t{}", state.label());
            }
            print_snapshot(&single_contact(&selection.contact, config.self_contact.as_ref()));
        }
        None => println!("Nothing selected for \"{}\"", snapshot.search_text),
    }
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot) {
    for section in &snapshot.sections {
        match section {
            RenderedSection::Contacts { kind, rows } => {
                println!("[{}]", kind.label());
                for row in rows {
                    let marker = match (row.is_self, row.status) {
                        (true, _) => "self",
                        (false, Some(RowStatus::Recent)) => "recent",
                        (false, Some(RowStatus::Collapsed)) => "selected",
                        (false, None) => " ",
                    };
                    println!("{}\t{}\t{}", row.contact.name, row.contact.phone, marker);
                }
            }
            RenderedSection::NotFound {
                detailed,
                query,
                country_name,
            } => {
                let detail = if *detailed { "directory searched" } else { "directory unavailable" };
                match country_name {
                    Some(country) => println!("[not found] \"{}\" ({}, {})", query, country, detail),
                    None => println!("[not found] \"{}\" ({})", query, detail),
                }
            }
            RenderedSection::Access => println!("[grant access]"),
        }
    }
}
