//! Card action policy CLI.
//!
//! Evaluates the permitted actions for a card snapshot against the built-in
//! reference table or a TOML policy table, and manages policy table files.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use card_policy::core::evaluator::Evaluator;
use card_policy::core::table::PolicyTable;
use card_policy::core::types::{Classification, LifecycleState, PermittedActions};
use card_policy::exit_codes;
use card_policy::io::table_store::{load_table, load_table_or_reference, write_table};
use card_policy::logging;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "card-policy",
    version,
    about = "Evaluate permitted card actions from a policy table"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the actions permitted for one (classification, state, PIN) snapshot.
    Evaluate {
        /// Card classification (prepaid, debit, credit).
        #[arg(long)]
        classification: Classification,
        /// Lifecycle state (ordered, inactive, active, restricted, blocked, expired, closed).
        #[arg(long)]
        state: LifecycleState,
        /// The card has a PIN set.
        #[arg(long)]
        pin: bool,
        /// Policy table file; the built-in reference table when omitted.
        #[arg(long)]
        table: Option<PathBuf>,
        /// Print a JSON array instead of one action per line.
        #[arg(long)]
        json: bool,
    },
    /// Print the permitted actions for every snapshot, one row per line.
    Matrix {
        /// Policy table file; the built-in reference table when omitted.
        #[arg(long)]
        table: Option<PathBuf>,
    },
    /// Write the built-in reference table as TOML.
    Init {
        /// Destination file.
        #[arg(long, default_value = "policy.toml")]
        path: PathBuf,
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Load a policy table file and check its invariants.
    Validate {
        /// Policy table file.
        #[arg(long)]
        table: PathBuf,
    },
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::INVALID);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Evaluate {
            classification,
            state,
            pin,
            table,
            json,
        } => cmd_evaluate(classification, state, pin, table.as_deref(), json),
        Command::Matrix { table } => cmd_matrix(table.as_deref()),
        Command::Init { path, force } => cmd_init(&path, force),
        Command::Validate { table } => cmd_validate(&table),
    }
}

fn evaluator_for(table: Option<&Path>) -> Result<Evaluator> {
    let table = load_table_or_reference(table)?;
    Ok(Evaluator::new(Arc::new(table)))
}

fn cmd_evaluate(
    classification: Classification,
    state: LifecycleState,
    pin: bool,
    table: Option<&Path>,
    json: bool,
) -> Result<()> {
    let evaluator = evaluator_for(table)?;
    let actions = evaluator.evaluate(classification, state, pin)?;
    let mut stdout = std::io::stdout().lock();
    if json {
        let payload = serde_json::to_string(&actions).context("serialize actions")?;
        writeln!(stdout, "{}", payload)?;
    } else {
        for action in actions.iter() {
            writeln!(stdout, "{}", action)?;
        }
    }
    Ok(())
}

fn cmd_matrix(table: Option<&Path>) -> Result<()> {
    let evaluator = evaluator_for(table)?;
    let mut stdout = std::io::stdout().lock();
    for classification in Classification::ALL {
        for state in LifecycleState::ALL {
            for pin in [false, true] {
                let actions = evaluator.evaluate(classification, state, pin)?;
                writeln!(stdout, "{}", matrix_row(classification, state, pin, &actions))?;
            }
        }
    }
    Ok(())
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    if !force && path.exists() {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    write_table(path, &PolicyTable::reference()?)
        .with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "wrote reference policy table");
    Ok(())
}

fn cmd_validate(table: &Path) -> Result<()> {
    load_table(table)?;
    println!("{}: ok", table.display());
    Ok(())
}

/// `<classification>\t<state>\tpin=<yes|no>\t<actions or ->`.
fn matrix_row(
    classification: Classification,
    state: LifecycleState,
    pin: bool,
    actions: &PermittedActions,
) -> String {
    let actions = if actions.is_empty() {
        "-".to_string()
    } else {
        actions.names().join(",")
    };
    format!(
        "{}\t{}\tpin={}\t{}",
        classification,
        state,
        if pin { "yes" } else { "no" },
        actions
    )
}
