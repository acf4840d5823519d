mod creds;
mod db;
mod error;
mod export;
mod history;
mod session;
mod shell;
mod types;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;

use creds::CredentialBook;
use db::{ConnectionParams, Handle};
use error::SqdashError;
use history::HistoryStore;
use session::SessionState;
use shell::Shell;
use types::QuerySpec;

#[derive(Parser)]
#[command(name = "sqdash")]
#[command(about = "A keyboard-first dashboard for querying relational databases")]
struct Cli {
    /// Database to open: a SQLite file path, or :memory:
    #[arg(value_name = "DATABASE")]
    database: Option<String>,

    /// Server host, kept for connection suggestions
    #[arg(long, default_value = "")]
    host: String,

    /// User name, kept for connection suggestions
    #[arg(long, default_value = "")]
    user: String,

    /// Password; never persisted anywhere
    #[arg(long, default_value = "")]
    password: String,

    /// Saved-query history file
    #[arg(long, value_name = "PATH", default_value = "queries/query_history.json")]
    history_file: PathBuf,

    /// Connection-suggestion file
    #[arg(
        long,
        value_name = "PATH",
        default_value = "app/credentials/credentials.json"
    )]
    credentials_file: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List user tables
    Tables,

    /// Show column metadata for a table
    Schema {
        table: String,
    },

    /// Build a SELECT from clause fragments and run it
    Fetch {
        #[arg(long)]
        table: String,

        /// Comma-separated column list; empty means all columns
        #[arg(long, default_value = "")]
        columns: String,

        #[arg(long = "where", default_value = "")]
        where_clause: String,

        #[arg(long, default_value = "")]
        group_by: String,

        #[arg(long, default_value = "")]
        having: String,

        #[arg(long, default_value = "")]
        order_by: String,

        #[arg(long, default_value = "")]
        limit: String,

        #[arg(long, default_value = "")]
        offset: String,

        /// Also write the result to a CSV file
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Run a free-form SQL statement
    Query {
        sql: String,

        /// Also write the result to a CSV file
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Saved-query history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Show recently used connection values
    Recent,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List saved queries, oldest first
    List,

    /// Validate a query and save it under a title
    Add { title: String, query: String },

    /// Replace a saved query, re-validating it first
    Edit {
        index: usize,
        title: String,
        query: String,
    },

    /// Delete a saved query
    Rm { index: usize },

    /// Replay a saved query
    Run { index: usize },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut cli = Cli::parse();
    let command = cli.command.take();

    match command {
        None => {
            let (handle, history) = open_session(&cli)?;
            Shell::new(handle, history).run()
        }
        Some(Commands::Recent) => {
            show_recent(&cli.credentials_file);
            Ok(())
        }
        Some(Commands::Tables) => {
            let (mut handle, _) = open_session(&cli)?;
            for table in db::list_tables(&mut handle)? {
                println!("{table}");
            }
            Ok(())
        }
        Some(Commands::Schema { table }) => {
            let (mut handle, _) = open_session(&cli)?;
            let columns = db::describe(&mut handle, &table)?;
            print!("{}", shell::render_schema(&columns));
            Ok(())
        }
        Some(Commands::Fetch {
            table,
            columns,
            where_clause,
            group_by,
            having,
            order_by,
            limit,
            offset,
            out,
        }) => {
            let (mut handle, _) = open_session(&cli)?;
            let spec = QuerySpec {
                table,
                columns,
                where_clause,
                group_by,
                having,
                order_by,
                limit,
                offset,
            };
            let mut session = SessionState::new();
            let result = session.submit_spec(&mut handle, &spec)?;
            shell::print_result(result);
            maybe_export(&session, out.as_deref())
        }
        Some(Commands::Query { sql, out }) => {
            let (mut handle, _) = open_session(&cli)?;
            let mut session = SessionState::new();
            let result = session.submit(&mut handle, &sql)?;
            shell::print_result(result);
            maybe_export(&session, out.as_deref())
        }
        Some(Commands::History { action }) => {
            let (mut handle, history) = open_session(&cli)?;
            run_history(&mut handle, &history, action)
        }
    }
}

/// Connect with the CLI's parameters, note the successful connection in
/// the credential book, and hand back the session pieces.
fn open_session(cli: &Cli) -> Result<(Handle, HistoryStore)> {
    let database = cli
        .database
        .clone()
        .context("database path is required")?;
    let params = ConnectionParams {
        host: cli.host.clone(),
        user: cli.user.clone(),
        password: cli.password.clone(),
        database,
    };

    let handle = Handle::connect(params.clone())?;

    let mut book = CredentialBook::load(&cli.credentials_file);
    book.record(&params.host, &params.user, &params.database);
    if let Err(e) = book.save(&cli.credentials_file) {
        warn!("could not update connection suggestions: {e}");
    }

    Ok((handle, HistoryStore::new(&cli.history_file)))
}

/// Export the session's result when `--out` was given. An empty result
/// is a warning, not a failure; real export errors propagate.
fn maybe_export(session: &SessionState, out: Option<&Path>) -> Result<()> {
    let Some(path) = out else {
        return Ok(());
    };
    match session.export_csv(path) {
        Ok(()) => {
            println!("exported to {}", path.display());
            Ok(())
        }
        Err(SqdashError::Validation(message)) => {
            warn!("{message}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn run_history(handle: &mut Handle, history: &HistoryStore, action: HistoryAction) -> Result<()> {
    match action {
        HistoryAction::List => {
            shell::print_history(&history.list());
            Ok(())
        }
        HistoryAction::Add { title, query } => {
            history.append(handle, &title, &query)?;
            println!("saved '{title}'");
            Ok(())
        }
        HistoryAction::Edit {
            index,
            title,
            query,
        } => {
            history.update(handle, index, &title, &query)?;
            println!("updated '{title}'");
            Ok(())
        }
        HistoryAction::Rm { index } => {
            if history.get(index).is_none() {
                println!("no saved query at index {index}");
                return Ok(());
            }
            history.delete(index)?;
            println!("removed {index}");
            Ok(())
        }
        HistoryAction::Run { index } => {
            let entry = history
                .get(index)
                .with_context(|| format!("no saved query at index {index}"))?;
            println!("{}", entry.query);
            let mut session = SessionState::new();
            let result = session.submit(handle, &entry.query)?;
            shell::print_result(result);
            Ok(())
        }
    }
}

fn show_recent(path: &Path) {
    let book = CredentialBook::load(path);
    if book.is_empty() {
        println!("no recent connection values");
        return;
    }
    print_recent("host", &book.host);
    print_recent("user", &book.user);
    print_recent("database", &book.database);
}

fn print_recent(label: &str, values: &[String]) {
    if !values.is_empty() {
        println!("{label}: {}", values.join(", "));
    }
}
