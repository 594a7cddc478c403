use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use oraschema::cli::{self, clean::CleanArgs, InterruptSlot};
use oraschema::config::OraConfig;
use oraschema::db::ConnectionProvider;
use oraschema::schema::SchemaAdmin;

#[derive(Parser)]
#[command(name = "oraschema", version, about = "Oracle schema utilities for coursework databases")]
struct Cli {
    /// Config file [default: ~/.oraschema/config.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter for stderr diagnostics (overrides config)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive menu (the default)
    Menu,
    /// List all tables in the schema
    Tables {
        /// Print the full inventory as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check the Flyway control table and list applied migrations
    History,
    /// Check that Flyway ran and the application's tables exist
    Verify,
    /// Drop all tables and sequences, disabling foreign keys first
    Clean {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
        /// Only drop these tables
        #[arg(short, long, num_args = 1.., value_delimiter = ',')]
        tables: Vec<String>,
        /// Only list the tables, drop nothing
        #[arg(short, long)]
        list: bool,
        /// Report what would be dropped without sending any statement
        #[arg(long)]
        dry_run: bool,
        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run one SQL statement (read from stdin when omitted)
    Sql {
        statement: Vec<String>,
    },
    /// Merge the API request fragments into one collection file
    CombineCollection {
        /// Directory holding the collection files
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => OraConfig::load_from(path)?,
        None => OraConfig::load()?,
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    // Log to stderr so stdout stays readable for operator output.
    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(connect_string = %config.connection.connect_string, "configuration loaded");

    match cli.command.unwrap_or(Command::Menu) {
        Command::CombineCollection { dir } => {
            cli::combine_collection(&config, dir.as_deref())?;
        }
        command => {
            let interrupts = InterruptSlot::default();
            watch_interrupts(interrupts.clone());
            run_with_database(command, config, interrupts).await?;
        }
    }

    Ok(())
}

/// First Ctrl-C during a teardown stops it after the current statement;
/// otherwise Ctrl-C exits.
fn watch_interrupts(interrupts: InterruptSlot) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupts.interrupt() {
                eprintln!("\nInterrupt received. Stopping after the current statement...");
            } else {
                eprintln!("\nClosing...");
                std::process::exit(130);
            }
        }
    });
}

#[cfg(feature = "oracle")]
async fn run_with_database(
    command: Command,
    config: OraConfig,
    interrupts: InterruptSlot,
) -> Result<()> {
    use anyhow::Context;
    use oraschema::db::driver::OraclePool;

    config.validate()?;
    let pool = OraclePool::connect(&config.connection).context(
        "failed to connect to Oracle; check ORACLE_USER, ORACLE_PASSWORD and ORACLE_CONNECT_STRING",
    )?;
    let admin = SchemaAdmin::new(pool);

    // The database layer blocks; keep it off the runtime so Ctrl-C is still observed.
    tokio::task::spawn_blocking(move || dispatch(command, &admin, &config, &interrupts)).await?
}

#[cfg(not(feature = "oracle"))]
async fn run_with_database(
    _command: Command,
    _config: OraConfig,
    _interrupts: InterruptSlot,
) -> Result<()> {
    anyhow::bail!("this build has no Oracle driver; rebuild with `--features oracle`")
}

#[cfg_attr(not(feature = "oracle"), allow(dead_code))]
fn dispatch<P: ConnectionProvider>(
    command: Command,
    admin: &SchemaAdmin<P>,
    config: &OraConfig,
    interrupts: &InterruptSlot,
) -> Result<()> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();

    match command {
        Command::Menu => cli::menu::run_menu(admin, config, interrupts, &mut input),
        Command::Tables { json } => cli::tables::tables(admin, json),
        Command::History => cli::history::history(admin),
        Command::Verify => cli::verify::verify(admin, &config.verify.expected_tables),
        Command::Clean {
            force,
            tables,
            list,
            dry_run,
            json,
        } => {
            let args = CleanArgs {
                force,
                tables,
                list_only: list,
                dry_run,
                json,
            };
            cli::clean::clean(admin, &args, interrupts, &mut input)
        }
        Command::Sql { statement } => {
            let statement = (!statement.is_empty()).then(|| statement.join(" "));
            cli::sql::sql(admin, statement, &mut input)
        }
        Command::CombineCollection { dir } => {
            cli::combine_collection(config, dir.as_deref())
        }
    }
}
