use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use stays_recon::compare::{self, ColumnChoice, EXIT_FAILURE, Outcome, RemoteScope};
use stays_recon::config::{DEFAULT_ENV_FILE, RemoteConfig};
use stays_recon::io::remote::{HttpPageSource, RemoteFetcher};
use stays_recon::model::{ColumnKey, DateRange};
use stays_recon::report::DEFAULT_PREVIEW;
use stays_recon::select::{DEFAULT_EXPECTED_CARDINALITY, SelectorConfig};
use stays_recon::{ReconError, Result};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(cli.verbose) {
        eprintln!("error: {error}");
        std::process::exit(EXIT_FAILURE);
    }
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(EXIT_FAILURE);
        }
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ReconError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<i32> {
    let (common, outcome) = match cli.command {
        Command::Codes(args) => {
            let mut fetcher = args.common.prepare(&cli.env_file)?;
            let outcome = compare::compare_reserve_codes(
                &args.common.input,
                &args.code_column,
                &mut fetcher,
                args.common.scope()?,
            )?;
            (args.common, outcome)
        }
        Command::Ids(args) => {
            let choice = match &args.column {
                Some(column) => ColumnChoice::Explicit(
                    ColumnKey::parse(column)
                        .ok_or_else(|| ReconError::UnknownColumn(column.clone()))?,
                ),
                None => ColumnChoice::Auto(SelectorConfig {
                    expected_cardinality: args.expected_count,
                }),
            };
            let mut fetcher = args.common.prepare(&cli.env_file)?;
            let outcome = compare::compare_external_ids(
                &args.common.input,
                &choice,
                &mut fetcher,
                args.common.scope()?,
            )?;
            (args.common, outcome)
        }
    };

    match &outcome {
        Outcome::Compared(report) if common.json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        Outcome::Compared(report) => print!("{}", report.text(common.preview)),
        Outcome::NoEligibleColumn => {
            println!("No eligible column: no sheet holds 24-hex reservation ids.");
        }
    }
    Ok(outcome.exit_code())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Reconcile a Stays spreadsheet export against the reservations store."
)]
struct Cli {
    /// Env-style file holding the store URL and API key.
    #[arg(long, global = true, default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compare the Reserva code column with the codes in remote external URLs.
    Codes(CodesArgs),
    /// Compare the auto-detected id column with remote external ids.
    Ids(IdsArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// Workbook exported by the channel manager.
    #[arg(long)]
    input: PathBuf,

    /// First check-in date (inclusive), YYYY-MM-DD.
    #[arg(long)]
    from: String,

    /// Last check-in date (inclusive), YYYY-MM-DD.
    #[arg(long)]
    to: String,

    /// Also include reservations without an external id.
    #[arg(long)]
    include_manual: bool,

    /// Maximum entries listed per difference.
    #[arg(long, default_value_t = DEFAULT_PREVIEW)]
    preview: usize,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

impl CommonArgs {
    fn scope(&self) -> Result<RemoteScope> {
        Ok(RemoteScope {
            range: DateRange::parse(&self.from, &self.to)?,
            only_imported: !self.include_manual,
        })
    }

    /// Validates local inputs before building the HTTP fetcher.
    fn prepare(&self, env_file: &Path) -> Result<RemoteFetcher<HttpPageSource>> {
        if !self.input.exists() {
            return Err(ReconError::MissingInput(self.input.clone()));
        }
        self.scope()?;
        let config = RemoteConfig::from_env_file(env_file)?;
        Ok(RemoteFetcher::new(
            HttpPageSource::new(&config)?,
            config.page_size,
        ))
    }
}

#[derive(Args)]
struct CodesArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Header of the column holding reservation codes.
    #[arg(long, default_value = "Reserva")]
    code_column: String,
}

#[derive(Args)]
struct IdsArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Use this column instead of auto-detection, as `Sheet::Header`.
    #[arg(long)]
    column: Option<String>,

    /// Column size preferred when overlap scores tie.
    #[arg(long, default_value_t = DEFAULT_EXPECTED_CARDINALITY)]
    expected_count: usize,
}
