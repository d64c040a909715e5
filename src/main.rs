use clap::{Parser as ClapParser, Subcommand};
use flexi_logger::{Logger, LoggerHandle};
use qlfront::ParserConfig;
use qlfront::cli::{self, CheckOptions, CheckResult, CliError, QueryKind};
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(name = "qlparse")]
#[command(about = "Parse expressions, SQL statements and FilterQL filters")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML file with parser settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Accept unknown functions and wrong arities as unchecked calls
    #[arg(long, global = true)]
    lenient: bool,

    /// Print a JSON description of the syntax tree
    #[arg(long, global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(short, long, global = true)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a standalone expression
    Expr {
        /// The expression (reads from stdin if not provided)
        query: Option<String>,
    },

    /// Parse one SQL statement
    Sql {
        /// The statement (reads from stdin if not provided)
        query: Option<String>,
    },

    /// Parse one FilterQL statement
    Filter {
        /// The filter (reads from stdin if not provided)
        query: Option<String>,
    },
}

fn init_logging() -> Option<LoggerHandle> {
    Logger::try_with_env_or_str("warn")
        .and_then(|logger| logger.log_to_stderr().start())
        .ok()
}

fn main() {
    let _logger = init_logging();
    let cli = Cli::parse();

    let (kind, query) = match cli.command {
        Commands::Expr { query } => (QueryKind::Expression, query),
        Commands::Sql { query } => (QueryKind::Sql, query),
        Commands::Filter { query } => (QueryKind::Filter, query),
    };

    let result = load_config(cli.config, cli.lenient)
        .and_then(|config| run_check(kind, query, config, cli.json, cli.pretty));

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<PathBuf>, lenient: bool) -> Result<ParserConfig, CliError> {
    let mut config = match path {
        Some(path) => ParserConfig::load(&path)?,
        None => ParserConfig::default(),
    };
    if lenient {
        config.mode = qlfront::ParseMode::Lenient;
    }
    Ok(config)
}

fn run_check(
    kind: QueryKind,
    query: Option<String>,
    config: ParserConfig,
    json: bool,
    pretty: bool,
) -> Result<(), CliError> {
    let query = match query {
        Some(s) => s,
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            buffer
        }
        None => return Err(CliError::NoInput),
    };

    let options = CheckOptions {
        query,
        kind,
        config,
        json,
    };

    match cli::execute_check(&options)? {
        CheckResult::Rendered(text) => println!("{}", text),
        CheckResult::Tree(output) => {
            let json = if pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            }?;
            println!("{}", json);
        }
    }
    Ok(())
}
