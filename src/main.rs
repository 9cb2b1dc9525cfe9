//! `scour`: clean a JSON markup tree and print its canonical text.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dom::debug::outline;
use pipeline::{CleanError, Config, ConfigError, Document, Node, clean_node};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const OUTLINE_CAP: usize = 200;

#[derive(Parser, Debug)]
#[command(author, version, about = "Clean and canonicalize rich-text markup trees")]
struct Cli {
    /// JSON tree to clean; reads stdin when omitted or "-"
    input: Option<PathBuf>,

    /// TOML file with [policy], [serialize] and [limits] tables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Treat the content as still being edited
    #[arg(long)]
    live: bool,

    /// Print the cleaned tree as JSON instead of canonical text
    #[arg(long, conflicts_with = "outline")]
    json: bool,

    /// Print an outline of the cleaned tree instead of canonical text
    #[arg(long)]
    outline: bool,
}

#[derive(Debug, thiserror::Error)]
enum Failure {
    #[error("failed to read input: {0}")]
    Input(io::Error),
    #[error("input is not a valid tree: {0}")]
    Json(serde_json::Error),
    #[error(transparent)]
    Config(ConfigError),
    #[error("input could not be cleaned: {0}")]
    Clean(CleanError),
    #[error("failed to encode the cleaned tree: {0}")]
    Output(serde_json::Error),
}

impl Failure {
    /// sysexits-style codes.
    fn exit_code(&self) -> ExitCode {
        match self {
            Failure::Clean(_) => ExitCode::from(65),
            Failure::Input(_) | Failure::Json(_) => ExitCode::from(66),
            Failure::Output(_) => ExitCode::from(70),
            Failure::Config(_) => ExitCode::from(78),
        }
    }
}

fn init_logging() {
    let filter = std::env::var("SCOUR_LOG")
        .ok()
        .and_then(|value| EnvFilter::try_new(value).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .try_init();
}

fn read_input(path: Option<&PathBuf>) -> Result<String, Failure> {
    match path {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path).map_err(Failure::Input),
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(Failure::Input)?;
            Ok(buf)
        }
    }
}

fn run(cli: &Cli) -> Result<String, Failure> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path).map_err(Failure::Config)?,
        None => Config::default(),
    };
    config.live |= cli.live;

    let source = read_input(cli.input.as_ref())?;
    let tree: Node = serde_json::from_str(&source).map_err(Failure::Json)?;
    let cleaned = clean_node(&tree, &config).map_err(Failure::Clean)?;
    log::info!(
        "cleaned {} input nodes with {} edits",
        cleaned.report.input.nodes,
        cleaned.report.sanitize.edits
    );

    if cli.json {
        return serde_json::to_string_pretty(&cleaned.node).map_err(Failure::Output);
    }
    if cli.outline {
        let (doc, root) = Document::from_node(&cleaned.node);
        return Ok(outline(&doc, root, OUTLINE_CAP).join("\n"));
    }
    Ok(cleaned.text)
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(failure) => {
            eprintln!("scour: {failure}");
            failure.exit_code()
        }
    }
}
