// obstack CLI
//
// Expands an observability stack document into chart releases, Grafana
// objects, and usage edges.

mod config;
mod logging;
mod output;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use obstack_core::{StackSpec, Value};
use obstack_expander::{deletion_order, Expander};
use tracing::debug;

use crate::config::{Config, LogFormat, OutputFormat};

#[derive(Parser)]
#[command(name = "obstack")]
#[command(version)]
#[command(about = "Expand an observability stack into releases, objects, and usage edges", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to $XDG_CONFIG_HOME/obstack/config.toml)
    #[arg(long, global = true, env = "OBSTACK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level filter, overridden by RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log line format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand a stack document into manifests
    Expand {
        /// Path to the stack document (YAML or JSON), or - for stdin
        #[arg(short, long, default_value = "-")]
        file: String,

        /// Output format
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// Print the order in which resources can be deleted
    Edges {
        /// Path to the stack document (YAML or JSON), or - for stdin
        #[arg(short, long, default_value = "-")]
        file: String,
    },

    /// Print the built-in chart coordinates
    Defaults,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    logging::init(&level, cli.log_format.unwrap_or(config.log_format));

    let expander = Expander::default();
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Expand { file, output } => {
            let spec = read_spec(&file)?;
            let expansion = expander
                .expand(&spec)
                .with_context(|| format!("expanding {file}"))?;
            let rendered = output::render_expansion(&expansion, output.unwrap_or(config.output))?;
            stdout.write_all(rendered.as_bytes())?;
        }
        Commands::Edges { file } => {
            let spec = read_spec(&file)?;
            let expansion = expander
                .expand(&spec)
                .with_context(|| format!("expanding {file}"))?;
            let order = deletion_order(&expansion)?;
            stdout.write_all(output::render_order(&order).as_bytes())?;
        }
        Commands::Defaults => {
            for (kind, defaults) in expander.registry().iter() {
                writeln!(
                    stdout,
                    "{:<20} {:<22} {:<8} {}",
                    kind.field_name(),
                    defaults.chart.name,
                    defaults.chart.version,
                    defaults.chart.repository
                )?;
            }
        }
    }

    Ok(())
}

fn read_spec(file: &str) -> Result<StackSpec> {
    let contents = if file == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("reading stack document from stdin")?;
        buf
    } else {
        std::fs::read_to_string(Path::new(file))
            .with_context(|| format!("reading stack document {file}"))?
    };
    debug!(file, bytes = contents.len(), "read stack document");

    parse_spec(&contents).with_context(|| format!("parsing stack document {file}"))
}

fn parse_spec(contents: &str) -> Result<StackSpec> {
    let document: Value = serde_yaml::from_str(contents)?;
    Ok(StackSpec::from_document(document)?)
}
