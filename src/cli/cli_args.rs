use clap::{Parser, Subcommand, ValueEnum};

/// Mirage CLI - generative virtual tables with durable caching
#[derive(Parser, Debug)]
#[command(name = "mirage")]
#[command(about = "Generative virtual table engine with lazy materialization and durable caching")]
#[command(version = "0.1.0")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve and display the schema of a virtual table
    Schema {
        /// Table name
        #[arg(value_name = "TABLE")]
        table: String,

        /// Natural-language description of the table
        #[arg(short, long, default_value = "")]
        description: String,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Materialize a virtual table and print its rows
    Rows {
        /// Table name
        #[arg(value_name = "TABLE")]
        table: String,

        /// Natural-language description of the table
        #[arg(short, long, default_value = "")]
        description: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        /// Maximum number of rows to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Inspect or clear the durable data cache
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

/// Cache maintenance subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// List cached tables
    List {
        /// Show file paths and timestamps
        #[arg(short, long)]
        detailed: bool,
    },

    /// Remove cached data for one table, or the whole cache
    Clear {
        /// Table to clear; clears everything when omitted
        table: Option<String>,
    },
}

/// Output format options
#[derive(ValueEnum, Debug, Clone)]
pub enum OutputFormat {
    /// Formatted table output
    Table,
    /// JSON output
    Json,
    /// CSV output
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
