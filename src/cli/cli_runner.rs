use clap::Parser;
use colored::*;
use std::path::Path;
use std::time::Instant;

use crate::cli::{CacheCommand, CliArgs, Commands, OutputFormat, OutputFormatter, ScanOutput};
use crate::utils::config::EngineConfig;
use crate::utils::error::{CursorError, MirageResult};
use crate::utils::types::CellValue;
use crate::vtab::{Openable, Resolvable, Scannable, TableModule};

/// Main CLI runner that handles command execution
pub struct CliRunner {
    module: TableModule,
}

impl CliRunner {
    /// Build a runner from an optional configuration file
    pub fn new(config_path: Option<&str>) -> MirageResult<Self> {
        let config = match config_path {
            Some(path) => EngineConfig::load(Path::new(path))?,
            None => EngineConfig::default(),
        };

        Ok(Self {
            module: TableModule::from_config(&config)?,
        })
    }

    /// Build a runner over an existing module, mainly for tests
    pub fn with_module(module: TableModule) -> Self {
        Self { module }
    }

    /// Resolve a table's schema and return a formatted listing
    pub async fn show_schema(
        &self,
        table: &str,
        description: &str,
        verbose: bool,
    ) -> MirageResult<String> {
        if verbose {
            eprintln!(
                "{}",
                OutputFormatter::format_info(&format!("Resolving schema for table '{}'", table))
            );
        }

        let handle = self.module.resolve(table, description).await?;

        let mut output = String::new();
        output.push_str(&format!("{} {}\n\n", "Schema for".bold(), table.cyan().bold()));

        output.push_str(&format!("{}\n", "Columns:".bold()));
        for col in handle.columns() {
            output.push_str(&format!(
                "  {} {} {}",
                "•".green(),
                col.name.cyan().bold(),
                col.column_type.to_string().blue()
            ));
            if !col.constraints.is_empty() {
                output.push_str(&format!(" {}", col.constraints.yellow()));
            }
            if !col.description.is_empty() {
                output.push_str(&format!("  {}", col.description.dimmed()));
            }
            output.push('\n');
        }

        output.push_str(&format!("\n{}\n", handle.declaration().dimmed()));
        Ok(output)
    }

    /// Materialize a table, scan it through a cursor and format the rows
    pub async fn scan_rows(
        &self,
        table: &str,
        description: &str,
        format: &OutputFormat,
        limit: Option<usize>,
        verbose: bool,
    ) -> MirageResult<String> {
        let start = Instant::now();

        let handle = self.module.resolve(table, description).await?;
        if verbose {
            eprintln!(
                "{}",
                OutputFormatter::format_info(&format!(
                    "Schema resolved with {} column(s)",
                    handle.columns().len()
                ))
            );
        }

        let mut cursor = handle.open().await?;
        cursor.filter(&[]);

        let column_count = handle.columns().len();
        let mut rows = Vec::new();

        while !cursor.at_end() {
            if limit.map_or(false, |max| rows.len() >= max) {
                break;
            }

            let mut row = Vec::with_capacity(column_count);
            for index in 0..column_count {
                match cursor.read_column(index) {
                    Ok(value) => row.push(value),
                    Err(CursorError::TypeMismatch { .. }) => {
                        // One bad cell does not sink the scan.
                        eprintln!(
                            "{}",
                            OutputFormatter::format_warning(&format!(
                                "row {}: unreadable cell in column {}",
                                cursor.row_identity(),
                                index
                            ))
                        );
                        row.push(CellValue::Null);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            rows.push(row);
            cursor.advance();
        }
        cursor.close();

        if verbose {
            eprintln!(
                "{}",
                OutputFormatter::format_info(&format!("Scanned {} row(s)", rows.len()))
            );
        }

        let output = ScanOutput {
            table_name: table.to_string(),
            columns: handle.columns().to_vec(),
            rows,
            elapsed: start.elapsed(),
        };

        Ok(OutputFormatter::format_scan(&output, format))
    }

    /// List the contents of the durable data cache
    pub fn cache_list(&self, detailed: bool) -> MirageResult<String> {
        let entries = self.module.data_cache().list()?;

        if entries.is_empty() {
            return Ok(OutputFormatter::format_info("The data cache is empty."));
        }

        let mut output = String::new();
        output.push_str(&format!("{}\n", "Cached tables:".bold()));

        for entry in &entries {
            output.push_str(&format!(
                "  {} {} ({} bytes)\n",
                "•".green(),
                entry.table_name.cyan().bold(),
                entry.size_bytes
            ));
            if detailed {
                output.push_str(&format!("    Path: {}\n", entry.path.display()));
                if let Some(modified) = entry.modified {
                    output.push_str(&format!(
                        "    Modified: {}\n",
                        modified.format("%Y-%m-%d %H:%M:%S")
                    ));
                }
            }
        }

        Ok(output)
    }

    /// Clear the cache for one table, or all of it
    pub fn cache_clear(&self, table: Option<&str>) -> MirageResult<String> {
        match table {
            Some(table) => {
                if self.module.data_cache().clear(table)? {
                    Ok(OutputFormatter::format_success(&format!(
                        "Cleared cached data for table '{}'",
                        table
                    )))
                } else {
                    Ok(OutputFormatter::format_info(&format!(
                        "No cached data for table '{}'",
                        table
                    )))
                }
            }
            None => {
                let removed = self.module.data_cache().clear_all()?;
                Ok(OutputFormatter::format_success(&format!(
                    "Cleared {} cached table(s)",
                    removed
                )))
            }
        }
    }
}

/// Main entry point for CLI execution
pub async fn run_cli() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let runner = match CliRunner::new(args.config.as_deref()) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("{}", OutputFormatter::format_error(&e));
            std::process::exit(1);
        }
    };

    match args.command {
        Commands::Schema {
            table,
            description,
            verbose,
        } => match runner.show_schema(&table, &description, verbose).await {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("{}", OutputFormatter::format_error(&e));
                std::process::exit(1);
            }
        },

        Commands::Rows {
            table,
            description,
            format,
            limit,
            verbose,
        } => match runner
            .scan_rows(&table, &description, &format, limit, verbose)
            .await
        {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("{}", OutputFormatter::format_error(&e));
                std::process::exit(1);
            }
        },

        Commands::Cache { action } => {
            let result = match action {
                CacheCommand::List { detailed } => runner.cache_list(detailed),
                CacheCommand::Clear { table } => runner.cache_clear(table.as_deref()),
            };
            match result {
                Ok(output) => println!("{}", output),
                Err(e) => {
                    eprintln!("{}", OutputFormatter::format_error(&e));
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
