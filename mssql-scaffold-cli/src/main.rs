//! mssql-scaffold CLI
//!
//! Generates model sources (and optionally a database context) from a live
//! SQL Server schema, or prints the schema as read from the catalog.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::debug;
use mssql_scaffold::{Language, MssqlConnectionFactory, ScaffoldConfig, Scaffolder, TableDescriptor};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "mssql-scaffold")]
#[command(about = "Scaffold ORM models from a SQL Server schema")]
#[command(version = "0.1.0")]
struct Cli {
    /// ADO-style connection string (overrides config and MSSQL_SCAFFOLD_CONNECTION)
    #[arg(long)]
    connection_string: Option<String>,

    /// Configuration file
    #[arg(long, default_value = mssql_scaffold::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Database to scaffold
    #[arg(long)]
    database: String,

    /// Project directory
    #[arg(long, default_value = ".")]
    project: PathBuf,

    /// Namespace (module path for Rust) of the generated code
    #[arg(long)]
    namespace: Option<String>,

    /// Output language: rust or csharp (default from config)
    #[arg(long)]
    language: Option<Language>,

    /// Report obsolete artifacts instead of deleting them
    #[arg(long)]
    safe_mode: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one model per table into the project's models directory
    Models(GenerateArgs),

    /// Generate models, then a context enumerating them
    Context(GenerateArgs),

    /// Print the schema read from the catalog
    Inspect {
        #[arg(long)]
        database: String,

        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if cli.quiet {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();
    } else if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match run(cli.command, cli.connection_string, cli.config) {
        Ok(()) => {
            if !cli.quiet {
                println!("{}", "✅ Success".green());
            }
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{} {:#}", "❌ Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

fn run(command: Commands, connection_string: Option<String>, config_path: PathBuf) -> Result<()> {
    let mut config = ScaffoldConfig::load_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    debug!(
        "Loaded configuration from {} (language: {}, safe mode: {})",
        config_path.display(),
        config.language,
        config.safe_mode
    );

    if let Some(cs) = connection_string {
        debug!("Using connection string from --connection-string");
        config = config.with_connection_string(cs);
    } else if let Ok(cs) = std::env::var("MSSQL_SCAFFOLD_CONNECTION") {
        debug!("Using connection string from MSSQL_SCAFFOLD_CONNECTION");
        config = config.with_connection_string(cs);
    }

    let factory = MssqlConnectionFactory::new(config.connection_string.clone())?;

    match command {
        Commands::Models(args) => {
            let language = args.language.unwrap_or(config.language);
            let scaffolder = Scaffolder::new(factory).with_language(language);
            let destination = args.project.join(language.target().models_dir());
            let safe_mode = args.safe_mode || config.safe_mode;

            println!(
                "🔧 Generating {} models for {} into {}",
                language,
                args.database.bold(),
                destination.display()
            );
            if !scaffolder.generate_schema(&args.database, &destination, args.namespace.as_deref(), safe_mode) {
                bail!("model generation for {} failed (see log)", args.database);
            }
            Ok(())
        }
        Commands::Context(args) => {
            let language = args.language.unwrap_or(config.language);
            let scaffolder = Scaffolder::new(factory).with_language(language);
            let safe_mode = args.safe_mode || config.safe_mode;

            println!(
                "🔧 Generating {} context for {} in {}",
                language,
                args.database.bold(),
                args.project.display()
            );
            if !scaffolder.generate_context(&args.database, &args.project, args.namespace.as_deref(), safe_mode) {
                bail!("context generation for {} failed (see log)", args.database);
            }
            Ok(())
        }
        Commands::Inspect { database, json } => {
            let tables = Scaffolder::new(factory).inspect(&database)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tables)?);
            } else {
                print_schema(&database, &tables);
            }
            Ok(())
        }
    }
}

fn print_schema(database: &str, tables: &[TableDescriptor]) {
    println!("\n📊 Schema of {} ({} tables)\n", database.bold(), tables.len());
    for table in tables {
        println!("{}.{}", table.schema, table.name.bold());
        for column in &table.columns {
            let mut notes = Vec::new();
            if column.is_primary_key {
                notes.push("pk".to_string());
            }
            if column.is_identity {
                notes.push("identity".to_string());
            }
            if let (Some(t), Some(c)) = (&column.foreign_key_table, &column.foreign_key_column) {
                notes.push(format!("→ {t}.{c}"));
            }
            println!(
                "  {} {}{}{}",
                column.name,
                column.declared_type().cyan(),
                if column.is_nullable { " null" } else { "" },
                if notes.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", notes.join(", ")).dimmed().to_string()
                }
            );
        }
        println!();
    }
}
