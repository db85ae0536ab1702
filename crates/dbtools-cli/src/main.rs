//! dbtools CLI - list, count and copy table data between databases.

use clap::{Args, Parser, Subcommand};
use dbtools::config::{parse_table_name_mappings, parse_table_name_patterns};
use dbtools::{
    drivers, ChangelogModelReader, Config, ConnectionConfig, CopyConfig, CopyOptions, DataCopier,
    DbToolsError, TableNameFilter,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "dbtools")]
#[command(about = "List, count and copy table data between relational databases")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the source tables matching the table name patterns
    List {
        /// Read tables from a YAML changelog instead of a database
        #[arg(long)]
        changelog: Option<PathBuf>,

        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        tables: TableArgs,
    },

    /// Copy the rows of the matching source tables into the target
    Copy {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        tables: TableArgs,

        /// Comma-separated SOURCE=TARGET table name mappings
        #[arg(long)]
        table_name_mappings: Option<String>,

        /// Keep existing target rows instead of deleting them before copying
        #[arg(long)]
        keep_target_rows: bool,
    },

    /// Count the rows of the matching source tables
    Count {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        tables: TableArgs,
    },
}

#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// Source driver: sqlite or postgres
    #[arg(long)]
    source_driver: Option<String>,

    /// Source connection URL
    #[arg(long)]
    source_url: Option<String>,

    /// Source user
    #[arg(long)]
    source_user: Option<String>,

    /// Source password
    #[arg(long)]
    source_password: Option<String>,

    /// Source schema (owner) to read tables from
    #[arg(long)]
    source_schema: Option<String>,
}

#[derive(Args, Debug, Default)]
struct TargetArgs {
    /// Target driver: sqlite or postgres
    #[arg(long)]
    target_driver: Option<String>,

    /// Target connection URL
    #[arg(long)]
    target_url: Option<String>,

    /// Target user
    #[arg(long)]
    target_user: Option<String>,

    /// Target password
    #[arg(long)]
    target_password: Option<String>,
}

#[derive(Args, Debug, Default)]
struct TableArgs {
    /// Comma-separated table name patterns ('*' matches every table)
    #[arg(long)]
    table_name_pattern: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), DbToolsError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(DbToolsError::Config)?;

    match cli.command {
        Commands::List {
            changelog: Some(changelog),
            tables,
            ..
        } => {
            let patterns = match &tables.table_name_pattern {
                Some(value) => parse_table_name_patterns(value),
                None => vec!["*".to_string()],
            };
            let filter = TableNameFilter::new(&patterns);
            let mut scheme = ChangelogModelReader::new(changelog).read()?;
            scheme.tables.retain(|table| filter.is_included(&table.name));

            let names = DataCopier::new().list_scheme(&scheme);
            print_names(&names, cli.output_json)?;
        }

        Commands::List {
            changelog: None,
            source,
            tables,
        } => {
            let config = resolve_config(cli.config.as_deref(), &source, None, &tables, None, false)?;
            let mut connection = drivers::connect(&config.source).await?;

            let names = DataCopier::new()
                .list(
                    connection.as_mut(),
                    &TableNameFilter::new(&config.copy.table_name_patterns),
                    config.copy.source_schema.as_deref(),
                )
                .await?;
            print_names(&names, cli.output_json)?;
        }

        Commands::Count { source, tables } => {
            let config = resolve_config(cli.config.as_deref(), &source, None, &tables, None, false)?;
            let mut connection = drivers::connect(&config.source).await?;

            let counts = DataCopier::new()
                .count(
                    connection.as_mut(),
                    &TableNameFilter::new(&config.copy.table_name_patterns),
                    config.copy.source_schema.as_deref(),
                )
                .await?;

            if cli.output_json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&counts).map_err(std::io::Error::from)?
                );
            } else {
                let width = counts.iter().map(|c| c.table.len()).max().unwrap_or(0);
                for count in &counts {
                    println!("{:<width$}  {}", count.table, count.rows, width = width);
                }
            }
        }

        Commands::Copy {
            source,
            target,
            tables,
            table_name_mappings,
            keep_target_rows,
        } => {
            let config = resolve_config(
                cli.config.as_deref(),
                &source,
                Some(&target),
                &tables,
                table_name_mappings.as_deref(),
                keep_target_rows,
            )?;
            let target_config = config.require_target()?;

            let mut source_connection = drivers::connect(&config.source).await?;
            let mut target_connection = drivers::connect(target_config).await?;

            let summary = DataCopier::new()
                .copy(
                    source_connection.as_mut(),
                    target_connection.as_mut(),
                    &CopyOptions::from(&config.copy),
                )
                .await?;

            if cli.output_json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&summary).map_err(std::io::Error::from)?
                );
            } else {
                println!("\nCopy completed!");
                println!("  Tables: {}", summary.tables);
                println!("  Rows: {}", summary.rows);
            }
        }
    }

    Ok(())
}

fn print_names(names: &[String], output_json: bool) -> Result<(), DbToolsError> {
    if output_json {
        println!(
            "{}",
            serde_json::to_string_pretty(names).map_err(std::io::Error::from)?
        );
    } else {
        for name in names {
            println!("{}", name);
        }
    }
    Ok(())
}

/// Merge the configuration file (if any) with command line flags.
///
/// Flags override file values. Table name mappings are parsed here, so a
/// malformed mapping fails before any connection is opened.
fn resolve_config(
    path: Option<&Path>,
    source: &SourceArgs,
    target: Option<&TargetArgs>,
    tables: &TableArgs,
    table_name_mappings: Option<&str>,
    keep_target_rows: bool,
) -> Result<Config, DbToolsError> {
    let base = match path {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            Some(config)
        }
        None => None,
    };
    let (base_source, base_target, mut copy) = match base {
        Some(config) => (Some(config.source), config.target, config.copy),
        None => (None, None, CopyConfig::default()),
    };

    let source_connection = merge_connection(
        "source",
        base_source,
        &source.source_driver,
        &source.source_url,
        &source.source_user,
        &source.source_password,
    )?
    .ok_or_else(|| {
        DbToolsError::Config(
            "no source connection: use --config or --source-driver and --source-url".into(),
        )
    })?;

    let target_connection = match target {
        Some(args) => merge_connection(
            "target",
            base_target,
            &args.target_driver,
            &args.target_url,
            &args.target_user,
            &args.target_password,
        )?,
        None => base_target,
    };

    if let Some(schema) = &source.source_schema {
        copy.source_schema = Some(schema.clone());
    }
    if let Some(value) = &tables.table_name_pattern {
        copy.table_name_patterns = parse_table_name_patterns(value);
    }
    if let Some(value) = table_name_mappings {
        copy.table_name_mappings = parse_table_name_mappings(value)?;
    }
    if keep_target_rows {
        copy.delete_before_copy = false;
    }

    let config = Config {
        source: source_connection,
        target: target_connection,
        copy,
    };
    config.validate()?;
    Ok(config)
}

fn merge_connection(
    section: &str,
    base: Option<ConnectionConfig>,
    driver: &Option<String>,
    url: &Option<String>,
    user: &Option<String>,
    password: &Option<String>,
) -> Result<Option<ConnectionConfig>, DbToolsError> {
    let mut connection = match (base, driver, url) {
        (Some(connection), _, _) => connection,
        (None, Some(driver), Some(url)) => ConnectionConfig {
            driver: driver.clone(),
            url: url.clone(),
            user: None,
            password: None,
        },
        (None, None, None) if user.is_none() && password.is_none() => return Ok(None),
        (None, _, _) => {
            return Err(DbToolsError::Config(format!(
                "--{section}-driver and --{section}-url are both required without a {section} section in --config",
                section = section
            )))
        }
    };

    if let Some(driver) = driver {
        connection.driver = driver.clone();
    }
    if let Some(url) = url {
        connection.url = url.clone();
    }
    if user.is_some() {
        connection.user = user.clone();
    }
    if password.is_some() {
        connection.password = password.clone();
    }
    Ok(Some(connection))
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity '{}'", other)),
    };

    // Logs go to stderr; stdout carries command output.
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}'", other)),
    }

    Ok(())
}
