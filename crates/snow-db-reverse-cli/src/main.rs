//! snow-db-reverse CLI - Snowflake database to SnowSQL DDL scripts.

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use snow_db_reverse::{Config, ExtractionConfig, ExtractionResult, Extractor, ReverseError};
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

#[derive(Parser)]
#[command(name = "snow-db-reverse")]
#[command(about = "Database reverse engineering to generate all DDL scripts as SnowSQL scripts")]
#[command(version)]
struct Cli {
    /// Optional YAML configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder where the DDL scripts are stored (emptied on every run)
    #[arg(short, long)]
    folder: Option<PathBuf>,

    /// Snowflake account to connect to
    #[arg(short, long)]
    account: Option<String>,

    /// User to connect to Snowflake
    #[arg(short, long)]
    user: Option<String>,

    /// Password (prompted when omitted)
    #[arg(short, long)]
    password: Option<String>,

    /// Role
    #[arg(short, long)]
    role: Option<String>,

    /// Warehouse for the session
    #[arg(short, long)]
    warehouse: Option<String>,

    /// Database to explore
    #[arg(short, long)]
    database: Option<String>,

    /// Schemas to explore, comma separated
    #[arg(short, long)]
    schemas: Option<String>,

    /// Environment pattern in object names, e.g. _DEV
    #[arg(short, long, alias = "envPattern")]
    env_pattern: Option<String>,

    /// Replace token for the environment pattern, e.g. _&{ENV}
    #[arg(short = 't', long, alias = "envReplaceToken")]
    env_replace_token: Option<String>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), ReverseError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format, cli.log_file.as_ref())?;

    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::default(),
    };
    apply_overrides(&mut config, &cli);
    config.validate()?;

    if needs_password(&config) {
        config.source.password = Some(prompt_password()?);
    }

    info!("Started at {}", chrono::Local::now().format("%Y-%m-%d, %H:%M:%S"));

    let extractor = Extractor::new(config).await?;
    let result = extractor.run().await?;

    info!("Ended at {}", chrono::Local::now().format("%Y-%m-%d, %H:%M:%S"));

    if cli.output_json {
        println!("{}", result.to_json()?);
    } else {
        print_summary(&result);
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    let source = &mut config.source;
    if let Some(account) = &cli.account {
        source.account = account.clone();
    }
    if let Some(user) = &cli.user {
        source.user = user.clone();
    }
    if let Some(password) = &cli.password {
        source.password = Some(password.clone());
    }
    if let Some(role) = &cli.role {
        source.role = role.clone();
    }
    if let Some(warehouse) = &cli.warehouse {
        source.warehouse = Some(warehouse.clone());
    }

    let extraction = &mut config.extraction;
    if let Some(folder) = &cli.folder {
        extraction.folder = folder.clone();
    }
    if let Some(database) = &cli.database {
        extraction.database = database.clone();
    }
    if let Some(schemas) = &cli.schemas {
        extraction.schemas = ExtractionConfig::parse_schema_list(schemas);
    }
    if let Some(pattern) = &cli.env_pattern {
        extraction.env_pattern = Some(pattern.clone());
    }
    if let Some(token) = &cli.env_replace_token {
        extraction.env_replace_token = token.clone();
    }
}

/// An empty password (e.g. `-p ""`) is treated as missing.
fn needs_password(config: &Config) -> bool {
    config.source.password.as_deref().map_or(true, str::is_empty)
}

fn prompt_password() -> Result<String, ReverseError> {
    dialoguer::Password::new()
        .with_prompt("Enter password")
        .interact()
        .map_err(|e| ReverseError::Config(format!("cannot read password: {}", e)))
}

fn print_summary(result: &ExtractionResult) {
    let status_msg = if result.has_failures() {
        "Extraction completed with errors"
    } else {
        "Extraction completed!"
    };
    println!("\n{}", status_msg);
    println!("  Run ID: {}", result.run_id);
    println!("  Duration: {:.2}s", result.duration_seconds);
    println!("  Output: {}", result.output_folder.display());
    println!("  Schemas: {}", result.schemas_scanned);
    println!("  Scripts written: {}", result.artifacts_written);
    println!("  Built-ins skipped: {}", result.builtins_skipped);
    if result.empty_definitions > 0 {
        println!("  Empty definitions: {}", result.empty_definitions);
    }
    if result.has_failures() {
        println!("  Failed objects:");
        for failed in &result.failed_objects {
            let target = if failed.name.is_empty() {
                format!("{} ({})", failed.schema, failed.kind)
            } else {
                format!("{}.{} ({})", failed.schema, failed.name, failed.kind)
            };
            println!("    {}: {}", target, failed.error);
        }
    }
}

fn setup_logging(
    verbosity: &str,
    format: &str,
    log_file: Option<&PathBuf>,
) -> Result<(), ReverseError> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let (writer, ansi) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(writer);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config_file() {
        let mut config = Config::from_yaml(
            "source:\n  account: file_account\n  user: file_user\n  role: R\nextraction:\n  database: DB\n  folder: ./from_file\n",
        )
        .unwrap();
        let cli = Cli::parse_from([
            "snow-db-reverse",
            "-a",
            "cli_account",
            "-s",
            "SALES, FINANCE",
            "-e",
            "_DEV",
            "-t",
            "_&{ENV}",
        ]);

        apply_overrides(&mut config, &cli);

        assert_eq!(config.source.account, "cli_account");
        assert_eq!(config.source.user, "file_user");
        assert_eq!(config.extraction.folder, PathBuf::from("./from_file"));
        assert_eq!(config.extraction.schemas, vec!["SALES", "FINANCE"]);
        assert_eq!(config.extraction.env_pattern.as_deref(), Some("_DEV"));
        assert_eq!(config.extraction.env_replace_token, "_&{ENV}");
    }

    #[test]
    fn test_legacy_long_names_accepted() {
        let cli = Cli::parse_from([
            "snow-db-reverse",
            "--envPattern",
            "_PRD",
            "--envReplaceToken",
            "_&{ENV}",
        ]);
        assert_eq!(cli.env_pattern.as_deref(), Some("_PRD"));
        assert_eq!(cli.env_replace_token.as_deref(), Some("_&{ENV}"));
    }

    #[test]
    fn test_empty_password_is_prompted() {
        let mut config = Config::default();
        assert!(needs_password(&config));

        let cli = Cli::parse_from(["snow-db-reverse", "-p", ""]);
        apply_overrides(&mut config, &cli);
        assert!(needs_password(&config));

        let cli = Cli::parse_from(["snow-db-reverse", "-p", "secret"]);
        apply_overrides(&mut config, &cli);
        assert!(!needs_password(&config));
    }
}
