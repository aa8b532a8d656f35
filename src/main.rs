use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rhc_features::config::{self, Config};
use rhc_features::render::{render_features, render_report};
use rhc_features::system::CommandHost;
use rhc_features::{prefs, Catalog, FeatureError, ReconcileReport, Session};

/// Exit code for invalid feature selections (EX_DATAERR).
const EXIT_DATA_ERR: u8 = 65;

#[derive(Parser)]
#[command(name = "rhc-features")]
#[command(about = "Manage optional features of a connected host")]
struct Cli {
    /// Legacy TOML configuration file
    #[arg(long, global = true, env = "RHC_FEATURES_CONFIG", default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Feature preference file used while the host is not registered
    #[arg(long, global = true, env = "RHC_FEATURES_PREFS", default_value = prefs::DEFAULT_PREFERENCES_PATH)]
    prefs_file: PathBuf,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Append logs to a file (defaults to the user state directory)
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show features and their current state
    Show,
    /// Enable features, along with the features they require
    Enable {
        #[arg(required = true, value_name = "FEATURE")]
        features: Vec<String>,
    },
    /// Disable features, along with the features that depend on them
    Disable {
        #[arg(required = true, value_name = "FEATURE")]
        features: Vec<String>,
    },
    /// Reconcile all features from stored preferences and explicit overrides
    Apply {
        /// Feature to enable (repeatable)
        #[arg(long = "enable-feature", value_name = "FEATURE")]
        enable: Vec<String>,
        /// Feature to disable (repeatable)
        #[arg(long = "disable-feature", value_name = "FEATURE")]
        disable: Vec<String>,
    },
    /// Forget stored feature preferences
    Reset,
}

fn default_log_file() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "rhc")?;
    Some(dirs.state_dir()?.join("rhc-features.log"))
}

/// Initialize tracing on stderr, plus an optional log file.
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: Option<&str>, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .ok()
            .or_else(|| log_level.map(|level| format!("rhc_features={level}")))
            .unwrap_or_else(|| "rhc_features=info".into()),
    );

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("cannot create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

fn print_report(report: &ReconcileReport, format: Format) -> anyhow::Result<()> {
    match format {
        Format::Text => print!("{}", render_report(report)),
        Format::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let catalog = Catalog::standard()?;
    let config = Config::load(&cli.config, &catalog.ids())?;

    let log_file = match cli.log_file {
        Some(Some(path)) => Some(path),
        Some(None) => default_log_file(),
        None => None,
    };
    init_tracing(config.log_level.as_deref(), log_file.as_deref())?;
    config.warn_unknown_feature_keys(&cli.config);

    let host = CommandHost::new(&config.cert_file);
    let mut session = Session::open(&config, &cli.prefs_file, &host)?;

    let report = match cli.command {
        Commands::Show => {
            let listing = session.listing();
            match cli.format {
                Format::Text => print!("{}", render_features(&listing)),
                Format::Json => println!("{}", serde_json::to_string_pretty(&listing)?),
            }
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Reset => {
            session.reset()?;
            tracing::info!("feature preferences removed from {}", cli.prefs_file.display());
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Enable { features } => session.enable(&features)?,
        Commands::Disable { features } => session.disable(&features)?,
        Commands::Apply { enable, disable } => session.apply(&enable, &disable)?,
    };

    print_report(&report, cli.format)?;
    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            match err.downcast_ref::<FeatureError>() {
                Some(feature_err) if feature_err.is_selection_error() => ExitCode::from(EXIT_DATA_ERR),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
