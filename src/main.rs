//! Command line entry point.

use std::io::Write;
use std::path::{
    Path,
    PathBuf,
};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{
    Parser,
    Subcommand,
};
use locale_sync::config::{
    ConfigError,
    DEFAULT_CONFIG_FILE,
    load_from_file,
};
use locale_sync::init::{
    InitError,
    scaffold,
};
use locale_sync::logging;
use locale_sync::persistence::{
    StoreError,
    StoreOutput,
    open_store,
};
use locale_sync::provider::{
    OpenAiProvider,
    ProviderError,
};
use locale_sync::{
    SyncEngine,
    SyncError,
};
use thiserror::Error;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "locale-sync", version, about = "Keep translated JSON locale files in sync")]
struct Cli {
    /// Log level or filter directive (`RUST_LOG` takes precedence)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Translate new and changed keys into every target locale
    Sync {
        /// Path to the config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },

    /// Create a starter config, source document and locales directory
    Init {
        /// Directory to scaffold into
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
}

/// Errors surfaced by a subcommand
#[derive(Error, Debug)]
enum CliError {
    /// 設定の読み込み・検証
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// ストアの作成
    #[error(transparent)]
    Store(#[from] StoreError),

    /// プロバイダーの作成
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// 同期処理
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// `init`
    #[error(transparent)]
    Init(#[from] InitError),

    /// stdout への書き込み
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Load the config, run one synchronization and print in-memory output to stdout.
async fn run_sync(config_path: &Path) -> Result<(), CliError> {
    let settings = load_from_file(config_path)?;
    let options = settings.sync_options()?;
    let store = open_store(&settings.persistence)?;
    let provider = Arc::new(OpenAiProvider::from_settings(&settings.provider)?);

    let report = SyncEngine::new(store, provider, options).run().await?;
    tracing::debug!(
        added = report.added.len(),
        removed = report.removed.len(),
        changes = report.changes,
        provider_calls = report.provider_calls,
        "Sync report"
    );

    if let StoreOutput::Json(json) = report.output {
        writeln!(std::io::stdout(), "{json}")?;
    }
    Ok(())
}

/// Parse the arguments, set up logging and run the subcommand.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ファイル出力を flush するため main の終わりまで保持する
    let _guard = match logging::init(&cli.log_level, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            let _ = writeln!(std::io::stderr(), "{e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Sync { config } => run_sync(&config).await,
        Command::Init { dir } => scaffold(&dir).map(|_| ()).map_err(CliError::from),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
