//! ログ出力の初期化
//!
//! コンソール (stderr) には常に出力し、ファイルが指定された場合はそちらにも書き込む。
//! `RUST_LOG` が設定されていればレベル指定より優先される。

use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{
    SubscriberInitExt,
    TryInitError,
};
use tracing_subscriber::{
    EnvFilter,
    Layer,
    fmt,
};

/// ログ初期化のエラー
#[derive(Error, Debug)]
pub enum LoggingError {
    /// フィルタ指定として解釈できない
    #[error("Invalid log level '{level}': {source}")]
    InvalidLevel {
        /// 指定されたレベル
        level: String,
        /// パースエラー
        #[source]
        source: ParseError,
    },

    /// ファイル名を持たないパス
    #[error("Log file path must name a file: {0}")]
    InvalidLogFile(PathBuf),

    /// グローバルなサブスクライバーが設定済み
    #[error("Failed to install the log subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// `RUST_LOG` を優先し、なければ `level` からフィルタを作る
///
/// # Errors
/// - `level` がフィルタ指定として不正
pub fn filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .map_err(|source| LoggingError::InvalidLevel { level: level.to_string(), source })
}

/// グローバルなサブスクライバーを登録する
///
/// 戻り値の `WorkerGuard` はプロセス終了まで保持すること (drop 時にファイルへ flush される)。
///
/// # Errors
/// - ログレベルが不正
/// - ログファイルのパスが不正
/// - サブスクライバーが既に登録済み
pub fn init(level: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>, LoggingError> {
    let console_layer =
        fmt::layer().with_target(false).with_writer(std::io::stderr).with_filter(filter(level)?);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| LoggingError::InvalidLogFile(path.to_path_buf()))?;
            let directory =
                path.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or(Path::new("."));

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer)
                .with_filter(filter(level)?);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(console_layer).with(file_layer).try_init()?;

    Ok(guard)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("info")]
    #[case("debug")]
    #[case("locale_sync=trace,warn")]
    fn filter_accepts_directives(#[case] level: &str) {
        assert_that!(filter(level), ok(anything()));
    }

    #[rstest]
    fn init_rejects_directory_only_log_file() {
        let result = init("info", Some(Path::new("/")));

        assert!(matches!(result, Err(LoggingError::InvalidLogFile(_))));
    }
}
