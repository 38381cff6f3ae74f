//! Project scaffolding for `locale-sync init`.

use std::fs::OpenOptions;
use std::io::{
    ErrorKind,
    Write,
};
use std::path::{
    Path,
    PathBuf,
};

use serde_json::json;
use thiserror::Error;

use crate::config::{
    DEFAULT_CONFIG_FILE,
    PersistenceConfig,
    ProviderSettings,
    SyncSettings,
};

/// Directory holding the generated locale files.
const LOCALES_DIR: &str = "locales";
/// Source document created next to the config.
const SOURCE_FILE: &str = "en.json";

/// Why scaffolding failed.
#[derive(Error, Debug)]
pub enum InitError {
    /// ディレクトリやファイルを作成できない
    #[error("Failed to create '{path}': {source}")]
    Io {
        /// 作成しようとしたパス
        path: PathBuf,
        /// 元のエラー
        #[source]
        source: std::io::Error,
    },

    /// JSON を生成できない
    #[error("Failed to render '{0}'")]
    Render(#[from] serde_json::Error),
}

/// Starter config: English source translated into Canadian French.
fn starter_settings() -> SyncSettings {
    SyncSettings {
        target_locales: vec!["en".to_string(), "fr-CA".to_string()],
        source_locale: "en".to_string(),
        persistence: PersistenceConfig::FileSystem {
            source_path: PathBuf::from(SOURCE_FILE),
            locales_path: PathBuf::from(LOCALES_DIR),
            excluded_files: Vec::new(),
        },
        provider: ProviderSettings::default(),
    }
}

/// Write `content` to `path` unless the file already exists.
///
/// Returns whether the file was created.
fn create_file(path: &Path, content: &str) -> Result<bool, InitError> {
    let io_error = |source| InitError::Io { path: path.to_path_buf(), source };

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            tracing::info!("{} already exists, leaving it untouched", path.display());
            return Ok(false);
        }
        Err(e) => return Err(io_error(e)),
    };
    file.write_all(content.as_bytes()).map_err(io_error)?;
    Ok(true)
}

/// Create the locales directory, a config file and a source document in `dir`.
///
/// Existing files are never overwritten. Returns the paths that were created.
///
/// # Errors
/// - ディレクトリやファイルの作成に失敗
pub fn scaffold(dir: &Path) -> Result<Vec<PathBuf>, InitError> {
    let mut created = Vec::new();

    let locales = dir.join(LOCALES_DIR);
    if !locales.is_dir() {
        std::fs::create_dir_all(&locales)
            .map_err(|source| InitError::Io { path: locales.clone(), source })?;
        created.push(locales);
    }

    let mut config = serde_json::to_string_pretty(&starter_settings())?;
    config.push('\n');
    let config_path = dir.join(DEFAULT_CONFIG_FILE);
    if create_file(&config_path, &config)? {
        created.push(config_path);
    }

    let mut source = serde_json::to_string_pretty(&json!({ "greeting": "Hello, World!" }))?;
    source.push('\n');
    let source_path = dir.join(SOURCE_FILE);
    if create_file(&source_path, &source)? {
        created.push(source_path);
    }

    for path in &created {
        tracing::info!("Created {}", path.display());
    }
    Ok(created)
}
