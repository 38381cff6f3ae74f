//! Persistence of the source document and the multi-locale output.

/// One JSON file per locale in a directory
mod file_system;
/// JSON strings held in memory
mod in_memory;

use std::path::PathBuf;

use thiserror::Error;

use crate::config::PersistenceConfig;
use crate::document::{
    Document,
    DocumentError,
    LocaleDocuments,
};

pub use file_system::FileSystemStore;
pub use in_memory::InMemoryStore;

/// ストアの読み書きエラー
#[derive(Error, Debug)]
pub enum StoreError {
    /// ファイルシステムの操作に失敗
    #[error("Failed to access '{path}': {source}")]
    Io {
        /// 操作対象のパス
        path: PathBuf,
        /// 元のエラー
        #[source]
        source: std::io::Error,
    },

    /// ソースまたはロケールファイルがロケールドキュメントでない
    #[error("Invalid locale document '{name}': {source}")]
    Document {
        /// ロケール名またはソースのパス
        name: String,
        /// 元のエラー
        #[source]
        source: DocumentError,
    },

    /// ソースファイルが空
    #[error("Source file '{0}' is empty")]
    EmptySource(PathBuf),

    /// 除外パターンが glob として不正
    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidExclude {
        /// 不正なパターン
        pattern: String,
        /// 元のエラー
        #[source]
        source: globset::Error,
    },

    /// 出力を JSON にできない
    #[error("Failed to serialize locale output: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What a store produced when the output was persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutput {
    /// Paths of the written locale files.
    Files(Vec<PathBuf>),
    /// Serialized multi-locale JSON.
    Json(String),
}

/// Source of the current document and sink for the synchronized output.
pub trait LocaleStore: Send {
    /// # Errors
    /// Returns an error when the source cannot be read or is not a JSON object.
    fn source_document(&self) -> Result<Document, StoreError>;

    /// Output of the previous run, or `None` on the first run.
    ///
    /// # Errors
    /// Returns an error when a persisted locale cannot be read or parsed.
    fn previous_locales(&self) -> Result<Option<LocaleDocuments>, StoreError>;

    /// Drop `locale` from `output` and from the persisted state.
    ///
    /// # Errors
    /// Returns an error when the persisted locale cannot be removed.
    fn remove_locale(
        &mut self,
        locale: &str,
        output: &mut LocaleDocuments,
    ) -> Result<(), StoreError>;

    /// Persist the complete output of this run.
    ///
    /// The `source_locale` entry is committed after every other locale, so an interrupted
    /// commit leaves the previous baseline in place and the next run re-sends the changes.
    ///
    /// # Errors
    /// Returns an error when the output cannot be serialized or written.
    fn output_locales(
        &mut self,
        output: &LocaleDocuments,
        source_locale: &str,
    ) -> Result<StoreOutput, StoreError>;
}

/// Build the store selected by the config.
///
/// # Errors
/// - 除外パターンが不正
pub fn open_store(config: &PersistenceConfig) -> Result<Box<dyn LocaleStore>, StoreError> {
    let store: Box<dyn LocaleStore> = match config {
        PersistenceConfig::FileSystem { source_path, locales_path, excluded_files } => Box::new(
            FileSystemStore::new(source_path.clone(), locales_path.clone(), excluded_files)?,
        ),
        PersistenceConfig::InMemory { source, previous_output } => {
            Box::new(InMemoryStore::new(source.clone(), previous_output.clone()))
        }
    };
    Ok(store)
}

/// File name of a locale inside the locales directory.
fn locale_file_name(locale: &str) -> String {
    format!("{locale}.json")
}

/// Pretty JSON with a trailing newline.
fn render_document(document: &Document) -> Result<String, StoreError> {
    let mut text = serde_json::to_string_pretty(document)?;
    text.push('\n');
    Ok(text)
}
