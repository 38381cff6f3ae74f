use std::collections::HashSet;
use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::locale::{
    LocaleError,
    LocaleTag,
};
use crate::planner::ModelLimits;

/// One problem found while validating the config.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "target_locales[0]")
    pub field_path: String,
    /// 何が問題か
    pub message: String,
}

impl ValidationError {
    /// Error for the field at `field_path`.
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

/// 設定の読み込み・検証エラー
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 検証で見つかったすべての問題
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    /// 設定ファイルが存在しない
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// 設定ファイルを読めない
    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// 設定ファイルが JSON として不正
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// ロケールタグが不正
    #[error(transparent)]
    Locale(#[from] LocaleError),

    /// ソースドキュメントにキーがない
    #[error("Source document is empty. Add at least one key before generating")]
    EmptySource,
}

/// 番号付きで 1 行ずつ並べる
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Contents of the `locale-sync.json` config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncSettings {
    /// Locales that must exist in the output. May include the source locale.
    pub target_locales: Vec<String>,
    /// Locale of the source document.
    pub source_locale: String,

    /// `type` と保存先のフィールド (トップレベルに展開される)
    #[serde(flatten)]
    pub persistence: PersistenceConfig,

    /// Translation backend settings. Defaults to OpenAI.
    #[serde(default)]
    pub provider: ProviderSettings,
}

/// Where the source document and the previous output live.
///
/// Exactly one mode is active per run, selected by the `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PersistenceConfig {
    /// One `<locale>.json` file per locale inside `locales_path`.
    FileSystem {
        /// ソースドキュメントのパス
        source_path: PathBuf,
        /// ロケールファイルを置くディレクトリ
        locales_path: PathBuf,
        /// File names (or glob patterns) in `locales_path` that are not locale files.
        #[serde(default)]
        excluded_files: Vec<String>,
    },
    /// JSON strings passed in directly; the output is returned as a string.
    InMemory {
        /// ソースドキュメントの JSON
        source: String,
        /// 前回の出力 (ロケールをキーにした JSON)。初回は省略
        #[serde(default)]
        previous_output: Option<String>,
    },
}

/// OpenAI-compatible chat completion endpoint and model limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Model name sent with every request.
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// API root, without `/chat/completions`.
    pub base_url: String,
    /// Total tokens the model accepts per call.
    pub context_window: u64,
    /// Completion tokens the model can produce per call.
    pub max_output_tokens: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            context_window: 128_000,
            max_output_tokens: 16_384,
        }
    }
}

impl ProviderSettings {
    /// Limits used for batch planning.
    #[must_use]
    pub const fn limits(&self) -> ModelLimits {
        ModelLimits {
            context_window: self.context_window,
            max_output_tokens: self.max_output_tokens,
        }
    }

    /// `provider.*` の問題を `errors` に追加する
    fn validate_into(&self, errors: &mut Vec<ValidationError>) {
        for (field, value) in [
            ("provider.model", &self.model),
            ("provider.api_key_env", &self.api_key_env),
            ("provider.base_url", &self.base_url),
        ] {
            if value.is_empty() {
                errors.push(ValidationError::new(field, "The value cannot be empty"));
            }
        }

        if self.context_window == 0 {
            errors.push(ValidationError::new(
                "provider.context_window",
                "The context window must be greater than zero",
            ));
        }

        if self.max_output_tokens == 0 {
            errors.push(ValidationError::new(
                "provider.max_output_tokens",
                "The output token limit must be greater than zero",
            ));
        } else if self.max_output_tokens > self.context_window {
            errors.push(ValidationError::new(
                "provider.max_output_tokens",
                format!(
                    "The output token limit ({}) cannot exceed the context window ({})",
                    self.max_output_tokens, self.context_window
                ),
            ));
        }
    }
}

/// Validated locale settings handed to the sync engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// ソースロケール
    pub source_locale: LocaleTag,
    /// 出力に含めるロケール (ソースロケールを含むことがある)
    pub target_locales: Vec<LocaleTag>,
}

impl SyncSettings {
    /// # Errors
    /// - No target locale
    /// - Unknown or duplicated locale tag
    /// - Empty persistence path or source
    /// - Invalid exclusion glob
    /// - Invalid provider limits
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.target_locales.is_empty() {
            errors.push(ValidationError::new(
                "target_locales",
                "At least one locale is required. Example: [\"en\", \"fr-CA\"]",
            ));
        }

        let mut seen = HashSet::new();
        for (index, tag) in self.target_locales.iter().enumerate() {
            if let Err(e) = LocaleTag::parse(tag) {
                errors.push(ValidationError::new(format!("target_locales[{index}]"), e.to_string()));
            } else if !seen.insert(tag.as_str()) {
                errors.push(ValidationError::new(
                    format!("target_locales[{index}]"),
                    format!("Duplicate locale '{tag}'"),
                ));
            }
        }

        if let Err(e) = LocaleTag::parse(&self.source_locale) {
            errors.push(ValidationError::new("source_locale", e.to_string()));
        }

        match &self.persistence {
            PersistenceConfig::FileSystem { source_path, locales_path, excluded_files } => {
                if source_path.as_os_str().is_empty() {
                    errors.push(ValidationError::new(
                        "source_path",
                        "The path cannot be empty. Example: \"en.json\"",
                    ));
                }
                if locales_path.as_os_str().is_empty() {
                    errors.push(ValidationError::new(
                        "locales_path",
                        "The path cannot be empty. Example: \"locales\"",
                    ));
                }
                for (index, pattern) in excluded_files.iter().enumerate() {
                    if let Err(e) = globset::Glob::new(pattern) {
                        errors.push(ValidationError::new(
                            format!("excluded_files[{index}]"),
                            format!("Invalid glob pattern '{pattern}': {e}"),
                        ));
                    }
                }
            }
            PersistenceConfig::InMemory { source, .. } => {
                if source.trim().is_empty() {
                    errors.push(ValidationError::new("source", "Must supply value for source"));
                }
            }
        }

        self.provider.validate_into(&mut errors);

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Validate and convert the locale settings into typed tags.
    ///
    /// # Errors
    /// Returns every validation problem at once.
    pub fn sync_options(&self) -> Result<SyncOptions, ConfigError> {
        self.validate().map_err(ConfigError::ValidationErrors)?;

        let target_locales = self
            .target_locales
            .iter()
            .map(|tag| LocaleTag::parse(tag))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SyncOptions { source_locale: LocaleTag::parse(&self.source_locale)?, target_locales })
    }
}
