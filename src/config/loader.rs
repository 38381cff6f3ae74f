//! 設定ファイルの読み込み関数

use std::path::Path;

use super::{
    ConfigError,
    SyncSettings,
};

/// CLI が既定で探す設定ファイル名
pub const DEFAULT_CONFIG_FILE: &str = "locale-sync.json";

/// 設定ファイルを読み込む
///
/// 相対パスはカレントディレクトリ基準で解決される。
/// 読み込み後の検証は [`SyncSettings::sync_options`] で行う。
///
/// # Errors
/// - 設定ファイルが存在しない
/// - ファイル読み込みエラー
/// - JSON パースエラー
pub fn load_from_file(config_path: &Path) -> Result<SyncSettings, ConfigError> {
    if !config_path.exists() {
        tracing::debug!("Configuration file not found: {:?}", config_path);
        return Err(ConfigError::NotFound(config_path.to_path_buf()));
    }

    tracing::debug!("Loading configuration from: {:?}", config_path);

    let content = std::fs::read_to_string(config_path)?;
    let settings: SyncSettings = serde_json::from_str(&content)?;

    Ok(settings)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::config::PersistenceConfig;

    /// `load_from_file`: 設定ファイルが存在する場合
    #[rstest]
    fn test_load_from_file_with_valid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
        let config_content = r#"{
            "type": "file_system",
            "target_locales": ["en", "fr"],
            "source_locale": "en",
            "source_path": "en.json",
            "locales_path": "locales"
        }"#;
        fs::write(&config_path, config_content).unwrap();

        let settings = load_from_file(&config_path).unwrap();

        assert_that!(settings.source_locale, eq("en"));
        assert!(matches!(settings.persistence, PersistenceConfig::FileSystem { .. }));
    }

    /// `load_from_file`: 設定ファイルが存在しない場合
    #[rstest]
    fn test_load_from_file_missing() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(DEFAULT_CONFIG_FILE);

        let result = load_from_file(&config_path);

        assert!(matches!(result, Err(ConfigError::NotFound(path)) if path == config_path));
    }

    /// `load_from_file`: JSON パースエラー
    #[rstest]
    fn test_load_from_file_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&config_path, "{ invalid json }").unwrap();

        let result = load_from_file(&config_path);

        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    /// `load_from_file`: 必須フィールドの欠落
    #[rstest]
    fn test_load_from_file_missing_type() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&config_path, r#"{"target_locales": ["en"], "source_locale": "en"}"#).unwrap();

        let result = load_from_file(&config_path);

        assert_that!(result, err(displays_as(starts_with("Failed to parse configuration"))));
    }
}
