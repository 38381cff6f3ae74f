//! Locale document definitions

use std::collections::BTreeMap;

use serde_json::{
    Map,
    Value,
};
use thiserror::Error;

/// A locale document: the root object of a translation file.
pub type Document = Map<String, Value>;

/// Persisted output keyed by locale tag (file stem for file-system stores).
pub type LocaleDocuments = BTreeMap<String, Document>;

/// Key path from the document root to a node (e.g. `["common", "hello"]`).
pub type KeyPath = Vec<String>;

/// JSON text that is not a locale document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// JSON として不正
    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// ルートがオブジェクトでない
    #[error("Expected a JSON object, found {found}")]
    NotAnObject {
        /// 実際の型
        found: &'static str,
    },

    /// 複数ロケールの JSON で、ロケールの値がオブジェクトでない
    #[error("Expected locale '{locale}' to hold a JSON object, found {found}")]
    LocaleNotAnObject {
        /// ロケール名
        locale: String,
        /// 実際の型
        found: &'static str,
    },
}

/// Parse JSON text that must hold an object at its root.
///
/// # Errors
/// - JSON パースエラー
/// - ルートがオブジェクトではない
pub fn parse_document(text: &str) -> Result<Document, DocumentError> {
    match serde_json::from_str(text)? {
        Value::Object(map) => Ok(map),
        other => Err(DocumentError::NotAnObject { found: value_kind(&other) }),
    }
}

/// Parse a serialized multi-locale output (`{"en": {...}, "fr": {...}}`).
///
/// # Errors
/// - JSON パースエラー
/// - ルートまたは各ロケールの値がオブジェクトではない
pub fn parse_locale_documents(text: &str) -> Result<LocaleDocuments, DocumentError> {
    parse_document(text)?
        .into_iter()
        .map(|(locale, value)| match value {
            Value::Object(map) => Ok((locale, map)),
            other => Err(DocumentError::LocaleNotAnObject { locale, found: value_kind(&other) }),
        })
        .collect()
}

/// Human readable JSON type name used in error messages.
#[must_use]
pub const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Dot-joined path for messages (`common.hello`, `<root>` for the empty path).
#[must_use]
pub fn format_path(path: &[String]) -> String {
    if path.is_empty() { "<root>".to_string() } else { path.join(".") }
}
