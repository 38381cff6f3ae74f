//! Structural schema derivation and validation of provider output.
//!
//! A schema is derived from the document sent for translation and broadcast to every requested
//! locale. Provider responses must reproduce that shape exactly.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::document::{
    Document,
    KeyPath,
    format_path,
    value_kind,
};
use crate::locale::LocaleTag;

/// Invalid locale content, in the source or in a provider response.
///
/// `path` fields are dot-joined key paths.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// ドキュメントにキーがない
    #[error("Cannot create schema from empty object")]
    EmptyDocument,

    /// 空のオブジェクト
    #[error("Value at '{path}' is an object, but has no keys. Objects must not be empty")]
    EmptyObject {
        /// 空オブジェクトの位置
        path: String,
    },

    /// 文字列でもオブジェクトでもない値
    #[error("Value at '{path}' is type {kind}. All values should be string or object")]
    InvalidValue {
        /// 値の位置
        path: String,
        /// 実際の型
        kind: &'static str,
    },

    /// 応答が JSON として読めない
    #[error("Translation response is not valid JSON: {0}")]
    MalformedResponse(String),

    /// 応答のトップレベルがオブジェクトでない
    #[error("Translation response must be a JSON object keyed by locale, found {0}")]
    ResponseNotAnObject(&'static str),

    /// 要求したロケールが応答にない
    #[error("Translation response is missing locale '{0}'")]
    MissingLocale(LocaleTag),

    /// 要求していないロケールが応答にある
    #[error("Translation response contains unexpected locale '{0}'")]
    UnexpectedLocale(String),

    /// スキーマにあるキーが応答にない
    #[error("[{locale}] missing key '{path}'")]
    MissingKey {
        /// 応答のロケール
        locale: LocaleTag,
        /// 欠けているキー
        path: String,
    },

    /// スキーマにないキーが応答にある
    #[error("[{locale}] unexpected key '{path}'")]
    UnexpectedKey {
        /// 応答のロケール
        locale: LocaleTag,
        /// 余分なキー
        path: String,
    },

    /// 文字列とオブジェクトの取り違え
    #[error("[{locale}] expected {expected} at '{path}', found {found}")]
    TypeMismatch {
        /// 応答のロケール
        locale: LocaleTag,
        /// 値の位置
        path: String,
        /// スキーマ上の型
        expected: &'static str,
        /// 実際の型
        found: &'static str,
    },
}

/// Shape of a locale document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schema {
    /// 文字列の葉
    String,
    /// キーごとの子スキーマ
    Object(BTreeMap<String, Schema>),
}

impl Schema {
    /// エラーメッセージ用の型名
    const fn kind(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Object(_) => "object",
        }
    }
}

/// Derive the structural schema of `document`.
///
/// Fails on the first empty object or non-string, non-object leaf found during the walk.
///
/// # Errors
/// - The document is empty
/// - An object node is empty
/// - A leaf is an array, number, boolean or null
pub fn derive_schema(document: &Document) -> Result<Schema, SchemaError> {
    if document.is_empty() {
        return Err(SchemaError::EmptyDocument);
    }
    let mut path = Vec::new();
    derive_object(document, &mut path)
}

/// `object` の各キーを再帰的に調べる。`path` は現在位置
fn derive_object(object: &Document, path: &mut KeyPath) -> Result<Schema, SchemaError> {
    let mut shape = BTreeMap::new();
    for (key, value) in object {
        path.push(key.clone());
        let schema = match value {
            Value::String(_) => Schema::String,
            Value::Object(nested) if nested.is_empty() => {
                return Err(SchemaError::EmptyObject { path: format_path(path) });
            }
            Value::Object(nested) => derive_object(nested, path)?,
            other => {
                return Err(SchemaError::InvalidValue {
                    path: format_path(path),
                    kind: value_kind(other),
                });
            }
        };
        path.pop();
        shape.insert(key.clone(), schema);
    }
    Ok(Schema::Object(shape))
}

/// Schema per target locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterSchema {
    /// ロケールごとの期待される形
    locales: BTreeMap<LocaleTag, Schema>,
}

impl MasterSchema {
    /// Assign `schema` to every locale in `locales`.
    #[must_use]
    pub fn broadcast(locales: &[LocaleTag], schema: &Schema) -> Self {
        Self { locales: locales.iter().map(|locale| (locale.clone(), schema.clone())).collect() }
    }

    /// Restrict to the locales of one batch.
    #[must_use]
    pub fn subset(&self, locales: &[LocaleTag]) -> Self {
        Self {
            locales: self
                .locales
                .iter()
                .filter(|(locale, _)| locales.contains(locale))
                .map(|(locale, schema)| (locale.clone(), schema.clone()))
                .collect(),
        }
    }

    /// Parse a raw provider response and check every locale against its schema.
    ///
    /// An entry for `source_locale` is dropped: the source document is always written
    /// verbatim, never taken from the provider.
    ///
    /// # Errors
    /// - The response is not JSON or not an object
    /// - A locale is missing or unexpected
    /// - A locale document does not match its schema
    pub fn validate_response(
        &self,
        raw: &str,
        source_locale: &LocaleTag,
    ) -> Result<BTreeMap<LocaleTag, Document>, SchemaError> {
        let parsed: Value =
            serde_json::from_str(raw).map_err(|e| SchemaError::MalformedResponse(e.to_string()))?;
        let mut response = match parsed {
            Value::Object(response) => response,
            other => return Err(SchemaError::ResponseNotAnObject(value_kind(&other))),
        };

        if !self.locales.contains_key(source_locale)
            && response.remove(source_locale.as_str()).is_some()
        {
            tracing::debug!(%source_locale, "Dropping source locale entry from translation response");
        }

        let mut validated = BTreeMap::new();
        for (locale, schema) in &self.locales {
            let Some(value) = response.remove(locale.as_str()) else {
                return Err(SchemaError::MissingLocale(locale.clone()));
            };
            let mut path = Vec::new();
            validate_value(schema, &value, locale, &mut path)?;
            if let Value::Object(document) = value {
                validated.insert(locale.clone(), document);
            }
        }

        if let Some(unexpected) = response.keys().next() {
            return Err(SchemaError::UnexpectedLocale(unexpected.clone()));
        }

        Ok(validated)
    }
}

/// `value` が `schema` と同じ形か検査する
fn validate_value(
    schema: &Schema,
    value: &Value,
    locale: &LocaleTag,
    path: &mut KeyPath,
) -> Result<(), SchemaError> {
    match (schema, value) {
        (Schema::String, Value::String(_)) => Ok(()),
        (Schema::Object(shape), Value::Object(object)) => {
            for (key, child) in shape {
                path.push(key.clone());
                let Some(child_value) = object.get(key) else {
                    return Err(SchemaError::MissingKey {
                        locale: locale.clone(),
                        path: format_path(path),
                    });
                };
                validate_value(child, child_value, locale, path)?;
                path.pop();
            }
            if let Some(extra) = object.keys().find(|key| !shape.contains_key(*key)) {
                path.push(extra.clone());
                return Err(SchemaError::UnexpectedKey {
                    locale: locale.clone(),
                    path: format_path(path),
                });
            }
            Ok(())
        }
        (schema, value) => Err(SchemaError::TypeMismatch {
            locale: locale.clone(),
            path: format_path(path),
            expected: schema.kind(),
            found: value_kind(value),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::{
        fixture,
        rstest,
    };
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => Document::new(),
        }
    }

    fn tag(value: &str) -> LocaleTag {
        LocaleTag::parse(value).unwrap()
    }

    #[fixture]
    fn master() -> MasterSchema {
        let schema =
            derive_schema(&doc(json!({ "greeting": "Hello", "nav": { "home": "Home" } })))
                .unwrap();
        MasterSchema::broadcast(&[tag("fr"), tag("de")], &schema)
    }

    #[rstest]
    fn derive_schema_nested() {
        let schema = derive_schema(&doc(json!({ "a": "1", "b": { "c": "2" } }))).unwrap();

        assert_eq!(
            schema,
            Schema::Object(BTreeMap::from([
                ("a".to_string(), Schema::String),
                (
                    "b".to_string(),
                    Schema::Object(BTreeMap::from([("c".to_string(), Schema::String)]))
                ),
            ]))
        );
    }

    #[rstest]
    fn derive_schema_rejects_empty_document() {
        assert_that!(derive_schema(&Document::new()), err(eq(&SchemaError::EmptyDocument)));
    }

    #[rstest]
    fn derive_schema_rejects_empty_object() {
        let result = derive_schema(&doc(json!({ "a": "1", "b": { "c": {} } })));

        assert_that!(result, err(eq(&SchemaError::EmptyObject { path: "b.c".to_string() })));
    }

    #[rstest]
    #[case(json!({ "a": 1 }), "number")]
    #[case(json!({ "a": ["x"] }), "array")]
    #[case(json!({ "a": true }), "boolean")]
    #[case(json!({ "a": null }), "null")]
    fn derive_schema_rejects_invalid_leaves(#[case] value: Value, #[case] kind: &'static str) {
        let result = derive_schema(&doc(value));

        assert_that!(result, err(eq(&SchemaError::InvalidValue { path: "a".to_string(), kind })));
    }

    #[rstest]
    fn validate_response_accepts_matching_shape(master: MasterSchema) {
        let raw = r#"{
            "fr": { "greeting": "Bonjour", "nav": { "home": "Accueil" } },
            "de": { "greeting": "Hallo", "nav": { "home": "Startseite" } }
        }"#;

        let validated = master.validate_response(raw, &tag("en")).unwrap();

        assert_that!(validated.len(), eq(2));
        assert_that!(
            validated.get(&tag("de")).and_then(|d| d.get("greeting")),
            some(eq(&json!("Hallo")))
        );
    }

    #[rstest]
    fn validate_response_drops_source_locale(master: MasterSchema) {
        let raw = r#"{
            "en": { "greeting": "Hello", "nav": { "home": "Home" } },
            "fr": { "greeting": "Bonjour", "nav": { "home": "Accueil" } },
            "de": { "greeting": "Hallo", "nav": { "home": "Startseite" } }
        }"#;

        let validated = master.validate_response(raw, &tag("en")).unwrap();

        assert_that!(validated.contains_key(&tag("en")), eq(false));
    }

    #[rstest]
    fn validate_response_rejects_missing_key(master: MasterSchema) {
        let raw = r#"{
            "fr": { "greeting": "Bonjour", "nav": {} },
            "de": { "greeting": "Hallo", "nav": { "home": "Startseite" } }
        }"#;

        let result = master.validate_response(raw, &tag("en"));

        assert_that!(
            result,
            err(eq(&SchemaError::MissingKey { locale: tag("fr"), path: "nav.home".to_string() }))
        );
    }

    #[rstest]
    fn validate_response_rejects_numeric_leaf(master: MasterSchema) {
        let raw = r#"{
            "fr": { "greeting": 42, "nav": { "home": "Accueil" } },
            "de": { "greeting": "Hallo", "nav": { "home": "Startseite" } }
        }"#;

        let result = master.validate_response(raw, &tag("en"));

        assert_that!(
            result,
            err(eq(&SchemaError::TypeMismatch {
                locale: tag("fr"),
                path: "greeting".to_string(),
                expected: "string",
                found: "number",
            }))
        );
    }

    #[rstest]
    fn validate_response_rejects_extra_key(master: MasterSchema) {
        let raw = r#"{
            "fr": { "greeting": "Bonjour", "nav": { "home": "Accueil", "x": "y" } },
            "de": { "greeting": "Hallo", "nav": { "home": "Startseite" } }
        }"#;

        let result = master.validate_response(raw, &tag("en"));

        assert_that!(
            result,
            err(eq(&SchemaError::UnexpectedKey { locale: tag("fr"), path: "nav.x".to_string() }))
        );
    }

    #[rstest]
    fn validate_response_rejects_missing_and_unexpected_locales(master: MasterSchema) {
        let missing = r#"{ "fr": { "greeting": "Bonjour", "nav": { "home": "Accueil" } } }"#;
        let unexpected = r#"{
            "fr": { "greeting": "Bonjour", "nav": { "home": "Accueil" } },
            "de": { "greeting": "Hallo", "nav": { "home": "Startseite" } },
            "it": { "greeting": "Ciao", "nav": { "home": "Home" } }
        }"#;

        assert_that!(
            master.validate_response(missing, &tag("en")),
            err(eq(&SchemaError::MissingLocale(tag("de"))))
        );
        assert_that!(
            master.validate_response(unexpected, &tag("en")),
            err(eq(&SchemaError::UnexpectedLocale("it".to_string())))
        );
    }

    #[rstest]
    #[case("not json")]
    #[case("")]
    fn validate_response_rejects_malformed_json(master: MasterSchema, #[case] raw: &str) {
        assert_that!(
            master.validate_response(raw, &tag("en")),
            err(displays_as(starts_with("Translation response is not valid JSON")))
        );
    }

    #[rstest]
    fn validate_response_rejects_non_object(master: MasterSchema) {
        assert_that!(
            master.validate_response("[]", &tag("en")),
            err(eq(&SchemaError::ResponseNotAnObject("array")))
        );
    }

    #[rstest]
    fn subset_keeps_only_batch_locales(master: MasterSchema) {
        let subset = master.subset(&[tag("fr")]);
        let fr = r#"{"greeting": "Bonjour", "nav": {"home": "Accueil"}}"#;

        let validated = subset.validate_response(&format!(r#"{{"fr": {fr}}}"#), &tag("en"));
        assert_eq!(validated.unwrap().into_keys().collect::<Vec<_>>(), vec![tag("fr")]);
        assert_that!(
            subset.validate_response(&format!(r#"{{"fr": {fr}, "de": {fr}}}"#), &tag("en")),
            err(eq(&SchemaError::UnexpectedLocale("de".to_string())))
        );
    }
}
