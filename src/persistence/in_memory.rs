//! JSON 文字列を直接受け渡すストア

use super::{
    LocaleStore,
    StoreError,
    StoreOutput,
};
use crate::document::{
    Document,
    LocaleDocuments,
    parse_document,
    parse_locale_documents,
};

/// Source and previous output passed in as strings; the output comes back as a string.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    /// ソースドキュメントの JSON
    source: String,
    /// 前回の出力。最後に `output_locales` した内容で置き換わる
    previous_output: Option<String>,
}

impl InMemoryStore {
    /// Store over an in-memory source and optional previous output.
    #[must_use]
    pub const fn new(source: String, previous_output: Option<String>) -> Self {
        Self { source, previous_output }
    }
}

impl LocaleStore for InMemoryStore {
    fn source_document(&self) -> Result<Document, StoreError> {
        parse_document(&self.source)
            .map_err(|source| StoreError::Document { name: "source".to_string(), source })
    }

    fn previous_locales(&self) -> Result<Option<LocaleDocuments>, StoreError> {
        let Some(previous) = self.previous_output.as_deref().filter(|text| !text.trim().is_empty())
        else {
            return Ok(None);
        };

        let locales = parse_locale_documents(previous).map_err(|source| StoreError::Document {
            name: "previous_output".to_string(),
            source,
        })?;
        Ok((!locales.is_empty()).then_some(locales))
    }

    fn remove_locale(
        &mut self,
        locale: &str,
        output: &mut LocaleDocuments,
    ) -> Result<(), StoreError> {
        output.remove(locale);
        Ok(())
    }

    fn output_locales(
        &mut self,
        output: &LocaleDocuments,
        _source_locale: &str,
    ) -> Result<StoreOutput, StoreError> {
        let serialized = serde_json::to_string(output)?;
        self.previous_output = Some(serialized.clone());
        Ok(StoreOutput::Json(serialized))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case::absent(None)]
    #[case::blank(Some("   "))]
    #[case::empty_object(Some("{}"))]
    fn previous_locales_none_on_first_run(#[case] previous: Option<&str>) {
        let store = InMemoryStore::new("{}".to_string(), previous.map(ToString::to_string));

        assert_that!(store.previous_locales().unwrap(), none());
    }

    #[rstest]
    fn previous_locales_parses_output() {
        let store = InMemoryStore::new(
            "{}".to_string(),
            Some(r#"{"en": {"a": "A"}, "fr": {"a": "Â"}}"#.to_string()),
        );

        let locales = store.previous_locales().unwrap().unwrap();

        assert_that!(locales.len(), eq(2));
        assert_that!(locales["fr"].get("a"), some(eq(&json!("Â"))));
    }

    #[rstest]
    fn previous_locales_rejects_non_object_locale() {
        let store = InMemoryStore::new("{}".to_string(), Some(r#"{"en": "A"}"#.to_string()));

        assert_that!(
            store.previous_locales(),
            err(displays_as(contains_substring("Expected locale 'en' to hold a JSON object")))
        );
    }

    #[rstest]
    fn source_document_rejects_malformed_json() {
        let store = InMemoryStore::new("{ not json".to_string(), None);

        assert_that!(
            store.source_document(),
            err(displays_as(starts_with("Invalid locale document 'source'")))
        );
    }

    #[rstest]
    fn output_locales_serializes_and_becomes_previous() {
        let mut store = InMemoryStore::new("{}".to_string(), None);
        let mut output = LocaleDocuments::new();
        output.insert("en".to_string(), json!({ "a": "A" }).as_object().cloned().unwrap());

        let result = store.output_locales(&output, "en").unwrap();

        assert_that!(result, eq(&StoreOutput::Json(r#"{"en":{"a":"A"}}"#.to_string())));
        assert_that!(store.previous_locales().unwrap(), some(eq(&output)));
    }
}
