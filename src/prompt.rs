//! Prompt text sent to the translation provider.
//!
//! The planner estimates token usage from the same text the provider sends, so both go through
//! these functions.

use crate::document::Document;
use crate::locale::{
    LocaleTag,
    join_tags,
};

/// System instructions for the translation model.
pub const SYSTEM_PROMPT: &str = "You are a language translation assistant designed to help users \
translate locale files from one language to another. Given a JSON object representing a locale in \
the source language, the locale code for that language, and locale code of the target languages, \
your task is to translate the content into the target language(s) while preserving the JSON \
structure.\n- Retain the structure and keys of the source JSON.\n- Translate the values \
accurately according to the provided source and target languages.\n- Do not translate technical \
terms or placeholders like `{name}`, `{count}`, or HTML tags.";

/// User message embedding the document and the requested locales.
#[must_use]
pub fn user_message(
    source_locale: &LocaleTag,
    target_locales: &[LocaleTag],
    document: &Document,
) -> String {
    format!(
        "Translate the following JSON object from {source_locale} into the following target \
         locales: {}. Please return a JSON object where each target locale is a key. The value \
         each key should hold is the translation in that language. Preserve the \
         structure:\n\nSource JSON:\n{}",
        join_tags(target_locales),
        document_json(document),
    )
}

/// Compact JSON rendering of a document, as embedded in the prompt.
#[must_use]
pub fn document_json(document: &Document) -> String {
    serde_json::to_string(document).unwrap_or_default()
}
