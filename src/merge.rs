//! Delta construction and merging of translated documents.

use serde_json::{
    Map,
    Value,
};

use crate::diff::Change;
use crate::document::{
    Document,
    KeyPath,
    LocaleDocuments,
};

/// Rebuild the slice of the source that needs (re)translation.
///
/// Only `Added` and `Edited` records contribute; their values are inserted at their paths as
/// nested objects. Sibling changes under one parent are all kept.
#[must_use]
pub fn build_delta(changes: &[Change]) -> Document {
    let mut delta = Document::new();
    for change in changes {
        if let Some(value) = change.new_value() {
            insert_at_path(&mut delta, change.path(), value.clone());
        }
    }
    delta
}

/// Paths removed from the source, in edit-script order.
#[must_use]
pub fn deleted_paths(changes: &[Change]) -> Vec<KeyPath> {
    changes
        .iter()
        .filter_map(|change| match change {
            Change::Deleted { path, .. } => Some(path.clone()),
            _ => None,
        })
        .collect()
}

/// Nest `value` under `path`, creating (or replacing non-object) intermediate nodes.
///
/// An empty path is ignored: a root-level change always carries object keys.
pub fn insert_at_path(document: &mut Document, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = document;
    for key in parents {
        let slot = current.entry(key.clone()).or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        current = next;
    }
    current.insert(last.clone(), value);
}

/// Recursively merge `incoming` into `previous`.
///
/// Object values are merged key by key; anything else (strings, arrays, absent keys) is
/// overwritten by the incoming value.
pub fn deep_merge(previous: &mut Document, incoming: Document) {
    for (key, value) in incoming {
        match (previous.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => deep_merge(existing, nested),
            (_, value) => {
                previous.insert(key, value);
            }
        }
    }
}

/// Merge a translated document into the output entry for `locale`.
///
/// A locale with no previous entry simply takes the incoming document.
pub fn merge_locale(output: &mut LocaleDocuments, locale: &str, incoming: Document) {
    match output.get_mut(locale) {
        Some(existing) => deep_merge(existing, incoming),
        None => {
            tracing::debug!(locale, "No previous document to merge into");
            output.insert(locale.to_string(), incoming);
        }
    }
}

/// Remove every path in `deletions` from `document`.
///
/// Missing paths are a no-op. Objects left empty by a removal are removed as well, since empty
/// objects are not valid locale content.
pub fn apply_deletions(document: &mut Document, deletions: &[KeyPath]) {
    for path in deletions {
        remove_path(document, path);
    }
}

/// Returns true when something was removed.
fn remove_path(document: &mut Document, path: &[String]) -> bool {
    match path {
        [] => false,
        [key] => document.remove(key).is_some(),
        [key, rest @ ..] => {
            let Some(Value::Object(child)) = document.get_mut(key) else {
                return false;
            };
            let removed = remove_path(child, rest);
            if removed && child.is_empty() {
                document.remove(key);
            }
            removed
        }
    }
}
