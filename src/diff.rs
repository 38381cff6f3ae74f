//! Structural document diff
//!
//! Compares two JSON trees and produces a flat edit script. Nothing here knows about locales;
//! the sync engine decides what a change means for translation.

use serde_json::Value;

use crate::document::KeyPath;

/// A single change between a baseline and a current document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A key present only in the current document.
    Added {
        /// 追加されたキー
        path: KeyPath,
        /// 追加された値
        value: Value,
    },
    /// A key present only in the baseline.
    Deleted {
        /// 削除されたキー
        path: KeyPath,
        /// 削除前の値
        previous: Value,
    },
    /// A key whose leaf value (or type) changed.
    Edited {
        /// 変更されたキー
        path: KeyPath,
        /// 変更前の値
        previous: Value,
        /// 変更後の値
        value: Value,
    },
    /// A change inside the array at `path`.
    Array {
        /// 配列のキー
        path: KeyPath,
        /// 要素の位置
        index: usize,
        /// 要素の変更内容
        item: ArrayItem,
    },
}

/// Element-level change inside an array. Arrays are compared by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayItem {
    /// 現在の配列にだけある要素
    Added(Value),
    /// ベースラインにだけある要素
    Deleted(Value),
    /// 同じ位置の要素が変わった
    Edited {
        /// 変更前の要素
        previous: Value,
        /// 変更後の要素
        value: Value,
    },
}

impl Change {
    /// Key path the change applies to.
    #[must_use]
    pub fn path(&self) -> &[String] {
        match self {
            Self::Added { path, .. }
            | Self::Deleted { path, .. }
            | Self::Edited { path, .. }
            | Self::Array { path, .. } => path,
        }
    }

    /// New value carried by additions and edits.
    #[must_use]
    pub const fn new_value(&self) -> Option<&Value> {
        match self {
            Self::Added { value, .. } | Self::Edited { value, .. } => Some(value),
            Self::Deleted { .. } | Self::Array { .. } => None,
        }
    }
}

/// Compute the edit script turning `baseline` into `current`.
///
/// Baseline keys are visited first in their own order, then keys that only exist in `current`.
/// Equal trees produce an empty script.
#[must_use]
pub fn diff(baseline: &Value, current: &Value) -> Vec<Change> {
    let mut changes = Vec::new();
    let mut path = Vec::new();
    diff_value(baseline, current, &mut path, &mut changes);
    changes
}

/// `path` 以下を再帰的に比較し、変更を `changes` に追加する
fn diff_value(baseline: &Value, current: &Value, path: &mut KeyPath, changes: &mut Vec<Change>) {
    match (baseline, current) {
        (Value::Object(lhs), Value::Object(rhs)) => {
            for (key, lhs_value) in lhs {
                path.push(key.clone());
                match rhs.get(key) {
                    Some(rhs_value) => diff_value(lhs_value, rhs_value, path, changes),
                    None => {
                        changes.push(Change::Deleted { path: path.clone(), previous: lhs_value.clone() });
                    }
                }
                path.pop();
            }
            for (key, rhs_value) in rhs {
                if lhs.contains_key(key) {
                    continue;
                }
                let mut added_path = path.clone();
                added_path.push(key.clone());
                changes.push(Change::Added { path: added_path, value: rhs_value.clone() });
            }
        }
        (Value::Array(lhs), Value::Array(rhs)) => diff_array(lhs, rhs, path, changes),
        _ if baseline == current => {}
        _ => changes.push(Change::Edited {
            path: path.clone(),
            previous: baseline.clone(),
            value: current.clone(),
        }),
    }
}

/// 位置ごとに要素を比較する
fn diff_array(lhs: &[Value], rhs: &[Value], path: &KeyPath, changes: &mut Vec<Change>) {
    let longest = lhs.len().max(rhs.len());
    for index in 0..longest {
        let item = match (lhs.get(index), rhs.get(index)) {
            (Some(previous), Some(value)) if previous != value => {
                ArrayItem::Edited { previous: previous.clone(), value: value.clone() }
            }
            (Some(previous), None) => ArrayItem::Deleted(previous.clone()),
            (None, Some(value)) => ArrayItem::Added(value.clone()),
            _ => continue,
        };
        changes.push(Change::Array { path: path.clone(), index, item });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn path(keys: &[&str]) -> KeyPath {
        keys.iter().map(ToString::to_string).collect()
    }

    #[rstest]
    fn identical_documents_produce_no_changes() {
        let doc = json!({ "common": { "hello": "Hello" }, "title": "App" });

        assert_that!(diff(&doc, &doc), is_empty());
    }

    #[rstest]
    fn detects_added_leaf_and_object() {
        let baseline = json!({ "a": "1" });
        let current = json!({ "a": "1", "b": "2", "c": { "d": "3" } });

        let changes = diff(&baseline, &current);

        assert_eq!(
            changes,
            vec![
                Change::Added { path: path(&["b"]), value: json!("2") },
                Change::Added { path: path(&["c"]), value: json!({ "d": "3" }) },
            ]
        );
    }

    #[rstest]
    fn detects_deleted_keys() {
        let baseline = json!({ "a": "1", "b": "2", "nested": { "x": "y", "z": "w" } });
        let current = json!({ "a": "1", "nested": { "x": "y" } });

        let changes = diff(&baseline, &current);

        assert_eq!(
            changes,
            vec![
                Change::Deleted { path: path(&["b"]), previous: json!("2") },
                Change::Deleted { path: path(&["nested", "z"]), previous: json!("w") },
            ]
        );
    }

    #[rstest]
    fn detects_edited_nested_leaf() {
        let baseline = json!({ "common": { "hello": "Hello", "bye": "Bye" } });
        let current = json!({ "common": { "hello": "Hi", "bye": "Bye" } });

        let changes = diff(&baseline, &current);

        assert_eq!(
            changes,
            vec![Change::Edited {
                path: path(&["common", "hello"]),
                previous: json!("Hello"),
                value: json!("Hi"),
            }]
        );
    }

    #[rstest]
    fn type_change_is_an_edit() {
        let baseline = json!({ "a": "flat" });
        let current = json!({ "a": { "nested": "value" } });

        let changes = diff(&baseline, &current);

        assert_that!(changes, len(eq(1)));
        assert_eq!(changes[0].path(), ["a".to_string()]);
        assert_eq!(changes[0].new_value(), Some(&json!({ "nested": "value" })));
    }

    #[rstest]
    fn array_changes_are_reported_by_index() {
        let baseline = json!({ "items": ["a", "b", "c"] });
        let current = json!({ "items": ["a", "B"] });

        let changes = diff(&baseline, &current);

        assert_eq!(
            changes,
            vec![
                Change::Array {
                    path: path(&["items"]),
                    index: 1,
                    item: ArrayItem::Edited { previous: json!("b"), value: json!("B") },
                },
                Change::Array {
                    path: path(&["items"]),
                    index: 2,
                    item: ArrayItem::Deleted(json!("c")),
                },
            ]
        );
    }

    #[rstest]
    fn array_growth_is_an_added_item() {
        let changes = diff(&json!(["a"]), &json!(["a", "b"]));

        assert_eq!(
            changes,
            vec![Change::Array { path: vec![], index: 1, item: ArrayItem::Added(json!("b")) }]
        );
    }

    #[rstest]
    fn deletions_carry_no_new_value() {
        let changes = diff(&json!({ "a": "1" }), &json!({}));

        assert_that!(changes, len(eq(1)));
        assert_that!(changes[0].new_value(), none());
    }
}
