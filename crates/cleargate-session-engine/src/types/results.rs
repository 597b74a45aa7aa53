//! Run results and locals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ids::NodeUuid;

/// Result values longer than this many characters are truncated on save.
pub const MAX_RESULT_VALUE_LENGTH: usize = 640;

/// A named value saved by a run, e.g. the category a router picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub node_uuid: NodeUuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
    pub created_on: DateTime<Utc>,
}

/// Results of a run keyed by normalized result name.
///
/// Saving under a name that normalizes to an existing key replaces the
/// previous result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Results(BTreeMap<String, RunResult>);

impl Results {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a result, truncating its value. Returns the stored result.
    pub fn save(&mut self, mut result: RunResult) -> &RunResult {
        result.value = truncate(&result.value, MAX_RESULT_VALUE_LENGTH);
        let key = snakify(&result.name);
        self.0.insert(key.clone(), result);
        &self.0[&key]
    }

    /// Look up a result by name. The name is normalized first.
    pub fn get(&self, name: &str) -> Option<&RunResult> {
        self.0.get(&snakify(name))
    }

    /// Merge `other` into this set. When both hold a key the more recently
    /// created result wins; ties keep the result already present. Backs the
    /// session-wide view in [`Session::merged_results`](crate::runtime::Session::merged_results).
    pub(crate) fn merge(&mut self, other: &Results) {
        for (key, theirs) in &other.0 {
            match self.0.get(key) {
                Some(ours) if ours.created_on >= theirs.created_on => {}
                _ => {
                    self.0.insert(key.clone(), theirs.clone());
                }
            }
        }
    }

    /// Drop `extra` payloads that serialize to `max` bytes or more.
    pub(crate) fn drop_large_extras(&mut self, max: usize) {
        for result in self.0.values_mut() {
            let large = result
                .extra
                .as_ref()
                .is_some_and(|extra| serde_json::to_string(extra).map_or(true, |s| s.len() >= max));
            if large {
                result.extra = None;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RunResult)> {
        self.0.iter()
    }
}

/// Run-scoped scratch variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locals(BTreeMap<String, String>);

impl Locals {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn clear(&mut self, key: &str) {
        self.0.remove(key);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Normalize a result name into its lookup key: lowercase, with every run
/// of non-alphanumeric characters collapsed to a single underscore.
pub fn snakify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

fn truncate(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn result(name: &str, value: &str, secs: i64) -> RunResult {
        RunResult {
            name: name.into(),
            value: value.into(),
            category: None,
            node_uuid: NodeUuid(Uuid::nil()),
            input: None,
            extra: None,
            created_on: DateTime::from_timestamp(secs, 0).unwrap(),
        }
    }

    #[test]
    fn snakify_normalizes_names() {
        assert_eq!(snakify("Favorite Color"), "favorite_color");
        assert_eq!(snakify("  Age (years)! "), "age_years");
        assert_eq!(snakify("already_snake"), "already_snake");
        assert_eq!(snakify("Ünïcode Name"), "ünïcode_name");
    }

    #[test]
    fn save_is_last_write_wins_by_normalized_name() {
        let mut results = Results::new();
        results.save(result("Favorite Color", "red", 1));
        results.save(result("favorite color", "blue", 2));

        assert_eq!(results.len(), 1);
        assert_eq!(results.get("FAVORITE COLOR").unwrap().value, "blue");
    }

    #[test]
    fn save_truncates_long_values() {
        let mut results = Results::new();
        let long = "x".repeat(MAX_RESULT_VALUE_LENGTH + 50);
        let saved = results.save(result("essay", &long, 1));
        assert_eq!(saved.value.chars().count(), MAX_RESULT_VALUE_LENGTH);
    }

    #[test]
    fn merge_prefers_newer_results() {
        let mut ours = Results::new();
        ours.save(result("color", "red", 5));
        ours.save(result("size", "large", 1));

        let mut theirs = Results::new();
        theirs.save(result("color", "blue", 3));
        theirs.save(result("size", "small", 9));
        theirs.save(result("shape", "round", 2));

        ours.merge(&theirs);
        assert_eq!(ours.get("color").unwrap().value, "red");
        assert_eq!(ours.get("size").unwrap().value, "small");
        assert_eq!(ours.get("shape").unwrap().value, "round");
    }

    #[test]
    fn drop_large_extras_keeps_small_payloads() {
        let mut results = Results::new();
        let mut small = result("small", "200", 1);
        small.extra = Some(serde_json::json!({"ok": true}));
        let mut large = result("large", "200", 1);
        large.extra = Some(serde_json::json!({"padding": "x".repeat(64)}));
        results.save(small);
        results.save(large);

        results.drop_large_extras(32);
        assert!(results.get("small").unwrap().extra.is_some());
        assert!(results.get("large").unwrap().extra.is_none());
        assert_eq!(results.get("large").unwrap().value, "200");
    }

    #[test]
    fn locals_set_and_clear() {
        let mut locals = Locals::default();
        locals.set("counter", "1");
        assert_eq!(locals.get("counter"), Some("1"));
        locals.clear("counter");
        assert!(locals.is_empty());
    }
}
