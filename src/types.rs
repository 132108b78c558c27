use std::sync::Arc;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchMode {
    #[default]
    Substring,
    WholeWord,
    Regex,
}

/// What to look for. The defaults give a case-insensitive substring search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub term: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub case_sensitive: bool,
    #[serde(default, skip_serializing_if = "MatchMode::is_substring")]
    pub mode: MatchMode,
}

impl MatchMode {
    fn is_substring(&self) -> bool {
        *self == MatchMode::Substring
    }
}

impl SearchQuery {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    pub fn mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Blank terms never reach the search engine.
    pub fn is_blank(&self) -> bool {
        self.term.trim().is_empty()
    }
}

/// Payload sent across the search boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub sequence_id: u64,
    pub value: Arc<Value>,
    #[serde(flatten)]
    pub query: SearchQuery,
}

/// Reply to a [`SearchRequest`]. Sets travel as plain sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub sequence_id: u64,
    pub paths: Vec<String>,
    pub count: usize,
    pub auto_expanded_paths: Vec<String>,
}

impl SearchResponse {
    pub fn empty(sequence_id: u64) -> Self {
        Self {
            sequence_id,
            ..Self::default()
        }
    }
}

/// A published search outcome, with the auto-expand set rebuilt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub sequence_id: u64,
    pub paths: Vec<String>,
    pub count: usize,
    pub auto_expanded_paths: IndexSet<String>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.auto_expanded_paths.is_empty()
    }
}

impl From<SearchResponse> for SearchResult {
    fn from(response: SearchResponse) -> Self {
        Self {
            sequence_id: response.sequence_id,
            paths: response.paths,
            count: response.count,
            auto_expanded_paths: response.auto_expanded_paths.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => ValueKind::Object,
            Value::Array(_) => ValueKind::Array,
            Value::String(_) => ValueKind::String,
            Value::Number(_) => ValueKind::Number,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Null => ValueKind::Null,
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, ValueKind::Object | ValueKind::Array)
    }
}

/// A direct child of some node, as listed by [`crate::tree::list_children`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub path: String,
    pub key: String, // key if object, index if array (as string)
    pub value_type: ValueKind,
    pub has_children: bool,
    pub child_count: usize,
    pub preview: String,
}

/// One visible row of the flattened tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatNode {
    pub name: String,
    pub path: String,
    pub depth: usize,
    pub is_leaf: bool,
    pub value_type: ValueKind,
    pub preview: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_request_carries_only_id_value_and_term() {
        let request = SearchRequest {
            sequence_id: 3,
            value: Arc::new(json!({ "a": 1 })),
            query: SearchQuery::new("a"),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "sequenceId": 3, "value": { "a": 1 }, "term": "a" })
        );
    }

    #[test]
    fn request_options_survive_transport() {
        let request = SearchRequest {
            sequence_id: 1,
            value: Arc::new(json!([1])),
            query: SearchQuery::new("^a").case_sensitive(true).mode(MatchMode::Regex),
        };
        let text = serde_json::to_string(&request).unwrap();
        let back: SearchRequest = serde_json::from_str(&text).unwrap();
        assert_eq!(back.query, request.query);
        assert_eq!(*back.value, json!([1]));
    }

    #[test]
    fn response_rebuilds_expand_set() {
        let response: SearchResponse = serde_json::from_value(json!({
            "sequenceId": 7,
            "paths": ["Root.a"],
            "count": 1,
            "autoExpandedPaths": ["Root", "Root"]
        }))
        .unwrap();
        let result = SearchResult::from(response);
        assert_eq!(result.sequence_id, 7);
        assert_eq!(result.auto_expanded_paths.len(), 1);
        assert!(result.auto_expanded_paths.contains("Root"));
    }
}
