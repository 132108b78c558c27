use std::sync::Arc;

use indexmap::IndexSet;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::coordinator::SearchCoordinator;
use crate::document;
use crate::error::DecodeError;
use crate::infer::infer_type;
use crate::render::render_inference;
use crate::search::enumerate_expandable_paths;
use crate::tree::flatten;
use crate::types::{FlatNode, SearchQuery, SearchResult};

/// Position within the current match list. Moves wrap around.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MatchCursor {
    index: usize,
}

impl MatchCursor {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn next(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        self.index = (self.index + 1) % len;
        Some(self.index)
    }

    pub fn previous(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        self.index = (self.index + len - 1) % len;
        Some(self.index)
    }
}

/// Everything one open document needs: the text, what it decoded to, and
/// the tree's expansion and search state.
pub struct Session {
    text: String,
    doc: Option<Arc<Value>>,
    error: Option<DecodeError>,
    expanded: IndexSet<String>,
    auto_expanded: IndexSet<String>,
    query: SearchQuery,
    result: SearchResult,
    cursor: MatchCursor,
    coordinator: SearchCoordinator,
    root_type_name: String,
    preview_limit: usize,
}

impl Session {
    pub fn new(coordinator: SearchCoordinator, config: &Config) -> Self {
        Self {
            text: String::new(),
            doc: None,
            error: None,
            expanded: IndexSet::new(),
            auto_expanded: IndexSet::new(),
            query: SearchQuery::default(),
            result: SearchResult::default(),
            cursor: MatchCursor::default(),
            coordinator,
            root_type_name: config.root_type_name.clone(),
            preview_limit: config.preview_limit,
        }
    }

    /// Replaces the text and decodes it. On a syntax error the document is
    /// cleared and the error kept for display. The active search is re-run
    /// against the new document.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        match document::decode(&self.text) {
            Ok(value) => self.install(Some(Arc::new(value)), None),
            Err(e) => {
                debug!(error = %e, "document failed to decode");
                self.install(None, Some(e));
            }
        }
    }

    /// Opens an already decoded document; the text becomes its pretty form.
    pub fn set_document(&mut self, value: Arc<Value>) {
        self.text = serde_json::to_string_pretty(value.as_ref()).unwrap_or_default();
        self.install(Some(value), None);
    }

    fn install(&mut self, doc: Option<Arc<Value>>, error: Option<DecodeError>) {
        self.doc = doc;
        self.error = error;
        if !self.query.is_blank() {
            let query = self.query.clone();
            self.search(query);
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn error(&self) -> Option<&DecodeError> {
        self.error.as_ref()
    }

    /// Snapshot of the current document; `None` when nothing decoded.
    pub fn document(&self) -> Option<Arc<Value>> {
        self.doc.clone()
    }

    // what the tree and the search see: a missing document reads as `null`
    fn value(&self) -> Arc<Value> {
        self.document().unwrap_or_else(|| Arc::new(Value::Null))
    }

    /// Rendered type declarations, or `None` while there is no JSON yet.
    pub fn type_declarations(&self) -> Option<String> {
        let doc = self.document()?;
        if doc.is_null() {
            return None;
        }
        Some(render_inference(&self.root_type_name, &infer_type(&doc)))
    }

    pub fn search(&mut self, query: SearchQuery) -> u64 {
        if query.is_blank() {
            self.auto_expanded.clear();
            self.cursor.reset();
        }
        self.query = query.clone();
        self.coordinator.search(self.value(), query)
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// Picks up a newly published search result. Returns `true` if one was applied.
    pub fn refresh(&mut self) -> bool {
        let latest = self.coordinator.current();
        if latest.sequence_id == self.result.sequence_id {
            return false;
        }
        self.apply(latest);
        true
    }

    /// Waits for the outstanding search and applies its result.
    pub fn wait_for_search(&mut self) -> &SearchResult {
        let latest = self.coordinator.wait();
        if latest.sequence_id != self.result.sequence_id {
            self.apply(latest);
        }
        &self.result
    }

    fn apply(&mut self, result: SearchResult) {
        // an empty expand set leaves the previous auto-expansion in place
        if !result.auto_expanded_paths.is_empty() {
            self.auto_expanded = result.auto_expanded_paths.clone();
        }
        self.cursor.reset();
        self.result = result;
    }

    pub fn matches(&self) -> &[String] {
        &self.result.paths
    }

    pub fn match_count(&self) -> usize {
        self.result.count
    }

    pub fn current_match(&self) -> Option<&str> {
        self.result.paths.get(self.cursor.index()).map(String::as_str)
    }

    pub fn next_match(&mut self) -> Option<&str> {
        let i = self.cursor.next(self.result.paths.len())?;
        Some(&self.result.paths[i])
    }

    pub fn previous_match(&mut self) -> Option<&str> {
        let i = self.cursor.previous(self.result.paths.len())?;
        Some(&self.result.paths[i])
    }

    pub fn toggle(&mut self, path: &str) {
        if !self.expanded.shift_remove(path) {
            self.expanded.insert(path.to_string());
        }
    }

    pub fn expand_all(&mut self) {
        self.expanded = enumerate_expandable_paths(&self.value());
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
        self.auto_expanded.clear();
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded.contains(path) || self.auto_expanded.contains(path)
    }

    pub fn visible_rows(&self) -> Vec<FlatNode> {
        let merged: IndexSet<String> = self
            .expanded
            .iter()
            .chain(self.auto_expanded.iter())
            .cloned()
            .collect();
        flatten(&self.value(), &merged, Some(self.preview_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_wraps_both_ways() {
        let mut cursor = MatchCursor::default();
        assert_eq!(cursor.next(3), Some(1));
        assert_eq!(cursor.next(3), Some(2));
        assert_eq!(cursor.next(3), Some(0));
        assert_eq!(cursor.previous(3), Some(2));
        assert_eq!(cursor.next(0), None);
    }

    #[test]
    fn document_snapshot_follows_decoding() {
        let mut session = Session::new(SearchCoordinator::inline(), &Config::default());
        assert!(session.document().is_none());
        let value = Arc::new(serde_json::json!({ "a": [1] }));
        session.set_document(value.clone());
        assert!(Arc::ptr_eq(&session.document().unwrap(), &value));
        session.set_text("{ broken");
        assert!(session.document().is_none());
        assert!(session.error().is_some());
    }

    #[test]
    fn toggling_twice_collapses() {
        let mut session = Session::new(SearchCoordinator::inline(), &Config::default());
        session.set_text(r#"{ "a": { "b": 1 } }"#);
        session.toggle("Root");
        assert!(session.is_expanded("Root"));
        assert_eq!(session.visible_rows().len(), 2);
        session.toggle("Root");
        assert!(!session.is_expanded("Root"));
        assert_eq!(session.visible_rows().len(), 1);
    }
}
