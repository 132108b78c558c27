//! Tree search over a decoded JSON value.
//!
//! Everything here is a pure function of the value and the query. The
//! functions never mutate the value, so the same snapshot can be searched on
//! a worker thread while other code reads it.

use indexmap::IndexSet;
use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::path::{child_index, child_key, name_of, ROOT};
use crate::types::{MatchMode, SearchQuery, SearchRequest, SearchResponse};

/// Compiled form of a [`SearchQuery`].
pub struct Matcher {
    needle: String,
    case_sensitive: bool,
    mode: MatchMode,
    re: Option<Regex>,
}

impl Matcher {
    /// Returns `None` for a blank term or a pattern that does not compile.
    pub fn new(query: &SearchQuery) -> Option<Self> {
        let term = query.term.trim();
        if term.is_empty() {
            return None;
        }
        let re = match query.mode {
            MatchMode::Regex => Some(
                RegexBuilder::new(term)
                    .case_insensitive(!query.case_sensitive)
                    .build()
                    .map_err(|e| tracing::debug!(error = %e, "invalid search pattern"))
                    .ok()?,
            ),
            _ => None,
        };
        let needle = if query.case_sensitive {
            term.to_string()
        } else {
            term.to_lowercase()
        };
        Some(Self {
            needle,
            case_sensitive: query.case_sensitive,
            mode: query.mode,
            re,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        if let Some(re) = &self.re {
            return re.is_match(text);
        }
        let lowered;
        let text = if self.case_sensitive {
            text
        } else {
            lowered = text.to_lowercase();
            &lowered
        };
        match self.mode {
            MatchMode::WholeWord => text
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word == self.needle),
            _ => text.contains(&self.needle),
        }
    }

    /// Name match for any node; value match for leaves only.
    pub fn node_matches(&self, value: &Value, name: &str) -> bool {
        if self.is_match(name) {
            return true;
        }
        match value {
            Value::Null => self.is_match("null"),
            Value::Bool(b) => self.is_match(&b.to_string()),
            Value::Number(n) => self.is_match(&number_text(n)),
            Value::String(s) => self.is_match(s),
            Value::Array(_) | Value::Object(_) => false,
        }
    }
}

/// Display text of a number. Integral floats print without a fraction, so
/// `1.0` reads as `1`.
pub fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => {
            if f == 0.0 {
                "0".to_string()
            } else {
                format!("{f:.0}")
            }
        }
        _ => n.to_string(),
    }
}

/// Every object and array path, depth-first. Empty containers are included.
pub fn enumerate_expandable_paths(value: &Value) -> IndexSet<String> {
    fn walk(value: &Value, path: String, out: &mut IndexSet<String>) {
        match value {
            Value::Object(map) => {
                out.insert(path.clone());
                for (key, child) in map {
                    walk(child, child_key(&path, key), out);
                }
            }
            Value::Array(items) => {
                out.insert(path.clone());
                for (i, child) in items.iter().enumerate() {
                    walk(child, child_index(&path, i), out);
                }
            }
            _ => {}
        }
    }

    let mut out = IndexSet::new();
    walk(value, ROOT.to_string(), &mut out);
    out
}

/// Paths of nodes whose own name or leaf value matches, in traversal order.
pub fn collect_match_paths(value: &Value, query: &SearchQuery) -> Vec<String> {
    let Some(matcher) = Matcher::new(query) else {
        return Vec::new();
    };
    let mut out = IndexSet::new();
    collect_matches(&matcher, value, ROOT.to_string(), &mut out);
    out.into_iter().collect()
}

fn collect_matches(matcher: &Matcher, value: &Value, path: String, out: &mut IndexSet<String>) {
    if matcher.node_matches(value, name_of(&path)) {
        out.insert(path.clone());
    }
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                collect_matches(matcher, child, child_key(&path, key), out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                collect_matches(matcher, child, child_index(&path, i), out);
            }
        }
        _ => {}
    }
}

/// Containers whose subtree holds a match, counting the container's own name.
pub fn collect_auto_expanded_paths(value: &Value, query: &SearchQuery) -> IndexSet<String> {
    let Some(matcher) = Matcher::new(query) else {
        return IndexSet::new();
    };
    // (path, subtree matched) in pre-order; the flag is filled in on the way back up
    let mut visited: Vec<(String, bool)> = Vec::new();
    subtree_matches(&matcher, value, ROOT.to_string(), &mut visited);
    visited
        .into_iter()
        .filter_map(|(path, hit)| hit.then_some(path))
        .collect()
}

fn subtree_matches(
    matcher: &Matcher,
    value: &Value,
    path: String,
    visited: &mut Vec<(String, bool)>,
) -> bool {
    let children: Vec<(String, &Value)> = match value {
        Value::Object(map) => map.iter().map(|(k, v)| (child_key(&path, k), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (child_index(&path, i), v))
            .collect(),
        _ => return matcher.node_matches(value, name_of(&path)),
    };

    let mut hit = matcher.is_match(name_of(&path));
    let slot = visited.len();
    visited.push((path, false));
    for (child_path, child) in children {
        // no short-circuit: every descendant container needs its own verdict
        hit |= subtree_matches(matcher, child, child_path, visited);
    }
    visited[slot].1 = hit;
    hit
}

/// Runs both collections for one request.
pub fn execute(request: &SearchRequest) -> SearchResponse {
    let value = request.value.as_ref();
    let paths = collect_match_paths(value, &request.query);
    let auto_expanded_paths = if paths.is_empty() {
        Vec::new()
    } else {
        collect_auto_expanded_paths(value, &request.query)
            .into_iter()
            .collect()
    };
    SearchResponse {
        sequence_id: request.sequence_id,
        count: paths.len(),
        paths,
        auto_expanded_paths,
    }
}
