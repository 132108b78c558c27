use indexmap::IndexSet;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::path::{child_index, child_key, name_of, resolve, ROOT};
use crate::types::{FlatNode, Node, ValueKind};

pub fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &s[..cut]),
        None => s.to_string(),
    }
}

/// Short one-line description of a value for a tree row.
pub fn preview(v: &Value, truncate_limit: Option<usize>) -> String {
    match v {
        Value::Object(m) if m.is_empty() => "{} 0 keys".into(),
        Value::Object(m) => format!("{{…}} {} keys", m.len()),
        Value::Array(a) if a.is_empty() => "[] 0 items".into(),
        Value::Array(a) => format!("[…] {} items", a.len()),
        Value::String(s) => match truncate_limit {
            Some(limit) => truncate(s, limit),
            None => s.to_string(),
        },
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".into(),
    }
}

fn child_count(v: &Value) -> usize {
    match v {
        Value::Object(m) => m.len(),
        Value::Array(a) => a.len(),
        _ => 0,
    }
}

fn to_node(path: String, key: String, v: &Value, truncate_limit: Option<usize>) -> Node {
    let count = child_count(v);
    Node {
        path,
        key,
        value_type: ValueKind::of(v),
        has_children: count > 0,
        child_count: count,
        preview: preview(v, truncate_limit),
    }
}

/// A page of the direct children of the node at `path`. Leaves have none.
pub fn list_children(
    root: &Value,
    path: &str,
    offset: usize,
    limit: usize,
    truncate_limit: Option<usize>,
) -> Result<Vec<Node>> {
    let target = resolve(root, path).ok_or_else(|| Error::InvalidPath(path.to_string()))?;
    let nodes = match target {
        Value::Object(map) => map
            .iter()
            .skip(offset)
            .take(limit)
            .map(|(k, v)| to_node(child_key(path, k), k.clone(), v, truncate_limit))
            .collect(),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .skip(offset)
            .take(limit)
            .map(|(i, v)| to_node(child_index(path, i), i.to_string(), v, truncate_limit))
            .collect(),
        _ => vec![],
    };
    Ok(nodes)
}

/// JSON text of the node at `path`, for copying.
pub fn node_value_text(root: &Value, path: &str, pretty: bool) -> Result<String> {
    let value = resolve(root, path).ok_or_else(|| Error::InvalidPath(path.to_string()))?;
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

/// Rows for every node whose ancestors are all in `expanded`, in display order.
pub fn flatten(value: &Value, expanded: &IndexSet<String>, truncate_limit: Option<usize>) -> Vec<FlatNode> {
    let mut rows = Vec::new();
    push_rows(value, ROOT.to_string(), 0, expanded, truncate_limit, &mut rows);
    rows
}

fn push_rows(
    value: &Value,
    path: String,
    depth: usize,
    expanded: &IndexSet<String>,
    truncate_limit: Option<usize>,
    rows: &mut Vec<FlatNode>,
) {
    let kind = ValueKind::of(value);
    let open = kind.is_container() && expanded.contains(&path);
    rows.push(FlatNode {
        name: name_of(&path).to_string(),
        path: path.clone(),
        depth,
        is_leaf: !kind.is_container(),
        value_type: kind,
        preview: preview(value, truncate_limit),
    });
    if !open {
        return;
    }
    match value {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                push_rows(item, child_index(&path, i), depth + 1, expanded, truncate_limit, rows);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                push_rows(v, child_key(&path, k), depth + 1, expanded, truncate_limit, rows);
            }
        }
        _ => {}
    }
}
