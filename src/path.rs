//! String paths naming a location inside a JSON value.
//!
//! The root is `Root`; object fields append `.key` and array elements append
//! `[index]`. Keys are not escaped, so a key containing `.` or `[` can produce
//! the same string as a different logical location. Every consumer works with
//! the flattened string as-is.

use serde_json::Value;

pub const ROOT: &str = "Root";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

pub fn child_key(parent: &str, key: &str) -> String {
    format!("{}.{}", parent, key)
}

pub fn child_index(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// Display name of the node at `path`: the last `.key` or `[index]` segment.
pub fn name_of(path: &str) -> &str {
    if let Some(open) = path.rfind('[') {
        let inner = &path[open + 1..];
        if let Some(index) = inner.strip_suffix(']') {
            if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) {
                return index;
            }
        }
    }
    match path.rfind('.') {
        Some(dot) => &path[dot + 1..],
        None => path,
    }
}

/// Splits a path back into segments, skipping the leading root token.
///
/// Returns `None` when `path` does not start at the root or an index segment
/// is not a number.
pub fn segments(path: &str) -> Option<Vec<PathSegment>> {
    let mut rest = path.strip_prefix(ROOT)?;
    let mut out = Vec::new();

    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix('[') {
            let close = tail.find(']')?;
            let index = tail[..close].parse().ok()?;
            out.push(PathSegment::Index(index));
            rest = &tail[close + 1..];
        } else if let Some(tail) = rest.strip_prefix('.') {
            let end = next_boundary(tail);
            out.push(PathSegment::Key(tail[..end].to_string()));
            rest = &tail[end..];
        } else {
            return None;
        }
    }

    Some(out)
}

// A key runs until the next `.` or a `[digits]` group.
fn next_boundary(s: &str) -> usize {
    let bytes = s.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'.' => return i,
            b'[' => {
                let digits = bytes[i + 1..].iter().take_while(|c| c.is_ascii_digit()).count();
                if digits > 0 && bytes.get(i + 1 + digits) == Some(&b']') {
                    return i;
                }
            }
            _ => {}
        }
    }
    s.len()
}

/// Walks `root` along `path`. Returns `None` if any segment does not exist.
pub fn resolve<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    segments(path)?
        .iter()
        .try_fold(root, |current, segment| match (segment, current) {
            (PathSegment::Key(k), Value::Object(map)) => map.get(k),
            (PathSegment::Index(i), Value::Array(arr)) => arr.get(*i),
            _ => None,
        })
}
