use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::{DecodeError, Error, Result};

/// Decodes editor text. Blank input is an empty document and decodes to `null`.
pub fn decode(text: &str) -> std::result::Result<Value, DecodeError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| DecodeError::from(&e))
}

pub fn load_reader<R: Read>(reader: R, origin: &str) -> Result<Value> {
    let mut text = String::new();
    BufReader::new(reader)
        .read_to_string(&mut text)
        .map_err(|source| Error::Io {
            path: origin.to_string(),
            source,
        })?;
    debug!(origin, bytes = text.len(), "decoding document");
    Ok(decode(&text)?)
}

pub fn load_file(path: &Path) -> Result<Value> {
    let origin = path.display().to_string();
    let file = File::open(path).map_err(|source| Error::Io {
        path: origin.clone(),
        source,
    })?;
    load_reader(file, &origin)
}
