use std::path::Path;
use std::time::Duration;

use confique::Config as DeriveConfig;

use crate::error::Result;

#[derive(Debug, Clone, DeriveConfig)]
pub struct Config {
    /// Name given to the top-level declaration in the rendered types.
    #[config(env = "JASON_LENS_ROOT_TYPE_NAME", default = "Root")]
    pub root_type_name: String,

    /// How long to wait for a search to answer before showing no matches.
    /// `0` waits forever.
    #[config(env = "JASON_LENS_SEARCH_TIMEOUT_MS", default = 5000)]
    pub search_timeout_ms: u64,

    /// Run searches on a dedicated worker thread instead of the caller's thread.
    #[config(env = "JASON_LENS_OFFLOAD_SEARCH", default = true)]
    pub offload_search: bool,

    /// Default `tracing` filter when `RUST_LOG` is not set.
    #[config(env = "JASON_LENS_LOG", default = "warn")]
    pub log_filter: String,

    /// Number of children listed per page.
    #[config(default = 100)]
    pub page_size: usize,

    /// Strings longer than this many characters are truncated in previews.
    #[config(default = 120)]
    pub preview_limit: usize,
}

impl Config {
    /// Loads from the environment, then `path` if given. Missing files are
    /// skipped; every key has a default.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().env();
        if let Some(path) = path {
            builder = builder.file(path);
        }
        Ok(builder.load()?)
    }

    pub fn search_timeout(&self) -> Option<Duration> {
        (self.search_timeout_ms > 0).then(|| Duration::from_millis(self.search_timeout_ms))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_type_name: crate::path::ROOT.to_string(),
            search_timeout_ms: 5000,
            offload_search: true,
            log_filter: "warn".to_string(),
            page_size: 100,
            preview_limit: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_values_override_defaults() {
        let dir = std::env::temp_dir().join(format!("jason-lens-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "root_type_name = \"Document\"\nsearch_timeout_ms = 0").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.root_type_name, "Document");
        assert_eq!(config.search_timeout(), None);
        assert_eq!(config.page_size, 100);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn defaults_match_loaded_defaults() {
        let loaded = Config::builder().load().unwrap();
        let config = Config::default();
        assert_eq!(config.root_type_name, loaded.root_type_name);
        assert_eq!(config.search_timeout_ms, loaded.search_timeout_ms);
        assert_eq!(config.offload_search, loaded.offload_search);
        assert_eq!(config.log_filter, loaded.log_filter);
        assert_eq!(config.page_size, loaded.page_size);
        assert_eq!(config.preview_limit, loaded.preview_limit);
        assert_eq!(config.search_timeout(), Some(Duration::from_millis(5000)));
    }
}
