//! Structural type inference and tree search for JSON documents.
//!
//! [`infer::infer_type`] and [`render::render_types`] turn a decoded value into
//! TypeScript-style declarations. [`search`] finds matching nodes and the
//! containers to expand to reveal them, and [`coordinator::SearchCoordinator`]
//! runs those searches, inline or on a [`worker::SearchWorker`], publishing
//! only the newest request's answer.

pub mod config;
pub mod coordinator;
pub mod document;
pub mod error;
pub mod infer;
pub mod path;
pub mod render;
pub mod search;
pub mod state;
pub mod tree;
pub mod types;
pub mod worker;

pub use crate::config::Config;
pub use crate::coordinator::{InlineExecutor, Phase, Reply, SearchCoordinator, SearchExecutor};
pub use crate::error::{DecodeError, Error, Result};
pub use crate::infer::{infer_type, Inference, TypeNode, TypeRegistry};
pub use crate::render::render_types;
pub use crate::search::enumerate_expandable_paths;
pub use crate::state::Session;
pub use crate::types::{MatchMode, SearchQuery, SearchRequest, SearchResponse, SearchResult};
pub use crate::worker::SearchWorker;
