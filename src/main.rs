use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser as ClapParser, Subcommand};
use serde_json::Value;
use tracing::*;

use jason_lens::{
    document, infer_type, render_types, search::enumerate_expandable_paths, Config, MatchMode,
    SearchCoordinator, SearchExecutor, SearchQuery, SearchWorker, Session, InlineExecutor,
};
use jason_lens::tree;

mod logging;

#[derive(Debug, ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the inferred type declarations of a JSON file.
    Types { input: PathBuf },
    /// Print the path of every object and array.
    Paths { input: PathBuf },
    /// Print the paths matching a search term.
    Search {
        input: PathBuf,
        term: String,
        #[command(flatten)]
        matching: Matching,
        /// Also print the containers to expand to reveal the matches.
        #[arg(long)]
        expand: bool,
    },
    /// List one page of the direct children of a node.
    Children {
        input: PathBuf,
        /// Path of the node, e.g. `Root.items[0]`.
        path: String,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Print the JSON text of a node.
    Value {
        input: PathBuf,
        path: String,
        #[arg(long)]
        compact: bool,
    },
    /// Print the tree rows that would be visible.
    Tree {
        input: PathBuf,
        #[arg(long)]
        expand_all: bool,
        /// Expand the containers leading to matches of this term.
        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(Debug, ClapArgs)]
struct Matching {
    #[arg(long)]
    case_sensitive: bool,
    #[arg(long, conflicts_with = "regex")]
    whole_word: bool,
    #[arg(long)]
    regex: bool,
}

impl Matching {
    fn query(&self, term: &str) -> SearchQuery {
        let mode = if self.regex {
            MatchMode::Regex
        } else if self.whole_word {
            MatchMode::WholeWord
        } else {
            MatchMode::Substring
        };
        SearchQuery::new(term).case_sensitive(self.case_sensitive).mode(mode)
    }
}

/// `-` reads standard input.
fn read_document(input: &Path) -> anyhow::Result<Value> {
    let value = if input == Path::new("-") {
        document::load_reader(std::io::stdin().lock(), "stdin")
    } else {
        document::load_file(input)
    };
    value.with_context(|| format!("failed to load `{}`", input.display()))
}

fn coordinator(config: &Config) -> anyhow::Result<(SearchCoordinator, Option<Arc<SearchWorker>>)> {
    if !config.offload_search {
        let executor: Arc<dyn SearchExecutor> = Arc::new(InlineExecutor);
        return Ok((SearchCoordinator::new(executor), None));
    }
    let worker = Arc::new(SearchWorker::start().context("starting search worker")?);
    let coordinator =
        SearchCoordinator::new(worker.clone()).with_timeout(config.search_timeout());
    Ok((coordinator, Some(worker)))
}

fn main() -> anyhow::Result<()> {
    let cli = Args::parse();
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    logging::setup_logging(&config.log_filter);
    debug!(?config);

    match cli.command {
        Command::Types { input } => {
            let value = read_document(&input)?;
            let inference = infer_type(&value);
            debug!(named = inference.registry.len(), "inferred types");
            println!(
                "{}",
                render_types(&config.root_type_name, &inference.root, &inference.registry)
            );
        }
        Command::Paths { input } => {
            let value = read_document(&input)?;
            for path in enumerate_expandable_paths(&value) {
                println!("{path}");
            }
        }
        Command::Children {
            input,
            path,
            offset,
        } => {
            let value = read_document(&input)?;
            let nodes = tree::list_children(
                &value,
                &path,
                offset,
                config.page_size,
                Some(config.preview_limit),
            )?;
            for node in nodes {
                println!("{}\t{:?}\t{}", node.path, node.value_type, node.preview);
            }
        }
        Command::Value {
            input,
            path,
            compact,
        } => {
            let value = read_document(&input)?;
            println!("{}", tree::node_value_text(&value, &path, !compact)?);
        }
        Command::Search {
            input,
            term,
            matching,
            expand,
        } => {
            let value = Arc::new(read_document(&input)?);
            let (coordinator, worker) = coordinator(&config)?;
            coordinator.search(value, matching.query(&term));
            let result = coordinator.wait();
            for path in &result.paths {
                println!("{path}");
            }
            if expand {
                for path in &result.auto_expanded_paths {
                    println!("expand {path}");
                }
            }
            eprintln!("{} match(es)", result.count);
            if let Some(worker) = worker {
                worker.stop();
            }
        }
        Command::Tree {
            input,
            expand_all,
            search,
        } => {
            let value = Arc::new(read_document(&input)?);
            let (coordinator, worker) = coordinator(&config)?;
            let mut session = Session::new(coordinator, &config);
            session.set_document(value);
            if expand_all {
                session.expand_all();
            }
            if let Some(term) = search {
                session.search(SearchQuery::new(term));
                let count = session.wait_for_search().count;
                info!(count, "search applied");
            }
            for row in session.visible_rows() {
                let marker = match (row.is_leaf, session.is_expanded(&row.path)) {
                    (true, _) => ' ',
                    (false, true) => '-',
                    (false, false) => '+',
                };
                println!("{}{} {}: {}", "  ".repeat(row.depth), marker, row.name, row.preview);
            }
            if let Some(worker) = worker {
                worker.stop();
            }
        }
    }

    Ok(())
}
