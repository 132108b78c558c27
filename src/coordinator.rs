//! Sequencing of search requests across an asynchronous boundary.
//!
//! Every request gets the next sequence number. A response is published only
//! if no newer request has been issued since; older responses are dropped.
//! Issuing a request never interrupts one already running, it just makes that
//! one's answer stale.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::search;
use crate::types::{SearchQuery, SearchRequest, SearchResponse, SearchResult};

/// Where searches run. Implementations must eventually hand a response to
/// `reply`, or drop it, which publishes an empty result.
pub trait SearchExecutor: Send + Sync {
    fn dispatch(&self, request: SearchRequest, reply: Reply) -> Result<()>;
}

/// Runs the search on the caller's thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl SearchExecutor for InlineExecutor {
    fn dispatch(&self, request: SearchRequest, reply: Reply) -> Result<()> {
        reply.send(search::execute(&request));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingResponse,
}

#[derive(Debug, Default)]
struct State {
    // highest sequence number handed out
    issued: u64,
    // highest sequence number answered or abandoned
    settled: u64,
}

impl State {
    fn phase(&self) -> Phase {
        if self.settled < self.issued {
            Phase::AwaitingResponse
        } else {
            Phase::Idle
        }
    }
}

struct Shared {
    state: Mutex<State>,
    settled: Condvar,
    published: watch::Sender<SearchResult>,
}

impl Shared {
    fn accept(&self, response: SearchResponse) {
        let mut state = self.state.lock();
        let id = response.sequence_id;
        if id < state.issued || id <= state.settled {
            trace!(id, latest = state.issued, "dropping stale search response");
            return;
        }
        state.settled = id;
        debug!(id, count = response.count, "publishing search result");
        self.published.send_replace(response.into());
        self.settled.notify_all();
    }
}

/// Handle through which an executor answers one request.
///
/// Dropping it unanswered publishes an empty result for the request, so a
/// failed or abandoned execution never leaves callers waiting.
pub struct Reply {
    shared: Option<Arc<Shared>>,
    sequence_id: u64,
}

impl Reply {
    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    pub fn send(mut self, response: SearchResponse) {
        if let Some(shared) = self.shared.take() {
            shared.accept(response);
        }
    }
}

impl Drop for Reply {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            warn!(id = self.sequence_id, "search request dropped without a response");
            shared.accept(SearchResponse::empty(self.sequence_id));
        }
    }
}

pub struct SearchCoordinator {
    shared: Arc<Shared>,
    executor: Arc<dyn SearchExecutor>,
    timeout: Option<Duration>,
}

impl SearchCoordinator {
    pub fn new(executor: Arc<dyn SearchExecutor>) -> Self {
        let (published, _) = watch::channel(SearchResult::default());
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                settled: Condvar::new(),
                published,
            }),
            executor,
            timeout: None,
        }
    }

    pub fn inline() -> Self {
        Self::new(Arc::new(InlineExecutor))
    }

    /// Bounds how long [`SearchCoordinator::wait`] blocks for a response.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Issues a search and returns its sequence number. Blank terms resolve
    /// to an empty result without reaching the executor.
    pub fn search(&self, value: Arc<Value>, query: SearchQuery) -> u64 {
        let sequence_id = {
            let mut state = self.shared.state.lock();
            state.issued += 1;
            state.issued
        };

        if query.is_blank() {
            self.shared.accept(SearchResponse::empty(sequence_id));
            return sequence_id;
        }

        debug!(id = sequence_id, term = %query.term, "dispatching search");
        let request = SearchRequest {
            sequence_id,
            value,
            query,
        };
        let reply = Reply {
            shared: Some(self.shared.clone()),
            sequence_id,
        };
        match catch_unwind(AssertUnwindSafe(|| self.executor.dispatch(request, reply))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(id = sequence_id, error = %e, "search dispatch failed");
                self.shared.accept(SearchResponse::empty(sequence_id));
            }
            Err(_) => {
                warn!(id = sequence_id, "search panicked");
                self.shared.accept(SearchResponse::empty(sequence_id));
            }
        }
        sequence_id
    }

    pub fn latest_issued(&self) -> u64 {
        self.shared.state.lock().issued
    }

    pub fn phase(&self) -> Phase {
        self.shared.state.lock().phase()
    }

    /// The most recently published result.
    pub fn current(&self) -> SearchResult {
        self.shared.published.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchResult> {
        self.shared.published.subscribe()
    }

    /// Blocks until the latest request is answered and returns the published
    /// result. If the configured timeout passes first, the request is
    /// abandoned: an empty result is published and its late answer is ignored.
    pub fn wait(&self) -> SearchResult {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let mut state = self.shared.state.lock();
        while state.phase() == Phase::AwaitingResponse {
            match deadline {
                Some(deadline) => {
                    if self.shared.settled.wait_until(&mut state, deadline).timed_out()
                        && state.phase() == Phase::AwaitingResponse
                    {
                        let id = state.issued;
                        warn!(id, "search timed out, abandoning request");
                        state.settled = id;
                        self.shared
                            .published
                            .send_replace(SearchResponse::empty(id).into());
                        self.shared.settled.notify_all();
                        break;
                    }
                }
                None => self.shared.settled.wait(&mut state),
            }
        }
        drop(state);
        self.current()
    }
}
