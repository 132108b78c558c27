use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::coordinator::{Reply, SearchExecutor};
use crate::error::{Error, Result};
use crate::search;
use crate::types::{SearchRequest, SearchResponse};

type Job = (SearchRequest, Reply);

/// A dedicated search thread. Requests are queued and answered in order;
/// a panic inside one search is answered with an empty response and the
/// thread keeps serving.
pub struct SearchWorker {
    jobs: Mutex<Option<Sender<Job>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SearchWorker {
    pub fn start() -> Result<Self> {
        let (tx, rx) = unbounded::<Job>();
        let handle = thread::Builder::new()
            .name("search-worker".into())
            .spawn(move || run(rx))
            .map_err(Error::Spawn)?;
        debug!("search worker started");
        Ok(Self {
            jobs: Mutex::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn is_running(&self) -> bool {
        self.jobs.lock().is_some()
    }

    /// Closes the queue and joins the thread once it has drained the
    /// requests already queued. Later dispatches fail with
    /// [`Error::WorkerStopped`].
    pub fn stop(&self) {
        // dropping the sender ends the worker loop
        self.jobs.lock().take();
        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                warn!("search worker exited abnormally");
            }
            debug!("search worker stopped");
        }
    }
}

impl SearchExecutor for SearchWorker {
    fn dispatch(&self, request: SearchRequest, reply: Reply) -> Result<()> {
        let jobs = self.jobs.lock();
        let tx = jobs.as_ref().ok_or(Error::WorkerStopped)?;
        // on failure the returned job, and its reply, are dropped here
        tx.send((request, reply)).map_err(|_| Error::WorkerStopped)
    }
}

impl Drop for SearchWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(jobs: Receiver<Job>) {
    for (request, reply) in jobs.iter() {
        let id = request.sequence_id;
        let response = catch_unwind(AssertUnwindSafe(|| search::execute(&request)))
            .unwrap_or_else(|_| {
                warn!(id, "search panicked, answering with no matches");
                SearchResponse::empty(id)
            });
        reply.send(response);
    }
}
