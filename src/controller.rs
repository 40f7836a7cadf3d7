use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::FetchError;
use crate::hn_client::SearchBackend;
use crate::models::PageResult;
use crate::session::{FetchRequest, SessionState};

/// Shared flag saying whether the owner of a controller is still around.
///
/// Clones observe the same flag. Once cancelled it stays cancelled.
#[derive(Debug, Clone)]
pub struct LifetimeToken {
    alive: Arc<AtomicBool>,
}

impl LifetimeToken {
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn cancel(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

impl Default for LifetimeToken {
    fn default() -> Self {
        Self::new()
    }
}

struct Completion {
    request: FetchRequest,
    outcome: Result<PageResult, FetchError>,
}

/// Hands a finished fetch back to the controller, unless the token has been
/// cancelled in the meantime. Returns whether anything was sent.
fn deliver(token: &LifetimeToken, sender: &Sender<Completion>, completion: Completion) -> bool {
    if !token.is_alive() {
        debug!(
            key = %completion.request.key,
            page = completion.request.page,
            "Discarding search result after teardown"
        );
        return false;
    }
    sender.send(completion).is_ok()
}

/// Owns the session state and runs fetches on worker threads.
///
/// The view calls the `on_*` handlers for user input and [`poll`] once per
/// frame; completed fetches are only applied inside `poll`.
///
/// [`poll`]: FetchController::poll
pub struct FetchController {
    backend: Arc<dyn SearchBackend>,
    state: SessionState,
    token: LifetimeToken,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
    workers: Vec<Worker>,
}

struct Worker {
    request: FetchRequest,
    handle: thread::JoinHandle<()>,
}

impl FetchController {
    pub fn new(backend: Arc<dyn SearchBackend>, default_term: &str, token: LifetimeToken) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            backend,
            state: SessionState::new(default_term),
            token,
            sender,
            receiver,
            workers: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Kicks off the first fetch for the default term.
    pub fn start(&mut self) {
        let key = self.state.active_key().to_string();
        let (next, request) = self.state.load_initial(&key);
        self.transition(next, request);
    }

    pub fn on_input_change(&mut self, text: &str) {
        self.state = self.state.with_pending_term(text);
    }

    pub fn on_submit(&mut self) {
        let term = self.state.pending_term().to_string();
        let (next, request) = self.state.submit(&term);
        self.transition(next, request);
    }

    pub fn on_dismiss(&mut self, hit_id: &str) {
        self.state = self.state.dismiss(hit_id);
    }

    pub fn on_load_more(&mut self) {
        let (next, request) = self.state.load_more();
        self.transition(next, request);
    }

    /// Applies every fetch that has completed since the last call, in arrival
    /// order. Never blocks. Returns whether the state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(completion) = self.receiver.try_recv() {
            self.apply(completion);
            changed = true;
        }
        changed |= self.reap_workers();
        changed
    }

    /// Like [`poll`](Self::poll), but waits up to `timeout` for the first
    /// completion to arrive.
    pub fn wait_for_completion(&mut self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(completion) => {
                self.apply(completion);
                self.poll();
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Blocks until every spawned fetch has resolved. Delivered results are
    /// not applied until the next [`poll`](Self::poll); a worker that died is
    /// settled as a failure right away.
    pub fn join_workers(&mut self) {
        for worker in std::mem::take(&mut self.workers) {
            let _ = self.join_worker(worker);
        }
    }

    /// Fetches issued but not yet settled into the session state.
    pub fn in_flight(&self) -> usize {
        self.state.pending_fetches()
    }

    /// Tears the session down. Fetches still running will drop their results.
    pub fn shutdown(&mut self) {
        if self.token.is_alive() {
            debug!(in_flight = self.in_flight(), "Shutting down fetch controller");
        }
        self.token.cancel();
    }

    fn transition(&mut self, next: SessionState, request: Option<FetchRequest>) {
        self.state = next;
        if let Some(request) = request {
            self.spawn_fetch(request);
        }
    }

    fn spawn_fetch(&mut self, request: FetchRequest) {
        debug!(key = %request.key, page = request.page, origin = ?request.origin, "Issuing search fetch");

        let backend = Arc::clone(&self.backend);
        let token = self.token.clone();
        let sender = self.sender.clone();

        let job = request.clone();
        let handle = thread::spawn(move || {
            let outcome = backend.search(&job.key, job.page);
            deliver(&token, &sender, Completion { request: job, outcome });
        });

        self.workers.push(Worker { request, handle });
    }

    fn apply(&mut self, completion: Completion) {
        self.state = self.state.settle(&completion.request, completion.outcome);
    }

    fn reap_workers(&mut self) -> bool {
        let (finished, running): (Vec<_>, Vec<_>) =
            self.workers.drain(..).partition(|w| w.handle.is_finished());
        self.workers = running;

        let mut settled = false;
        for worker in finished {
            settled |= self.join_worker(worker);
        }
        settled
    }

    // A worker that panicked never delivered, so its request would stay
    // pending forever. Settle it as a failure unless the session is gone.
    fn join_worker(&mut self, worker: Worker) -> bool {
        let Worker { request, handle } = worker;
        if handle.join().is_ok() || !self.token.is_alive() {
            return false;
        }

        warn!(key = %request.key, page = request.page, "Search worker panicked");
        let failure = FetchError::Network("search worker panicked".to_string());
        self.state = self.state.settle(&request, Err(failure));
        true
    }
}

impl Drop for FetchController {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
