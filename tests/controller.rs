use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hn_search::{
    CacheEntry, FetchController, FetchError, Hit, LifetimeToken, PageResult, Projection, SearchBackend,
};
use pretty_assertions::assert_eq;

const WAIT: Duration = Duration::from_secs(5);

fn hit(id: &str) -> Hit {
    Hit {
        id: id.to_string(),
        title: format!("Story {id}"),
        url: format!("https://example.com/{id}"),
        author: "pg".to_string(),
        comment_count: 7,
        score: 42,
    }
}

/// Serves canned pages and counts calls. With a gate, every call blocks until
/// the test releases it.
#[derive(Default)]
struct ScriptedBackend {
    calls: AtomicUsize,
    pages: Mutex<HashMap<(String, u32), Result<Vec<Hit>, FetchError>>>,
    gate: Option<Mutex<Receiver<()>>>,
}

impl ScriptedBackend {
    fn new() -> Self {
        Self::default()
    }

    fn gated() -> (Self, Sender<()>) {
        let (release, gate) = mpsc::channel();
        let backend = Self {
            gate: Some(Mutex::new(gate)),
            ..Self::default()
        };
        (backend, release)
    }

    fn respond(self, key: &str, page: u32, hits: Vec<Hit>) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert((key.to_string(), page), Ok(hits));
        self
    }

    fn fail(self, key: &str, page: u32, error: FetchError) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert((key.to_string(), page), Err(error));
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SearchBackend for ScriptedBackend {
    fn search(&self, key: &str, page: u32) -> Result<PageResult, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.lock().unwrap().recv().unwrap();
        }

        let scripted = self
            .pages
            .lock()
            .unwrap()
            .get(&(key.to_string(), page))
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()));

        scripted.map(|hits| PageResult {
            key: key.to_string(),
            hits,
            page,
        })
    }
}

fn controller(backend: Arc<ScriptedBackend>, term: &str) -> FetchController {
    FetchController::new(backend, term, LifetimeToken::new())
}

#[test]
fn end_to_end_search_page_and_dismiss() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .respond("redux", 0, vec![hit("h1"), hit("h2")])
            .respond("redux", 1, vec![hit("h3")]),
    );
    let mut controller = controller(backend.clone(), "redux");

    controller.start();
    assert!(controller.state().is_loading());
    assert!(controller.wait_for_completion(WAIT));
    assert!(!controller.state().is_loading());
    assert_eq!(
        controller.state().cache().get("redux"),
        Some(&CacheEntry {
            hits: vec![hit("h1"), hit("h2")],
            page: 0
        })
    );

    controller.on_load_more();
    assert!(controller.wait_for_completion(WAIT));
    assert_eq!(
        controller.state().cache().get("redux"),
        Some(&CacheEntry {
            hits: vec![hit("h1"), hit("h2"), hit("h3")],
            page: 1
        })
    );

    controller.on_dismiss("h2");
    assert_eq!(
        controller.state().project(),
        Projection {
            hits: &[hit("h1"), hit("h3")],
            page: 1
        }
    );
    assert_eq!(backend.calls(), 2);
}

#[test]
fn submitting_a_seen_term_does_not_fetch() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .respond("redux", 0, vec![hit("r1")])
            .respond("rust", 0, vec![hit("s1")]),
    );
    let mut controller = controller(backend.clone(), "redux");
    controller.start();
    assert!(controller.wait_for_completion(WAIT));

    controller.on_input_change("rust");
    assert_eq!(controller.state().active_key(), "redux");
    controller.on_submit();
    assert!(controller.wait_for_completion(WAIT));
    assert_eq!(backend.calls(), 2);
    assert_eq!(controller.state().project().hits, &[hit("s1")]);

    controller.on_input_change("redux");
    controller.on_submit();
    assert!(!controller.state().is_loading());
    assert_eq!(controller.in_flight(), 0);
    assert_eq!(backend.calls(), 2);
    assert_eq!(controller.state().project().hits, &[hit("r1")]);
}

#[test]
fn empty_results_are_cached_too() {
    let backend = Arc::new(ScriptedBackend::new());
    let mut controller = controller(backend.clone(), "nothing-matches");
    controller.start();
    assert!(controller.wait_for_completion(WAIT));

    controller.on_submit();
    assert_eq!(backend.calls(), 1);
    assert_eq!(controller.state().project(), Projection { hits: &[], page: 0 });
}

#[test]
fn result_arriving_after_shutdown_is_discarded() {
    let (backend, release) = ScriptedBackend::gated();
    let backend = Arc::new(backend.respond("redux", 0, vec![hit("h1")]));
    let mut controller = controller(backend.clone(), "redux");

    controller.start();
    let before = controller.state().clone();

    controller.shutdown();
    release.send(()).unwrap();
    controller.join_workers();

    assert!(!controller.poll());
    assert_eq!(controller.state(), &before);
    assert!(controller.state().cache().is_empty());
    assert_eq!(backend.calls(), 1);
}

#[test]
fn dropping_the_controller_cancels_its_token() {
    let token = LifetimeToken::new();
    let controller = FetchController::new(Arc::new(ScriptedBackend::new()), "redux", token.clone());
    assert!(token.is_alive());
    drop(controller);
    assert!(!token.is_alive());
}

#[test]
fn failure_is_reported_only_against_its_own_term() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .respond("redux", 0, vec![hit("r1")])
            .fail("rust", 0, FetchError::Status {
                status: 503,
                body: "unavailable".to_string(),
            }),
    );
    let mut controller = controller(backend.clone(), "redux");
    controller.start();
    assert!(controller.wait_for_completion(WAIT));
    let cache_before = controller.state().cache().clone();

    controller.on_input_change("rust");
    controller.on_submit();
    assert!(controller.wait_for_completion(WAIT));

    assert!(!controller.state().is_loading());
    assert_eq!(controller.state().cache(), &cache_before);
    assert!(matches!(
        controller.state().visible_error(),
        Some(FetchError::Status { status: 503, .. })
    ));

    controller.on_input_change("redux");
    controller.on_submit();
    assert!(controller.state().visible_error().is_none());
    assert_eq!(controller.state().project().hits, &[hit("r1")]);
}

#[test]
fn resubmitting_a_failed_term_retries() {
    let backend = Arc::new(ScriptedBackend::new().fail(
        "redux",
        0,
        FetchError::Network("connection refused".to_string()),
    ));
    let mut controller = controller(backend.clone(), "redux");
    controller.start();
    assert!(controller.wait_for_completion(WAIT));
    assert!(controller.state().visible_error().is_some());

    controller.on_submit();
    assert!(controller.state().is_loading());
    assert!(controller.wait_for_completion(WAIT));
    assert_eq!(backend.calls(), 2);
}

#[test]
fn load_more_and_dismiss_without_results_do_nothing() {
    let backend = Arc::new(ScriptedBackend::new());
    let mut controller = controller(backend.clone(), "redux");

    let before = controller.state().clone();
    controller.on_load_more();
    controller.on_dismiss("h1");

    assert_eq!(controller.state(), &before);
    assert_eq!(controller.in_flight(), 0);
    assert_eq!(backend.calls(), 0);
}

#[test]
fn only_one_load_more_at_a_time() {
    let (backend, release) = ScriptedBackend::gated();
    let backend = Arc::new(
        backend
            .respond("redux", 0, vec![hit("h1")])
            .respond("redux", 1, vec![hit("h2")]),
    );
    let mut controller = controller(backend.clone(), "redux");

    controller.start();
    release.send(()).unwrap();
    assert!(controller.wait_for_completion(WAIT));

    controller.on_load_more();
    controller.on_load_more();
    assert!(controller.state().is_loading_more());

    release.send(()).unwrap();
    assert!(controller.wait_for_completion(WAIT));
    assert_eq!(backend.calls(), 2);

    let entry = controller.state().cache().get("redux").unwrap();
    assert_eq!(entry.hits, vec![hit("h1"), hit("h2")]);
    assert_eq!(entry.page, 1);
}

/// Panics on every call, like a backend hitting a bug mid-request.
#[derive(Default)]
struct PanickingBackend {
    calls: AtomicUsize,
}

impl SearchBackend for PanickingBackend {
    fn search(&self, key: &str, page: u32) -> Result<PageResult, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("backend blew up on {key} page {page}");
    }
}

#[test]
fn panicking_worker_settles_as_a_failure() {
    let backend = Arc::new(PanickingBackend::default());
    let mut controller = FetchController::new(backend.clone(), "redux", LifetimeToken::new());

    controller.start();
    assert_eq!(controller.in_flight(), 1);
    controller.join_workers();
    controller.poll();

    assert!(!controller.state().is_loading());
    assert_eq!(controller.in_flight(), 0);
    assert!(matches!(
        controller.state().visible_error(),
        Some(FetchError::Network(_))
    ));
    assert!(controller.state().cache().is_empty());

    controller.on_submit();
    assert_eq!(controller.in_flight(), 1);
    controller.join_workers();
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    assert!(!controller.state().is_loading());
}

#[test]
fn panicking_worker_after_shutdown_changes_nothing() {
    let mut controller =
        FetchController::new(Arc::new(PanickingBackend::default()), "redux", LifetimeToken::new());

    controller.start();
    let before = controller.state().clone();
    controller.shutdown();
    controller.join_workers();

    assert!(!controller.poll());
    assert_eq!(controller.state(), &before);
}

#[test]
fn in_flight_counts_unsettled_requests() {
    let (backend, release) = ScriptedBackend::gated();
    let backend = Arc::new(
        backend
            .respond("redux", 0, vec![hit("r1")])
            .respond("rust", 0, vec![hit("s1")]),
    );
    let mut controller = controller(backend.clone(), "redux");

    controller.start();
    controller.on_input_change("rust");
    controller.on_submit();
    assert_eq!(controller.in_flight(), 2);

    release.send(()).unwrap();
    release.send(()).unwrap();
    assert!(controller.wait_for_completion(WAIT));
    if controller.in_flight() > 0 {
        assert!(controller.wait_for_completion(WAIT));
    }
    assert_eq!(controller.in_flight(), 0);
    assert!(!controller.state().is_loading());
}
