//! Integration tests for tables backed by a remote fetch function.
//!
//! The fetcher below serves a synthetic customer directory, counts calls,
//! and can hold a response back until released, so overlapping requests can
//! be resolved out of order.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::future;
use tabula_lib::column::DialogConfig;
use tabula_lib::cursor::Navigator;
use tabula_lib::dialog::DialogState;
use tabula_lib::error::{ConfigError, FetchError, TableError};
use tabula_lib::model::{Record, Value};
use tabula_lib::source::{FetchRequest, PageResult, RowFetcher, Strategy};
use tabula_lib::{Column, EngineState, Refresh, TableEngine};
use tokio::sync::{Notify, oneshot};

// =============================================================================
// Test fetcher
// =============================================================================

#[derive(Default)]
struct Directory {
    rows: Mutex<Vec<Record>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<FetchRequest>>,
    fail: AtomicBool,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    started: Notify,
}

impl Directory {
    fn with_customers(n: u64) -> Arc<Self> {
        let directory = Self::default();
        *directory.rows.lock().unwrap() = (1..=n)
            .map(|id| {
                Record::new(id)
                    .set("name", format!("Customer {id}"))
                    .set("mail", format!("customer{id}@example.com"))
            })
            .collect();
        Arc::new(directory)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> FetchRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }

    /// Holds the next response until the returned sender fires.
    fn hold_next(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }
}

#[async_trait]
impl RowFetcher for Directory {
    async fn fetch(&self, request: FetchRequest) -> Result<PageResult, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            self.started.notify_one();
            let _ = gate.await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(FetchError::rejected("directory offline"));
        }

        let needle = request
            .filters
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);
        let matching: Vec<Record> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| match &needle {
                Some(needle) => row
                    .get("name")
                    .and_then(Value::as_str)
                    .is_some_and(|name| name.contains(needle.as_str())),
                None => true,
            })
            .cloned()
            .collect();

        let rows = matching
            .iter()
            .skip(request.offset())
            .take(request.page_size)
            .cloned()
            .collect();
        Ok(PageResult::new(rows, matching.len()))
    }
}

fn columns() -> Vec<Column> {
    vec![
        Column::text("name", "Name"),
        Column::text("mail", "Mail"),
        Column::icon("delete", "", "trash").with_dialog(DialogConfig::default()),
    ]
}

async fn engine(directory: &Arc<Directory>, dialog: Arc<DialogState>) -> TableEngine {
    let engine = TableEngine::builder()
        .columns(columns())
        .shared_fetcher(directory.clone())
        .dialog(dialog)
        .filters(["name", "delete"])
        .build()
        .unwrap();
    engine.start().await.unwrap();
    engine
}

fn ids(engine: &TableEngine) -> Vec<String> {
    engine
        .page()
        .unwrap()
        .rows()
        .iter()
        .map(|r| r.id().to_string())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_start_fetches_projected_fields() {
    let directory = Directory::with_customers(25);
    let engine = engine(&directory, Arc::new(DialogState::new())).await;

    assert_eq!(engine.strategy(), Strategy::Remote);
    assert_eq!(engine.state(), EngineState::Ready);
    assert_eq!(directory.calls(), 1);

    let request = directory.last_request();
    assert_eq!(request.page_index, 0);
    assert_eq!(request.page_size, 10);
    assert_eq!(request.fields, vec!["name", "mail"]);
    assert!(request.filters.is_empty());

    assert_eq!(engine.totals().total_rows, 25);
    assert_eq!(engine.totals().total_pages, 2);
    assert_eq!(engine.filter_fields().len(), 1);
    assert_eq!(engine.filter_fields()[0].key, "name");
}

#[tokio::test]
async fn test_navigation_fetches_each_page() {
    let directory = Directory::with_customers(25);
    let engine = engine(&directory, Arc::new(DialogState::new())).await;

    engine.go_last().await.unwrap();
    assert_eq!(directory.last_request().page_index, 2);
    assert_eq!(ids(&engine), vec!["21", "22", "23", "24", "25"]);

    engine.go_next().await.unwrap();
    assert_eq!(directory.calls(), 2);

    engine.go_previous().await.unwrap();
    assert_eq!(directory.calls(), 3);
    assert_eq!(directory.last_request().page_index, 1);
}

#[tokio::test]
async fn test_dialog_confirmation_fetches_once() {
    let directory = Directory::with_customers(25);
    let dialog = Arc::new(DialogState::new());
    let engine = engine(&directory, dialog.clone()).await;
    engine.go_next().await.unwrap();
    assert_eq!(directory.calls(), 2);

    assert!(matches!(engine.poll_dialog().await.unwrap(), Refresh::Skipped));
    assert_eq!(directory.calls(), 2);

    dialog.set_confirmed(true);
    assert!(matches!(engine.poll_dialog().await.unwrap(), Refresh::Published(_)));
    assert_eq!(directory.calls(), 3);
    assert_eq!(directory.last_request().page_index, 1);

    // Still confirmed: no new transition.
    assert!(matches!(engine.poll_dialog().await.unwrap(), Refresh::Skipped));
    assert_eq!(directory.calls(), 3);

    dialog.set_confirmed(false);
    engine.poll_dialog().await.unwrap();
    dialog.set_confirmed(true);
    engine.poll_dialog().await.unwrap();
    assert_eq!(directory.calls(), 4);
}

#[tokio::test]
async fn test_confirmed_trigger_refetches_deleted_row() {
    let directory = Directory::with_customers(11);
    let dialog = Arc::new(DialogState::new());
    let engine = engine(&directory, dialog.clone()).await;
    engine.go_last().await.unwrap();
    assert_eq!(ids(&engine), vec!["11"]);

    let row = engine.page().unwrap().rows()[0].clone();
    engine.activate("delete", &row);
    directory.rows.lock().unwrap().retain(|r| r.id() != row.id());
    dialog.set_confirmed(true);
    dialog.hide();

    // The server no longer has page 1; the index is clamped and the
    // clamped page fetched.
    engine.poll_dialog().await.unwrap();
    assert_eq!(engine.cursor().current(), 0);
    assert_eq!(engine.totals().total_rows, 10);
    assert_eq!(ids(&engine).len(), 10);
    assert_eq!(directory.last_request().page_index, 0);
}

#[tokio::test]
async fn test_clones_share_state() {
    let directory = Directory::with_customers(45);
    let engine = engine(&directory, Arc::new(DialogState::new())).await;

    let clones: Vec<TableEngine> = (0..3).map(|_| engine.clone()).collect();
    let results = future::join_all(clones.iter().map(|e| e.go_next())).await;

    assert!(results.iter().all(|r| matches!(r, Ok(Refresh::Published(_)))));
    assert_eq!(engine.cursor().current(), 3);
    assert_eq!(directory.calls(), 4);
    assert_eq!(ids(&engine).first().map(String::as_str), Some("31"));
}

#[tokio::test]
async fn test_each_filter_set_fetches() {
    let directory = Directory::with_customers(25);
    let engine = engine(&directory, Arc::new(DialogState::new())).await;

    engine.set_filter("name", "Customer 2").await.unwrap();
    engine.set_filter("name", "Customer 2").await.unwrap();
    assert_eq!(directory.calls(), 3);

    let request = directory.last_request();
    assert_eq!(request.filters.get("name"), Some(&Value::from("Customer 2")));
    // "Customer 2" and "Customer 20" through "Customer 25".
    assert_eq!(engine.totals().total_rows, 7);
    assert_eq!(engine.totals().total_pages, 0);
}

#[tokio::test]
async fn test_page_size_change_clamps_and_refetches() {
    let directory = Directory::with_customers(25);
    let engine = engine(&directory, Arc::new(DialogState::new())).await;
    engine.go_last().await.unwrap();
    assert_eq!(directory.calls(), 2);

    let refresh = engine.set_page_size(20).await.unwrap();

    // Page 2 at 20 rows per page is past the end: one fetch for it, one for
    // the clamped page.
    assert_eq!(directory.calls(), 4);
    assert_eq!(directory.last_request().page_index, 1);
    assert_eq!(directory.last_request().page_size, 20);

    let page = refresh.page().unwrap();
    assert_eq!(page.index(), 1);
    assert_eq!(page.rows().len(), 5);
    let footer = page.footer().unwrap();
    assert_eq!((footer.showing_from, footer.showing_to), (21, 25));
}

#[tokio::test]
async fn test_fetch_failure_keeps_stale_page() {
    let directory = Directory::with_customers(25);
    let engine = engine(&directory, Arc::new(DialogState::new())).await;
    let before = engine.page().unwrap();

    directory.fail.store(true, Ordering::SeqCst);
    let err = engine.go_next().await.unwrap_err();
    assert!(err.is_fetch());
    assert!(matches!(err, TableError::Fetch(FetchError::Rejected { .. })));

    assert_eq!(engine.state(), EngineState::Ready);
    assert!(!engine.is_loading());
    assert!(Arc::ptr_eq(&before, &engine.page().unwrap()));

    // The cursor still describes the page on screen.
    assert_eq!(engine.cursor().current(), 0);
    assert_eq!(engine.cursor().previous(), None);
    assert_eq!(
        engine.navigator(),
        Navigator { first: false, previous: false, next: true, last: true }
    );

    // The next trigger tries again, from the page on screen.
    directory.fail.store(false, Ordering::SeqCst);
    engine.go_next().await.unwrap();
    assert_eq!(engine.page().unwrap().index(), 1);
    assert_eq!(engine.cursor().previous(), Some(0));
    assert_eq!(directory.calls(), 3);
}

#[tokio::test]
async fn test_failed_page_size_change_keeps_cursor() {
    let directory = Directory::with_customers(25);
    let engine = engine(&directory, Arc::new(DialogState::new())).await;
    engine.go_last().await.unwrap();

    directory.fail.store(true, Ordering::SeqCst);
    assert!(engine.set_page_size(20).await.unwrap_err().is_fetch());

    let cursor = engine.cursor();
    assert_eq!(cursor.page_size(), 10);
    assert_eq!(cursor.current(), 2);
    assert_eq!(cursor.previous(), Some(0));
    assert_eq!(engine.page().unwrap().page_size(), 10);
    assert_eq!(
        engine.navigator(),
        Navigator { first: true, previous: true, next: false, last: false }
    );
}

#[tokio::test]
async fn test_dropped_fetch_clears_loading() {
    let directory = Directory::with_customers(25);
    let engine = engine(&directory, Arc::new(DialogState::new())).await;

    let _release = directory.hold_next();
    let outcome = tokio::time::timeout(Duration::from_millis(50), engine.go_next()).await;
    assert!(outcome.is_err());

    assert!(!engine.is_loading());
    assert_eq!(engine.cursor().current(), 0);
    assert_eq!(engine.page().unwrap().index(), 0);

    engine.go_next().await.unwrap();
    assert!(!engine.is_loading());
    assert_eq!(engine.page().unwrap().index(), 1);
    assert_eq!(directory.calls(), 3);
}

#[tokio::test]
async fn test_initial_failure_stays_uninitialized() {
    let directory = Directory::with_customers(25);
    directory.fail.store(true, Ordering::SeqCst);
    let engine = TableEngine::builder()
        .columns(columns())
        .shared_fetcher(directory.clone())
        .build()
        .unwrap();

    assert!(engine.start().await.is_err());
    assert_eq!(engine.state(), EngineState::Uninitialized);
    assert!(engine.page().is_none());
    assert!(engine.is_loading());
}

#[tokio::test]
async fn test_stale_response_discarded() {
    let directory = Directory::with_customers(25);
    let engine = engine(&directory, Arc::new(DialogState::new())).await;

    let release = directory.hold_next();
    let pending = tokio::spawn({
        let engine = engine.clone();
        async move { engine.go_next().await }
    });
    directory.started.notified().await;

    // Previous page stays visible while the fetch is outstanding.
    assert!(engine.is_loading());
    assert_eq!(engine.page().unwrap().index(), 0);

    // A newer trigger resolves first.
    engine.set_filter("name", "Customer 1").await.unwrap();
    let newest = engine.page().unwrap();

    release.send(()).unwrap();
    let outcome = pending.await.unwrap().unwrap();
    assert!(matches!(outcome, Refresh::Stale));

    assert!(Arc::ptr_eq(&newest, &engine.page().unwrap()));
    assert!(!engine.is_loading());
    // "Customer 1" and "Customer 10" through "Customer 19", page 1.
    assert_eq!(engine.totals().total_rows, 11);
    assert_eq!(ids(&engine), vec!["19"]);
}

#[tokio::test]
async fn test_local_rows_rejected_on_remote_table() {
    let directory = Directory::with_customers(5);
    let engine = engine(&directory, Arc::new(DialogState::new())).await;
    let err = engine.set_rows(Vec::new()).await.unwrap_err();
    assert!(matches!(err, TableError::Config(ConfigError::ConflictingDataSource)));
    assert_eq!(directory.calls(), 1);
}

#[test]
fn test_both_sources_rejected() {
    let err = TableEngine::builder()
        .columns(columns())
        .rows(Vec::new())
        .shared_fetcher(Directory::with_customers(1))
        .build()
        .unwrap_err();
    assert_eq!(err, ConfigError::ConflictingDataSource);
}
