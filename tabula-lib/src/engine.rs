//! Table engine.
//!
//! [`TableEngine`] reconciles a column schema, a data source, the filter
//! values and the page cursor into the [`Page`] currently shown. It is driven
//! by [`Trigger`]s. Each trigger updates the relevant state, then re-runs
//! the recompute routine:
//!
//! 1. resolve the page through the data source chosen at build time,
//! 2. derive the totals,
//! 3. clamp the page index to the last page,
//! 4. publish a new page.
//!
//! Every recompute carries a generation number. A remote response that
//! resolves after a newer recompute has started is discarded.
//!
//! A fetch that fails, or whose future is dropped, leaves the last published
//! page in place and moves the cursor back to it.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use log::debug;
use log::error;
use log::info;
use tokio::sync::watch;

use crate::column::Activation;
use crate::column::Column;
use crate::column::ColumnSchema;
use crate::config::TableConfig;
use crate::cursor::Navigator;
use crate::cursor::PageCursor;
use crate::cursor::Totals;
use crate::dialog::DialogBridge;
use crate::dialog::DialogState;
use crate::error::ConfigError;
use crate::error::TableError;
use crate::filter::FilterField;
use crate::filter::FilterStore;
use crate::filter::Filters;
use crate::filter::filter_fields;
use crate::model::Record;
use crate::model::Value;
use crate::page::Cell;
use crate::page::Footer;
use crate::page::Page;
use crate::page::row_cells;
use crate::source::DataSource;
use crate::source::LocalSlicer;
use crate::source::RemoteFetcher;
use crate::source::RowFetcher;
use crate::source::Strategy;

// =============================================================================
// Triggers and outcomes
// =============================================================================

/// Paginator buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    First,
    Previous,
    Next,
    Last,
}

/// An event that re-enters the recompute routine.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// A page size was submitted.
    PageSizeChanged(usize),
    /// A paginator button was pressed.
    PageIndexChanged(Navigation),
    /// A filter value was set.
    FiltersChanged { name: String, value: Value },
    /// The dataset changed.
    ///
    /// `Some(rows)` replaces a local dataset. `None` signals that the data
    /// behind the source changed and the current page must be resolved again.
    DatasetChanged(Option<Vec<Record>>),
    /// The dialog bridge reported a confirmation.
    DialogConfirmed,
}

impl Trigger {
    fn name(&self) -> &'static str {
        match self {
            Self::PageSizeChanged(_) => "page_size_changed",
            Self::PageIndexChanged(_) => "page_index_changed",
            Self::FiltersChanged { .. } => "filters_changed",
            Self::DatasetChanged(_) => "dataset_changed",
            Self::DialogConfirmed => "dialog_confirmed",
        }
    }
}

/// Result of handling a trigger.
#[derive(Debug, Clone)]
pub enum Refresh {
    /// A new page was published.
    Published(Arc<Page>),
    /// The response was superseded by a newer recompute and dropped.
    Stale,
    /// Nothing to recompute: the page index did not move, the dialog was not
    /// newly confirmed, or the trigger does not apply to this source.
    Skipped,
}

impl Refresh {
    /// Returns the published page, if any.
    pub fn page(&self) -> Option<&Arc<Page>> {
        match self {
            Self::Published(page) => Some(page),
            _ => None,
        }
    }
}

/// Lifecycle of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Built, no page published yet.
    Uninitialized,
    /// At least one page has been published.
    Ready,
}

// =============================================================================
// Engine
// =============================================================================

struct EngineShared {
    state: EngineState,
    source: DataSource,
    cursor: PageCursor,
    /// Cursor as of the last publish; restored when a fetch fails or is
    /// dropped.
    committed: PageCursor,
    filters: FilterStore,
    totals: Totals,
    page: Option<Arc<Page>>,
    generation: u64,
    in_flight: usize,
    last_confirmed: bool,
}

struct EngineInner {
    schema: ColumnSchema,
    config: TableConfig,
    filter_fields: Vec<FilterField>,
    dialog: Arc<dyn DialogBridge>,
    strategy: Strategy,
    shared: Mutex<EngineShared>,
    pages: watch::Sender<Option<Arc<Page>>>,
}

/// Paginated table engine.
///
/// Cheap to clone; clones share the same state. Reads never wait for an
/// outstanding fetch: while one is pending the previous page stays visible.
///
/// # Example
///
/// ```
/// use tabula_lib::{Column, TableEngine};
/// use tabula_lib::model::Record;
///
/// # tokio_test_block(async {
/// let rows = (1..=23u64).map(|id| Record::new(id).set("name", format!("Row {id}"))).collect();
/// let engine = TableEngine::builder()
///     .columns(vec![Column::text("name", "Name")])
///     .rows(rows)
///     .build()
///     .unwrap();
///
/// engine.start().await.unwrap();
/// engine.go_last().await.unwrap();
///
/// let footer = engine.footer().unwrap();
/// assert_eq!((footer.showing_from, footer.showing_to), (21, 23));
/// # });
/// # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct TableEngine {
    inner: Arc<EngineInner>,
}

impl TableEngine {
    /// Creates a new builder.
    pub fn builder() -> TableEngineBuilder {
        TableEngineBuilder::new()
    }

    fn lock(&self) -> MutexGuard<'_, EngineShared> {
        self.inner
            .shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Triggers
    // -------------------------------------------------------------------------

    /// Publishes the first page.
    pub async fn start(&self) -> Result<Refresh, TableError> {
        self.recompute("start").await
    }

    /// Applies a trigger and recomputes the page.
    pub async fn dispatch(&self, trigger: Trigger) -> Result<Refresh, TableError> {
        let name = trigger.name();
        {
            let mut shared = self.lock();
            match trigger {
                Trigger::PageSizeChanged(size) => {
                    let size = self.inner.config.validate_page_size(size)?;
                    info!("Page size set to {}", size);
                    shared.cursor.set_page_size(size);
                }
                Trigger::PageIndexChanged(navigation) => {
                    let total_pages = shared.totals.total_pages;
                    let moved = match navigation {
                        Navigation::First => shared.cursor.go_first(),
                        Navigation::Previous => shared.cursor.go_previous(),
                        Navigation::Next => shared.cursor.go_next(total_pages),
                        Navigation::Last => shared.cursor.go_last(total_pages),
                    };
                    if !moved {
                        debug!("{:?} at page {}: index unchanged", navigation, shared.cursor.current());
                        if shared.in_flight == 0 {
                            shared.committed = shared.cursor.clone();
                        }
                        return Ok(Refresh::Skipped);
                    }
                }
                Trigger::FiltersChanged { name, value } => {
                    if self.inner.strategy == Strategy::Local {
                        debug!("Filter '{}' set on a local table; rows are not filtered", name);
                    }
                    let revision = shared.filters.set(name.clone(), value);
                    debug!("Filter '{}' set, revision {}", name, revision);
                }
                Trigger::DatasetChanged(Some(rows)) => match &mut shared.source {
                    DataSource::Local(slicer) => slicer.replace(rows),
                    DataSource::Remote(_) => {
                        return Err(ConfigError::ConflictingDataSource.into());
                    }
                },
                Trigger::DatasetChanged(None) => {}
                Trigger::DialogConfirmed => {
                    if self.inner.strategy == Strategy::Local {
                        debug!("Dialog confirmed on a local table; nothing to re-fetch");
                        return Ok(Refresh::Skipped);
                    }
                }
            }
        }
        self.recompute(name).await
    }

    /// Moves to the first page.
    pub async fn go_first(&self) -> Result<Refresh, TableError> {
        self.dispatch(Trigger::PageIndexChanged(Navigation::First)).await
    }

    /// Moves to the previous page.
    pub async fn go_previous(&self) -> Result<Refresh, TableError> {
        self.dispatch(Trigger::PageIndexChanged(Navigation::Previous)).await
    }

    /// Moves to the next page.
    pub async fn go_next(&self) -> Result<Refresh, TableError> {
        self.dispatch(Trigger::PageIndexChanged(Navigation::Next)).await
    }

    /// Moves to the last page.
    pub async fn go_last(&self) -> Result<Refresh, TableError> {
        self.dispatch(Trigger::PageIndexChanged(Navigation::Last)).await
    }

    /// Submits a page size. Recomputes even if the size is unchanged.
    pub async fn set_page_size(&self, size: usize) -> Result<Refresh, TableError> {
        self.dispatch(Trigger::PageSizeChanged(size)).await
    }

    /// Sets a filter value. Recomputes on every call.
    pub async fn set_filter(
        &self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Refresh, TableError> {
        self.dispatch(Trigger::FiltersChanged {
            name: name.into(),
            value: value.into(),
        })
        .await
    }

    /// Replaces the local dataset.
    ///
    /// Fails with [`ConfigError::ConflictingDataSource`] on a remote table.
    pub async fn set_rows(&self, rows: Vec<Record>) -> Result<Refresh, TableError> {
        self.dispatch(Trigger::DatasetChanged(Some(rows))).await
    }

    /// Resolves the current page again.
    pub async fn refresh(&self) -> Result<Refresh, TableError> {
        self.dispatch(Trigger::DatasetChanged(None)).await
    }

    /// Checks the dialog bridge and re-fetches on a new confirmation.
    ///
    /// Only a change from unconfirmed to confirmed counts; polling again
    /// while the bridge stays confirmed does nothing.
    pub async fn poll_dialog(&self) -> Result<Refresh, TableError> {
        let confirmed = self.inner.dialog.confirmed();
        let rising = {
            let mut shared = self.lock();
            let rising = confirmed && !shared.last_confirmed;
            shared.last_confirmed = confirmed;
            rising
        };
        if !rising {
            return Ok(Refresh::Skipped);
        }
        self.dispatch(Trigger::DialogConfirmed).await
    }

    // -------------------------------------------------------------------------
    // Recompute
    // -------------------------------------------------------------------------

    async fn recompute(&self, trigger: &'static str) -> Result<Refresh, TableError> {
        let (refresh, clamped) = self.resolve_and_publish(trigger).await?;
        if clamped && self.inner.strategy == Strategy::Remote {
            // The rows on screen belong to the unclamped index.
            let (refresh, _) = self.resolve_and_publish("page_index_clamped").await?;
            return Ok(refresh);
        }
        Ok(refresh)
    }

    async fn resolve_and_publish(&self, trigger: &'static str) -> Result<(Refresh, bool), TableError> {
        let (generation, source, cursor, filters) = {
            let mut shared = self.lock();
            shared.generation += 1;
            shared.in_flight += 1;
            (
                shared.generation,
                shared.source.clone(),
                shared.cursor.clone(),
                shared.filters.values().clone(),
            )
        };

        debug!(
            "Recompute: trigger={} generation={} strategy={:?} page={} size={}",
            trigger,
            generation,
            self.inner.strategy,
            cursor.current(),
            cursor.page_size()
        );

        let pending = PendingFetch::new(&self.inner.shared, generation);
        let result = source.resolve_page(&cursor, &filters).await;
        pending.finish(result.is_ok());

        let mut shared = self.lock();

        if generation != shared.generation {
            debug!(
                "Discarding response for generation {} (latest {})",
                generation, shared.generation
            );
            return Ok((Refresh::Stale, false));
        }

        let result = match result {
            Ok(result) => result,
            Err(err) => {
                error!(
                    "Fetch for page {} failed, keeping page {}: {}",
                    cursor.current(),
                    shared.cursor.current(),
                    err
                );
                return Err(err.into());
            }
        };

        let totals = Totals::new(result.total_rows, cursor.page_size());
        let clamped = shared.cursor.clamp(totals.total_pages);
        if clamped {
            debug!("Page index clamped to {}", shared.cursor.current());
        }
        shared.totals = totals;
        shared.committed = shared.cursor.clone();

        let page = Arc::new(Page::new(
            result.rows,
            totals,
            shared.cursor.current(),
            cursor.page_size(),
        ));
        shared.page = Some(page.clone());
        if shared.state == EngineState::Uninitialized {
            shared.state = EngineState::Ready;
            info!(
                "Table ready: {} rows, {} columns, {:?} source",
                totals.total_rows,
                self.inner.schema.len(),
                self.inner.strategy
            );
        }
        self.inner.pages.send_replace(Some(page.clone()));

        Ok((Refresh::Published(page), clamped))
    }

    // -------------------------------------------------------------------------
    // View projection
    // -------------------------------------------------------------------------

    /// Lifecycle state.
    pub fn state(&self) -> EngineState {
        self.lock().state
    }

    /// Strategy chosen at build time.
    pub fn strategy(&self) -> Strategy {
        self.inner.strategy
    }

    /// The current page, `None` before the first publish.
    pub fn page(&self) -> Option<Arc<Page>> {
        self.lock().page.clone()
    }

    /// Subscribes to published pages.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Page>>> {
        self.inner.pages.subscribe()
    }

    /// `true` before the first publish and while a recompute is pending.
    pub fn is_loading(&self) -> bool {
        let shared = self.lock();
        shared.page.is_none() || shared.in_flight > 0
    }

    /// `true` when there are no rows to show.
    pub fn is_empty(&self) -> bool {
        self.lock().page.as_ref().is_none_or(|page| page.is_empty())
    }

    /// Footer counters, `None` when empty.
    pub fn footer(&self) -> Option<Footer> {
        self.lock().page.as_ref().and_then(|page| page.footer())
    }

    /// Navigation affordances, matching the current page.
    pub fn navigator(&self) -> Navigator {
        let shared = self.lock();
        shared.cursor.navigator(shared.totals.total_pages)
    }

    /// Snapshot of the cursor.
    pub fn cursor(&self) -> PageCursor {
        self.lock().cursor.clone()
    }

    /// Totals of the last published page.
    pub fn totals(&self) -> Totals {
        self.lock().totals
    }

    /// Value of a filter.
    pub fn filter(&self, name: &str) -> Option<Value> {
        self.lock().filters.get(name).cloned()
    }

    /// All filter values.
    pub fn filters(&self) -> Filters {
        self.lock().filters.values().clone()
    }

    /// Filter inputs declared for this table.
    pub fn filter_fields(&self) -> &[FilterField] {
        &self.inner.filter_fields
    }

    /// The column schema.
    pub fn schema(&self) -> &ColumnSchema {
        &self.inner.schema
    }

    /// The configuration.
    pub fn config(&self) -> &TableConfig {
        &self.inner.config
    }

    /// Cells of a row.
    pub fn cells(&self, row: &Record) -> Vec<Cell> {
        row_cells(&self.inner.schema, row)
    }

    /// Activates the icon of `column` on `row`.
    ///
    /// Unknown columns are inert.
    pub fn activate(&self, column: &str, row: &Record) -> Activation {
        match self.inner.schema.find(column) {
            Some(column) => column.activate(row, self.inner.dialog.as_ref()),
            None => {
                debug!("Activation on unknown column '{}'", column);
                Activation::Inert
            }
        }
    }

    /// Finds a column by key.
    pub fn column(&self, key: &str) -> Option<&Column> {
        self.inner.schema.find(key)
    }
}

/// Accounts for one outstanding resolve.
///
/// Dropping it without [`finish`](Self::finish)(`true`) means the resolve
/// failed or its future was dropped. If no newer recompute started since,
/// the cursor goes back to its last published position.
struct PendingFetch<'a> {
    shared: &'a Mutex<EngineShared>,
    generation: u64,
    succeeded: bool,
}

impl<'a> PendingFetch<'a> {
    fn new(shared: &'a Mutex<EngineShared>, generation: u64) -> Self {
        Self {
            shared,
            generation,
            succeeded: false,
        }
    }

    fn finish(mut self, succeeded: bool) {
        self.succeeded = succeeded;
    }
}

impl Drop for PendingFetch<'_> {
    fn drop(&mut self) {
        let mut shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        shared.in_flight = shared.in_flight.saturating_sub(1);
        if !self.succeeded && shared.generation == self.generation {
            shared.cursor = shared.committed.clone();
            debug!(
                "Generation {} did not resolve; cursor restored to page {}",
                self.generation,
                shared.cursor.current()
            );
        }
    }
}

impl std::fmt::Debug for TableEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.lock();
        f.debug_struct("TableEngine")
            .field("state", &shared.state)
            .field("strategy", &self.inner.strategy)
            .field("cursor", &shared.cursor)
            .field("totals", &shared.totals)
            .field("generation", &shared.generation)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for a [`TableEngine`].
///
/// Columns are required, and exactly one of [`rows`](Self::rows) or
/// [`fetcher`](Self::fetcher) must be given.
#[derive(Default)]
pub struct TableEngineBuilder {
    columns: Option<Vec<Column>>,
    rows: Option<Vec<Record>>,
    fetcher: Option<Arc<dyn RowFetcher>>,
    dialog: Option<Arc<dyn DialogBridge>>,
    config: TableConfig,
    filters: Vec<String>,
}

impl TableEngineBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the column schema.
    pub fn columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Uses an in-memory dataset.
    pub fn rows(mut self, rows: Vec<Record>) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Uses a remote fetch function.
    pub fn fetcher(mut self, fetcher: impl RowFetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Uses a shared remote fetch function.
    pub fn shared_fetcher(mut self, fetcher: Arc<dyn RowFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Sets the dialog bridge. Defaults to a private [`DialogState`].
    pub fn dialog(mut self, dialog: Arc<dyn DialogBridge>) -> Self {
        self.dialog = Some(dialog);
        self
    }

    /// Sets the configuration.
    pub fn config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Declares the filter names offered to the user.
    pub fn filters<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.filters = names.into_iter().map(Into::into).collect();
        self
    }

    /// Validates the configuration and builds the engine.
    ///
    /// Registers every column dialog with the bridge. No page is resolved
    /// until [`TableEngine::start`].
    pub fn build(self) -> Result<TableEngine, ConfigError> {
        let schema = ColumnSchema::new(self.columns.ok_or(ConfigError::MissingColumns)?)?;
        let page_size = self.config.validate_page_size(self.config.page_size)?;

        let source = match (self.rows, self.fetcher) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingDataSource),
            (None, None) => return Err(ConfigError::MissingDataSource),
            (Some(rows), None) => DataSource::Local(LocalSlicer::new(rows)),
            (None, Some(fetcher)) => DataSource::Remote(RemoteFetcher::new(fetcher, &schema)),
        };
        let strategy = source.strategy();
        debug!("Building table with {:?} source", strategy);

        let dialog = self
            .dialog
            .unwrap_or_else(|| Arc::new(DialogState::new()) as Arc<dyn DialogBridge>);
        for config in schema.dialog_configs() {
            dialog.configure(config);
        }

        let filter_fields = filter_fields(&schema, &self.filters);
        let (pages, _) = watch::channel(None);

        Ok(TableEngine {
            inner: Arc::new(EngineInner {
                schema,
                filter_fields,
                dialog,
                strategy,
                shared: Mutex::new(EngineShared {
                    state: EngineState::Uninitialized,
                    source,
                    cursor: PageCursor::new(page_size),
                    committed: PageCursor::new(page_size),
                    filters: FilterStore::new(),
                    totals: Totals::default(),
                    page: None,
                    generation: 0,
                    in_flight: 0,
                    last_confirmed: false,
                }),
                config: self.config,
                pages,
            }),
        })
    }
}
