//! Data sourcing strategies.
//!
//! A table gets its rows from exactly one [`DataSource`], chosen when the
//! engine is built:
//!
//! - [`LocalSlicer`] pages through an in-memory dataset.
//! - [`RemoteFetcher`] asks an injected [`RowFetcher`] for each page.

mod local;
mod remote;

pub use local::*;
pub use remote::*;

use serde::Deserialize;
use serde::Serialize;

use crate::cursor::PageCursor;
use crate::error::FetchError;
use crate::filter::Filters;
use crate::model::Record;

/// Rows of one page plus the total row count across all pages.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageResult {
    /// Rows of the requested page.
    pub rows: Vec<Record>,
    /// Number of rows across all pages.
    pub total_rows: usize,
}

impl PageResult {
    /// Creates a page result.
    pub fn new(rows: Vec<Record>, total_rows: usize) -> Self {
        Self { rows, total_rows }
    }
}

/// Which strategy a table uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Local,
    Remote,
}

/// The active data source of a table.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// In-memory dataset.
    Local(LocalSlicer),
    /// Remote fetch function.
    Remote(RemoteFetcher),
}

impl DataSource {
    /// Returns the strategy of this source.
    pub fn strategy(&self) -> Strategy {
        match self {
            Self::Local(_) => Strategy::Local,
            Self::Remote(_) => Strategy::Remote,
        }
    }

    /// Resolves the page the cursor points at.
    ///
    /// Local sources ignore `filters` and never fail.
    pub async fn resolve_page(
        &self,
        cursor: &PageCursor,
        filters: &Filters,
    ) -> Result<PageResult, FetchError> {
        match self {
            Self::Local(slicer) => Ok(slicer.slice(cursor.current(), cursor.page_size())),
            Self::Remote(fetcher) => fetcher.fetch(fetcher.request(cursor, filters)).await,
        }
    }
}
