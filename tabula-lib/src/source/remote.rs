//! Remote pagination through an injected fetch function

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use log::warn;
use serde::Serialize;

use super::PageResult;
use crate::column::ColumnSchema;
use crate::cursor::PageCursor;
use crate::error::FetchError;
use crate::filter::Filters;

/// Arguments passed to a [`RowFetcher`] for one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchRequest {
    /// Zero-based page index.
    pub page_index: usize,
    /// Rows per page.
    pub page_size: usize,
    /// Column keys to project; icon columns are never included.
    pub fields: Vec<String>,
    /// Current filter values, passed through untouched.
    pub filters: Filters,
}

impl FetchRequest {
    /// Zero-based offset of the first requested row.
    pub fn offset(&self) -> usize {
        self.page_index * self.page_size
    }
}

/// Asynchronous function returning one page of rows plus the total count.
///
/// The transport behind it is up to the implementor.
///
/// # Example
///
/// ```ignore
/// struct CustomersApi { client: reqwest::Client }
///
/// #[async_trait]
/// impl RowFetcher for CustomersApi {
///     async fn fetch(&self, request: FetchRequest) -> Result<PageResult, FetchError> {
///         self.client
///             .post("https://example.com/customers/page")
///             .json(&request)
///             .send()
///             .await
///             .map_err(FetchError::transport)?
///             .json()
///             .await
///             .map_err(FetchError::transport)
///     }
/// }
/// ```
#[async_trait]
pub trait RowFetcher: Send + Sync {
    /// Fetches the page described by `request`.
    async fn fetch(&self, request: FetchRequest) -> Result<PageResult, FetchError>;
}

/// [`RowFetcher`] backed by an async closure. See [`fetch_fn`].
pub struct FnFetcher<F> {
    f: F,
}

/// Wraps an async closure as a [`RowFetcher`].
///
/// ```
/// use tabula_lib::source::{fetch_fn, FetchRequest, PageResult};
///
/// let fetcher = fetch_fn(|request: FetchRequest| async move {
///     Ok::<_, tabula_lib::error::FetchError>(PageResult::new(Vec::new(), request.page_size))
/// });
/// # let _ = fetcher;
/// ```
pub fn fetch_fn<F, Fut>(f: F) -> FnFetcher<F>
where
    F: Fn(FetchRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<PageResult, FetchError>> + Send + 'static,
{
    FnFetcher { f }
}

#[async_trait]
impl<F, Fut> RowFetcher for FnFetcher<F>
where
    F: Fn(FetchRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<PageResult, FetchError>> + Send + 'static,
{
    async fn fetch(&self, request: FetchRequest) -> Result<PageResult, FetchError> {
        (self.f)(request).await
    }
}

/// Delegates each page to a [`RowFetcher`].
///
/// The projected fields are computed once from the column schema.
#[derive(Clone)]
pub struct RemoteFetcher {
    fetcher: Arc<dyn RowFetcher>,
    fields: Vec<String>,
}

impl RemoteFetcher {
    /// Creates a remote source projecting the non-icon columns of `schema`.
    pub fn new(fetcher: Arc<dyn RowFetcher>, schema: &ColumnSchema) -> Self {
        Self {
            fetcher,
            fields: schema.projected_fields(),
        }
    }

    /// Returns the projected fields.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Builds the request for the cursor's current page.
    pub fn request(&self, cursor: &PageCursor, filters: &Filters) -> FetchRequest {
        FetchRequest {
            page_index: cursor.current(),
            page_size: cursor.page_size(),
            fields: self.fields.clone(),
            filters: filters.clone(),
        }
    }

    /// Calls the fetch function.
    ///
    /// A response with more rows than the page size is kept as is, with a
    /// warning. A response with more rows than its own total is rejected.
    pub async fn fetch(&self, request: FetchRequest) -> Result<PageResult, FetchError> {
        let page_index = request.page_index;
        let page_size = request.page_size;
        let result = self.fetcher.fetch(request).await?;
        if result.rows.len() > result.total_rows {
            return Err(FetchError::invalid_response(format!(
                "page {} has {} rows but total_rows is {}",
                page_index,
                result.rows.len(),
                result.total_rows
            )));
        }
        if result.rows.len() > page_size {
            warn!(
                "Fetch for page {} returned {} rows, more than the page size {}",
                page_index,
                result.rows.len(),
                page_size
            );
        }
        Ok(result)
    }
}

impl fmt::Debug for RemoteFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteFetcher")
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}
