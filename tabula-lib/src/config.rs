//! Table configuration

use serde::Deserialize;

use crate::error::ConfigError;

/// Page size settings for a table.
///
/// The bounds mirror the page-size chooser: sizes from `min_page_size` to
/// `max_page_size` in increments of `page_size_step`.
///
/// # Example
///
/// ```
/// use tabula_lib::TableConfig;
///
/// let config = TableConfig::default()
///     .with_page_size(25)
///     .with_max_page_size(50);
///
/// assert!(config.validate_page_size(25).is_ok());
/// assert!(config.validate_page_size(80).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Initial page size.
    ///
    /// Default: 10
    pub page_size: usize,

    /// Smallest selectable page size.
    ///
    /// Default: 10
    pub min_page_size: usize,

    /// Largest selectable page size.
    ///
    /// Default: 100
    pub max_page_size: usize,

    /// Increment between the sizes offered by the chooser.
    ///
    /// Default: 10
    pub page_size_step: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            min_page_size: 10,
            max_page_size: 100,
            page_size_step: 10,
        }
    }
}

impl TableConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial page size.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the smallest selectable page size.
    pub fn with_min_page_size(mut self, size: usize) -> Self {
        self.min_page_size = size;
        self
    }

    /// Sets the largest selectable page size.
    pub fn with_max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = size;
        self
    }

    /// Sets the chooser increment.
    pub fn with_page_size_step(mut self, step: usize) -> Self {
        self.page_size_step = step;
        self
    }

    /// Checks a page size against the configured bounds.
    ///
    /// Zero is always rejected. The step is not enforced.
    pub fn validate_page_size(&self, size: usize) -> Result<usize, ConfigError> {
        let min = self.min_page_size.max(1);
        if size < min || size > self.max_page_size {
            return Err(ConfigError::InvalidPageSize {
                size,
                min,
                max: self.max_page_size,
            });
        }
        Ok(size)
    }

    /// Lists the sizes offered by the page-size chooser.
    pub fn page_size_options(&self) -> Vec<usize> {
        let min = self.min_page_size.max(1);
        let step = self.page_size_step.max(1);
        (min..=self.max_page_size).step_by(step).collect()
    }
}
