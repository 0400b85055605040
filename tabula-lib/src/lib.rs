//! Paginated, filterable table engine
//!
//! Reconciles a column schema, a local dataset or a remote fetch function,
//! the filter values and a page cursor into the window of rows a table
//! shows. Rendering is left to the caller.

pub mod column;
pub mod cursor;
pub mod dialog;
pub mod error;
pub mod filter;
pub mod model;
pub mod page;
pub mod source;

mod config;
mod engine;

pub use column::Column;
pub use column::ColumnSchema;
pub use config::TableConfig;
pub use engine::*;
pub use page::Page;
