//! Error types

mod config;
mod fetch;
mod field;
mod table;

pub use config::*;
pub use fetch::*;
pub use field::*;
pub use table::*;
