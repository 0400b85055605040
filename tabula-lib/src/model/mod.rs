//! Row model and field paths

mod path;
mod record;
mod value;

pub use path::*;
pub use record::*;
pub use value::*;
