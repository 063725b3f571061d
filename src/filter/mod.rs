pub mod types;
pub mod filter;
pub mod filter_where;
pub mod error;

pub use types::*;
pub use filter::FilterParams;
pub use filter_where::{rebind, FilterWhere};
pub use error::FilterError;
