pub mod error;
pub mod filter_where;
pub mod types;

pub use error::FilterError;
pub use filter_where::FilterWhere;
pub use types::*;
