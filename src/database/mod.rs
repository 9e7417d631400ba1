pub mod pool;
pub mod update;

pub use pool::{bind_value_as, connect};
