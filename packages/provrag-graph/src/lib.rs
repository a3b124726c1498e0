mod error;
mod store;

pub use error::{Error, Result};
pub use store::{GraphStats, MemoryGraph};
