//! Script splitting, execution and record previews.

pub mod executor;
pub mod records;
pub mod splitter;

pub use executor::{ExecuteOptions, QueryExecutor};
pub use records::{PageRequest, RecordFetcher};
pub use splitter::{split, split_statements, BatchUnit, ExecutableUnit};
