//! hotelbench core engine.
//!
//! Backend-agnostic pieces of the benchmark: the query catalog, the primitive
//! value/row model every translator normalizes into, the staged client-side
//! pipeline used by stores without native joins or aggregation, and the
//! sequential matrix runner that times each (backend, query) cell.
//!
//! # Modules
//!
//! - [`catalog`] - The 15 named logical queries and their semantic contracts
//! - [`value`] - Primitive value set shared by all backends
//! - [`row`] - Ordered field/value records
//! - [`pipeline`] - Staged scan/filter/group/sort/limit emulation
//! - [`report`] - Per-cell benchmark reports and the comparison aggregator
//! - [`runner`] - The `Translator` seam and the matrix runner
//! - [`error`] - Error taxonomy

pub mod catalog;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod row;
pub mod runner;
pub mod value;

pub use catalog::{Direction, QueryName, QueryShape, QuerySpec};
pub use error::Error;
pub use pipeline::Stage;
pub use report::{BenchmarkReport, Comparison, ComparisonRow, SAMPLE_LIMIT};
pub use row::ResultRow;
pub use runner::{Runner, Translator};
pub use value::Value;
