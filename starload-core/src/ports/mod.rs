// starload-core/src/ports/mod.rs

pub mod bulk;
pub mod warehouse;

pub use bulk::{BulkLoadRequest, BulkSource};
pub use warehouse::{Row, Warehouse};
