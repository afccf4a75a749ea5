// starload-core/src/infrastructure/adapters/mod.rs

pub mod copy;
pub mod duckdb;
pub mod redshift;

pub use copy::CopyCommandLoader;
pub use duckdb::DuckDbWarehouse;
pub use redshift::{PoolSettings, RedshiftWarehouse};
