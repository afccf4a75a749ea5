// starload-core/src/lib.rs

// 1. Documentation
#![allow(missing_docs)]
// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Contracts towards the outside world: Warehouse, BulkSource.
pub mod ports;

// 2. Domain (Business core)
// Table catalog, dialects, scalars, quality checks, DAG.
// Depends on nothing else in the crate.
pub mod domain;

// 3. Infrastructure (Adapters)
// DuckDB, Redshift, COPY loader, Jinja, YAML config.
pub mod infrastructure;

// 4. Application (Use Cases)
// Operators, pipeline builder, executor.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::StarloadError;
