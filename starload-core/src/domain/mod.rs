pub mod catalog;
pub mod compiler;
pub mod error;
pub mod graph;
pub mod load;
pub mod quality;
pub mod scalar;

// Re-exports to keep imports short elsewhere
pub use error::{ConfigurationError, DataQualityError};
pub use scalar::Scalar;
