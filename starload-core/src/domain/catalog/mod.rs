pub mod dialect;
pub mod queries;
pub mod table;

pub use dialect::Dialect;
pub use table::{Column, TableDefinition, TableDescriptor, TableId, TableRole};
