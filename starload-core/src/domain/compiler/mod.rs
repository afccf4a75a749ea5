pub mod quoter;

pub use quoter::Quoter;
