//! In-memory record storage.

pub mod table;

pub use table::Table;
