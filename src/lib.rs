// TodoStore - TODO list manager on a single-table key-value layout

pub mod cli;
pub mod keys;
pub mod kv;
pub mod report;
pub mod sqlite;
pub mod store;
pub mod todo;

// Re-export main types for convenience
pub use keys::Status;
pub use kv::{KvStore, Query, QueryOutput, Row};
pub use sqlite::SqliteTable;
pub use store::{Listing, TodoFields, TodoStore, now_ms};
pub use todo::TodoItem;
