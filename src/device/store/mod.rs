pub mod document;
pub mod memory;
pub mod postgres;

pub use document::PostgresDocumentStore;
pub use memory::{InMemoryReadStore, InMemorySystemOfRecord};
pub use postgres::PostgresDeviceStore;
