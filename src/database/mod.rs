pub mod manager;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryPropertyStore;
pub use postgres::PgPropertyStore;
pub use repository::PropertyStore;
