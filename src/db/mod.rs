pub mod connection;
pub mod failures;
pub mod listings;

pub use connection::Database;
