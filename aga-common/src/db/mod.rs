//! Store handle and database schema

pub mod init;
pub mod store;

pub use init::*;
pub use store::*;

/// Fresh row identifier (UUID v4 text)
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
