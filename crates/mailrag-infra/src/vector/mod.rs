//! Vector store implementations that need no database.

pub mod memory;

pub use self::memory::InMemoryEmailStore;
