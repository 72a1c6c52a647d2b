//! Keyed storage bridging "segment once" and "export many times"

pub mod directory;
pub mod memory;

pub use directory::DirectoryStore;
pub use memory::MemoryStore;
