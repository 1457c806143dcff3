//! Durable key-value persistence for the history log.
//!
//! The segmentation core treats persistence as an opaque capability:
//! `load(key)` / `save(key, value)` over serialized strings. `FileStore` is
//! the production implementation; `MemoryStore` backs tests.

mod file;
mod memory;
mod store;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::KeyValueStore;
