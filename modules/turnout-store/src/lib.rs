//! Repository seam for the dispatch engine.
//!
//! The engine never talks to a database directly; it reads through this trait
//! and mutates through `commit`, the atomic multi-write primitive. Concurrent
//! writers either see a batch fully applied or not at all.

pub mod batch;
pub mod memory;
pub mod traits;

pub use batch::{WriteBatch, WriteOp};
pub use memory::MemoryStore;
pub use traits::Repository;
