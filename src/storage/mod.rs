//! Project-space storage.
//!
//! [`ProjectSpace`] is the persistence contract the cache layer is written
//! against; [`InMemoryProjectSpace`] is the reference implementation.

mod memory;
mod traits;

pub use memory::InMemoryProjectSpace;
pub use traits::{ProjectSpace, StorageError};
