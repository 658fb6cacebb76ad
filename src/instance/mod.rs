//! Instance cache layer.
//!
//! [`Instance`] memoizes one compound; [`InstanceManager`] hands out one
//! instance per compound so locking is striped by compound id.

mod cache;
mod manager;

pub use cache::{Instance, Invalidation};
pub use manager::InstanceManager;
