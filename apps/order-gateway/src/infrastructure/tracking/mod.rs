//! Order tracking adapters.

mod in_memory;

pub use in_memory::InMemoryOrderTracker;
