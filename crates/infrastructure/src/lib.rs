//! Infrastructure adapters for Grantlens ports.

#![forbid(unsafe_code)]

mod http_resource_context;
mod in_memory_resource_context;

pub use http_resource_context::HttpResourceContext;
pub use in_memory_resource_context::InMemoryResourceContext;
