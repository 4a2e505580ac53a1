//! Endpoint lifecycle bookkeeping.

mod registry;

pub use registry::EndpointRegistry;
