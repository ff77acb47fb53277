//! Media Transport Adapters

#[cfg(test)]
mod fake_transport;
mod stream_registry;

#[cfg(test)]
pub use fake_transport::FakeTransport;
pub use stream_registry::{BoundStream, StreamRegistryTransport};
