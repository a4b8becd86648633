//! Network layer: wire types, normalized errors, the transport seam, and
//! the intercepting API client.

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod fake_transport;
