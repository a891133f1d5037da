//! HTTP transport layer
//!
//! The executor talks to the network only through the [`Transport`] trait.
//! [`HttpTransport`] is the reqwest-backed implementation; tests substitute
//! their own.

pub mod client;
pub mod transport;

pub use client::{HttpTransport, HttpTransportBuilder};
pub use transport::{Transport, TransportError, TransportRequest, TransportResponse};
