//! Core traits for the SPAS client
//!
//! - [`Transport`]: Send one request to the remote service
//! - [`TransportFactory`]: Build a transport from configuration

pub mod transport;

pub use transport::{Transport, TransportFactory};
