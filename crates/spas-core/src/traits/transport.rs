// # Transport Trait
//
// Defines the interface for sending one request to the SPAS service.
//
// ## Implementations
//
// - HTTPS: `spas-transport-http` crate
// - Test doubles: scripted transports in `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use spas_core::{ApiRequest, Transport};
//
// let payload = transport.send(&ApiRequest::regions()).await?;
// ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::SpasConfig;
use crate::request::{ApiRequest, Payload};

/// Trait for transport implementations
///
/// A transport turns one [`ApiRequest`] into one remote call and returns the
/// decoded payload, or an error from the crate taxonomy describing why the call
/// failed.
///
/// # Thread Safety
///
/// Implementations must be thread-safe: one transport is shared by every
/// operation issued from a client.
///
/// # Single-shot
///
/// A transport makes exactly one call per invocation. Retries, backoff, rate
/// limiting, concurrency limits and deadlines are owned by
/// [`RequestExecutor`](crate::executor::RequestExecutor).
///
/// # Error mapping
///
/// - connection failures → [`Error::Network`](crate::Error::Network)
/// - client-side timeouts → [`Error::Timeout`](crate::Error::Timeout)
/// - "no such record" answers → [`Error::NotFound`](crate::Error::NotFound)
/// - any other error status → [`Error::Api`](crate::Error::Api)
/// - undecodable bodies → [`Error::Json`](crate::Error::Json)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request
    ///
    /// # Parameters
    ///
    /// - `request`: The request to send
    ///
    /// # Returns
    ///
    /// - `Ok(Payload)`: The decoded response body
    /// - `Err(Error)`: If the call failed (the executor decides about retry)
    async fn send(&self, request: &ApiRequest) -> Result<Payload, crate::Error>;

    /// Get the transport name (for logging/debugging)
    fn transport_name(&self) -> &'static str;
}

/// Helper trait for constructing transports from configuration
pub trait TransportFactory: Send + Sync {
    /// Create a Transport instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Client configuration (base URL, token, timeouts, pool size)
    ///
    /// # Returns
    ///
    /// A shared Transport trait object
    fn create(&self, config: &SpasConfig) -> Result<Arc<dyn Transport>, crate::Error>;
}
