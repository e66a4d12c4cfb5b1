// # SPAS HTTP Transport
//
// This crate provides the HTTPS transport for the SPAS client.
//
// - ✅ One HTTP request per `send` call
// - ✅ Bearer token authentication, token never logged
// - ✅ Connection reuse (idle pool sized to `max_connections`)
// - ✅ HTTP status codes mapped onto the client error taxonomy
// - ❌ NO retry, backoff, or rate limiting (owned by `RequestExecutor`)
//
// ## API Reference
//
// - Search: GET `/SearchAddressItem?search_string=...&address_type=...`
// - By id: GET `/GetAddressItemById?object_id=...&address_type=...`
// - By global id: GET `/GetAddressItemByGuid?object_guid=...&address_type=...`
// - By cadastral number: GET `/GetAddressItemByCadastralNumber?cadastral_number=...`
// - Hints: POST `/GetAddressHint` `{"search_string": ..., "address_type": ...}`
// - Details: GET `/GetDetails?object_id=...&address_type=...`
// - Regions: GET `/GetRegions`

use async_trait::async_trait;
use serde_json::Value;
use spas_core::{
    ApiRequest, Error, Method, Payload, Result, SpasClient, SpasConfig, Transport, TransportFactory,
};
use std::sync::Arc;

/// HTTPS transport for the SPAS REST API
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the token.
pub struct HttpTransport {
    /// Base URL without trailing slash
    base_url: String,

    /// Bearer token
    /// ⚠️ NEVER log this value
    token: String,

    /// HTTP client; keeps idle connections for reuse
    client: reqwest::Client,
}

// Custom Debug implementation that hides the token
impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport from client configuration
    ///
    /// # Returns
    ///
    /// - `Ok(HttpTransport)`: Ready transport
    /// - `Err(Error::Config)`: Empty token or the HTTP client could not be built
    pub fn new(config: &SpasConfig) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(Error::config("SPAS token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(config.max_connections)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            client,
        })
    }

    /// Full URL of an endpoint path
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<Payload> {
        let url = self.url(request.operation.path());
        tracing::debug!("SPAS {:?} {}", request.method, url);

        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };

        let mut builder = builder
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .query(&request.params);

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(map_status(status.as_u16(), &error_text, request));
        }

        let text = response.text().await.map_err(map_transport_error)?;
        decode_body(&text)
    }

    fn transport_name(&self) -> &'static str {
        "https"
    }
}

/// Map a reqwest failure onto the error taxonomy
fn map_transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::timeout(format!("HTTP request timed out: {}", e))
    } else {
        Error::network(format!("HTTP request failed: {}", e))
    }
}

/// Map an error status onto the error taxonomy
fn map_status(status: u16, error_text: &str, request: &ApiRequest) -> Error {
    match status {
        404 => Error::not_found(format!("{}: {}", request.operation, error_text)),
        401 | 403 => Error::api(
            status,
            format!("Authentication failed: invalid token or insufficient permissions. {}", error_text),
        ),
        429 => Error::api(status, format!("Rate limit exceeded: {}", error_text)),
        500..=599 => Error::api(status, format!("SPAS server error (transient): {}", error_text)),
        _ => Error::api(status, format!("{} rejected: {}", request.operation, error_text)),
    }
}

/// Decode a success body; an empty body is `null`
fn decode_body(text: &str) -> Result<Payload> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(text)?)
}

/// Factory for creating HTTPS transports
pub struct HttpTransportFactory;

impl TransportFactory for HttpTransportFactory {
    fn create(&self, config: &SpasConfig) -> Result<Arc<dyn Transport>> {
        Ok(Arc::new(HttpTransport::new(config)?))
    }
}

/// Build an open client talking HTTPS to the configured endpoint
///
/// # Example
///
/// ```rust,no_run
/// # async fn demo() -> spas_core::Result<()> {
/// use spas_core::SpasConfig;
///
/// let config = SpasConfig::new().with_token("token");
/// let client = spas_transport_http::connect(&config)?;
/// let address = client.find_address("Москва, Тверская 1").await?;
/// # Ok(())
/// # }
/// ```
pub fn connect(config: &SpasConfig) -> Result<SpasClient> {
    config.validate()?;
    let transport = HttpTransportFactory.create(config)?;
    SpasClient::new(transport, config)
}
