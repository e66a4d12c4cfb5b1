//! SPAS client facade
//!
//! [`SpasClient`] classifies caller input, builds the matching request and
//! hands it to the [`RequestExecutor`]. It also owns the client lifecycle:
//!
//! ```text
//! Open ──close()/scope exit──▶ Closed
//! ```
//!
//! Once closed, every operation fails immediately with
//! [`Error::Closed`](crate::Error::Closed) and no network I/O is attempted.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::classify::{ClassifiedQuery, Query, classify};
use crate::config::{AddressType, SpasConfig};
use crate::error::{Error, ErrorKind, Result};
use crate::executor::RequestExecutor;
use crate::models::{self, AddressDetails, AddressItem, Region, SearchHint};
use crate::request::{ApiRequest, Payload};
use crate::traits::Transport;

/// Lifecycle state of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Open,
    Closed,
}

/// Reference to an address whose details are requested
#[derive(Debug, Clone, PartialEq)]
pub enum DetailsRef {
    /// Internal numeric id
    Id(i64),
    /// Address resolved by an earlier lookup
    Address(Box<AddressItem>),
    /// Input that does not name a resolved address
    Unresolved(String),
}

impl DetailsRef {
    fn object_id(&self) -> Result<i64> {
        let id = match self {
            DetailsRef::Id(id) => *id,
            DetailsRef::Address(item) => item.object_id,
            DetailsRef::Unresolved(raw) => {
                return Err(Error::validation(format!(
                    "details need a resolved address or numeric id, got {:?}",
                    raw
                )));
            }
        };
        if id <= 0 {
            return Err(Error::validation(format!("invalid object id: {}", id)));
        }
        Ok(id)
    }
}

impl From<i64> for DetailsRef {
    fn from(id: i64) -> Self {
        DetailsRef::Id(id)
    }
}

impl From<AddressItem> for DetailsRef {
    fn from(item: AddressItem) -> Self {
        DetailsRef::Address(Box::new(item))
    }
}

impl From<&AddressItem> for DetailsRef {
    fn from(item: &AddressItem) -> Self {
        DetailsRef::Address(Box::new(item.clone()))
    }
}

impl From<&str> for DetailsRef {
    fn from(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(id) => DetailsRef::Id(id),
            Err(_) => DetailsRef::Unresolved(raw.to_string()),
        }
    }
}

struct ClientInner {
    executor: RequestExecutor,
    address_type: AddressType,
    closed: AtomicBool,
}

/// Client for the SPAS address service
///
/// Cloning is cheap; clones share the rate limiter, pool and lifecycle, so
/// closing any clone closes them all. Separate clients never share limits.
#[derive(Clone)]
pub struct SpasClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for SpasClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpasClient")
            .field("transport", &self.inner.executor.transport_name())
            .field("address_type", &self.inner.address_type)
            .field("state", &self.state())
            .finish()
    }
}

impl SpasClient {
    /// Create a client over a transport
    ///
    /// # Returns
    ///
    /// - `Ok(SpasClient)`: An open client
    /// - `Err(Error::Config)`: If the configuration is invalid
    pub fn new(transport: Arc<dyn Transport>, config: &SpasConfig) -> Result<Self> {
        let executor = RequestExecutor::new(transport, config)?;
        Ok(Self::from_executor(executor, config.address_type))
    }

    /// Create a client over a pre-built executor
    pub fn from_executor(executor: RequestExecutor, address_type: AddressType) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                executor,
                address_type,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn state(&self) -> ClientState {
        if self.inner.closed.load(Ordering::SeqCst) {
            ClientState::Closed
        } else {
            ClientState::Open
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state() == ClientState::Closed
    }

    /// Release pooled resources; later operations fail with a usage error
    ///
    /// Idempotent. Operations already waiting for a pool slot fail as well.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            self.inner.executor.pool().close();
            debug!("SPAS client closed");
        }
    }

    /// Run `f` with this client and close it afterwards
    ///
    /// The client is closed however the scope ends: normal return, error
    /// result, panic unwinding or cancellation of the returned future.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let found = client
    ///     .scope(|spas| async move { spas.search("Москва, Тверская 1").await })
    ///     .await?;
    /// ```
    pub async fn scope<F, Fut, T>(self, f: F) -> T
    where
        F: FnOnce(SpasClient) -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = CloseOnDrop(self.clone());
        f(self).await
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.inner.executor
    }

    pub fn address_type(&self) -> AddressType {
        self.inner.address_type
    }

    fn ensure_open(&self, operation: &str) -> Result<()> {
        if self.is_closed() {
            return Err(Error::closed(format!("{} called after close", operation)));
        }
        Ok(())
    }

    /// Resolve one address from any query shape
    ///
    /// # Returns
    ///
    /// - `Ok(Some(payload))`: The service found a match; payload is unmodified
    /// - `Ok(None)`: The service reports no match
    /// - `Err(Error::Validation)`: Empty query, rejected before any request
    pub async fn search(&self, query: impl Into<Query>) -> Result<Option<Payload>> {
        self.ensure_open("search")?;

        let query = classify(query);
        if query.is_empty() {
            return Err(Error::validation("search query is empty"));
        }

        debug!("search classified as {:?}", query.kind());
        let request = ApiRequest::lookup(&query, self.inner.address_type);

        match self.inner.executor.execute(&request).await {
            Ok(payload) if models::has_addresses(&payload) => Ok(Some(payload)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Resolve one address and decode it
    pub async fn find_address(&self, query: impl Into<Query>) -> Result<Option<AddressItem>> {
        match self.search(query).await? {
            Some(payload) => models::first_address(&payload),
            None => Ok(None),
        }
    }

    /// Suggestions for partial input, in the service's ranking order
    ///
    /// Input is always treated as free text. At most `limit` suggestions are
    /// returned; a `limit` of zero is treated as one.
    pub async fn autocomplete(&self, partial: &str, limit: usize) -> Result<Vec<Payload>> {
        self.ensure_open("autocomplete")?;

        let query = ClassifiedQuery::free_text(partial);
        if query.is_empty() {
            return Err(Error::validation("autocomplete input is empty"));
        }

        let request = ApiRequest::hints(&query, self.inner.address_type);
        let payload = self.inner.executor.execute(&request).await?;

        let mut hints = models::list_items(&payload, "hints");
        hints.truncate(limit.max(1));
        Ok(hints)
    }

    /// Suggestions for partial input, decoded
    pub async fn autocomplete_hints(&self, partial: &str, limit: usize) -> Result<Vec<SearchHint>> {
        self.autocomplete(partial, limit)
            .await?
            .into_iter()
            .map(|hint| serde_json::from_value(hint).map_err(Error::from))
            .collect()
    }

    /// Extended attributes of a resolved address
    ///
    /// # Returns
    ///
    /// - `Ok(payload)`: Details as returned by the service
    /// - `Err(Error::Validation)`: Unresolved or non-positive reference
    /// - `Err(Error::NotFound)`: The service has no such address
    pub async fn get_details(&self, reference: impl Into<DetailsRef>) -> Result<Payload> {
        self.ensure_open("get_details")?;

        let object_id = reference.into().object_id()?;
        let request = ApiRequest::details(object_id, self.inner.address_type);
        let payload = self.inner.executor.execute(&request).await?;

        if payload.is_null() || payload.as_object().is_some_and(|map| map.is_empty()) {
            return Err(Error::not_found(format!("no details for object {}", object_id)));
        }
        Ok(payload)
    }

    /// Extended attributes of a resolved address, decoded
    pub async fn address_details(&self, reference: impl Into<DetailsRef>) -> Result<AddressDetails> {
        let payload = self.get_details(reference).await?;
        models::details_from(&payload)
    }

    /// Top-level administrative regions
    pub async fn get_regions(&self) -> Result<Vec<Payload>> {
        self.ensure_open("get_regions")?;

        let payload = self.inner.executor.execute(&ApiRequest::regions()).await?;
        let regions = models::list_items(&payload, "addresses");
        if regions.is_empty() {
            return Ok(models::list_items(&payload, "regions"));
        }
        Ok(regions)
    }

    /// Top-level administrative regions, decoded
    pub async fn regions(&self) -> Result<Vec<Region>> {
        self.get_regions()
            .await?
            .into_iter()
            .map(|region| serde_json::from_value(region).map_err(Error::from))
            .collect()
    }
}

/// Closes the client when dropped
struct CloseOnDrop(SpasClient);

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        self.0.close();
    }
}
