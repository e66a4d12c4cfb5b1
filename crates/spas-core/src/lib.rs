// # spas-core
//
// Request dispatch and resilience core for the SPAS address-search client.
//
// ## Architecture Overview
//
// - **classify**: Maps raw input (text, id, global id, cadastral number) to a lookup kind
// - **RateLimiter**: Sliding-window bound on outbound request rate
// - **ConnectionPool**: Bound on concurrent in-flight requests
// - **RetryPolicy**: Transient/permanent failure split and exponential backoff
// - **RequestExecutor**: Runs one logical operation through all of the above
// - **SpasClient**: Public facade (`search`, `autocomplete`, `get_details`, `get_regions`)
// - **Transport**: Trait implemented by the HTTP crate and by test doubles
//
// ## Design Principles
//
// 1. **Single-shot transports**: Retry, backoff and limits live in the executor only
// 2. **Per-client state**: Limiter and pool belong to one client, never to the process
// 3. **Exhaustive dispatch**: Every query kind maps to exactly one remote operation
// 4. **Guaranteed release**: Pool slots and the client lifecycle close on every exit path

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod limiter;
pub mod models;
pub mod pool;
pub mod request;
pub mod retry;
pub mod traits;

// Re-export core types for convenience
pub use classify::{ClassifiedQuery, Query, QueryKind, classify};
pub use client::{ClientState, DetailsRef, SpasClient};
pub use config::{AddressType, RetryConfig, SpasConfig};
pub use error::{Error, ErrorKind, Result};
pub use executor::{Execution, RequestExecutor};
pub use limiter::RateLimiter;
pub use models::{AddressDetails, AddressItem, Region, SearchHint};
pub use pool::{ConnectionPool, PoolSlot};
pub use request::{ApiRequest, Method, Operation, Payload};
pub use retry::{Attempt, AttemptOutcome, RetryPolicy, RetryState};
pub use traits::{Transport, TransportFactory};
