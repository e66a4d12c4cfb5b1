//! Connection slot pool
//!
//! Bounds how many requests are in flight at once. Transport connections are
//! reused by the transport itself; the pool only hands out leases.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{Error, Result};

/// Fixed-size pool of in-flight request slots
#[derive(Debug)]
pub struct ConnectionPool {
    max_connections: usize,
    slots: Arc<Semaphore>,
}

impl ConnectionPool {
    /// Create a pool with `max_connections` slots (at least one)
    pub fn new(max_connections: usize) -> Self {
        let max_connections = max_connections.max(1);
        Self {
            max_connections,
            slots: Arc::new(Semaphore::new(max_connections)),
        }
    }

    /// Lease one slot, waiting until one is free
    ///
    /// The slot returns to the pool when the [`PoolSlot`] is dropped, whether
    /// the request succeeded, failed, or the waiting future was cancelled.
    ///
    /// # Returns
    ///
    /// - `Ok(PoolSlot)`: An exclusive lease
    /// - `Err(Error::Closed)`: The pool was closed while or before waiting
    pub async fn lease(&self) -> Result<PoolSlot> {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| Error::closed("connection pool is closed"))?;

        Ok(PoolSlot { _permit: permit })
    }

    /// Close the pool; pending and future leases fail
    ///
    /// Slots already leased stay valid until dropped.
    pub fn close(&self) {
        self.slots.close();
    }

    pub fn is_closed(&self) -> bool {
        self.slots.is_closed()
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Number of slots free right now
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Number of slots leased right now
    pub fn in_use(&self) -> usize {
        self.max_connections.saturating_sub(self.available())
    }
}

/// Exclusive lease on one pool slot, released on drop
#[derive(Debug)]
pub struct PoolSlot {
    _permit: OwnedSemaphorePermit,
}
