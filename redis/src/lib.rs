//! Redis lock store and admission cache for SeatGrid.
//!
//! Both stores share one [`redis::aio::ConnectionManager`] per process - the
//! single long-lived multiplexer the resource model calls for. The operations
//! whose atomicity the pipeline depends on (`try_claim`, clamped `decrement`)
//! run as server-side Lua via [`redis::Script`]; everything else is a single
//! Redis command and therefore atomic by itself.
//!
//! Key layout, per event:
//! - `event:{id}:seats` - hash of `"row-col"` → claim epoch millis.
//! - `event:{id}:available` - integer remaining-seats counter.
//!
//! Both keys carry a key-level TTL (event duration plus grace); no per-field
//! TTL is needed because the reconciler governs staleness at field
//! granularity.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod admission;
pub mod lock_store;

pub use admission::RedisAdmissionCache;
pub use lock_store::RedisLockStore;

use seatgrid_core::lock_store::LockStoreError;

/// Build the shared per-process connection multiplexer.
///
/// # Errors
///
/// [`LockStoreError::Unavailable`] if the URL is invalid or the initial
/// connection fails.
pub async fn connect(url: &str) -> Result<redis::aio::ConnectionManager, LockStoreError> {
    let client = redis::Client::open(url)
        .map_err(|e| LockStoreError::Unavailable(format!("invalid redis url: {e}")))?;
    redis::aio::ConnectionManager::new(client)
        .await
        .map_err(|e| LockStoreError::Unavailable(format!("redis connection failed: {e}")))
}
