//! Redis-backed admission counter.
//!
//! The counter is advisory (a sold-out hint, not a proof), so reads swallow
//! errors into "absent" and callers skip the fast path. The decrement runs as
//! Lua so the subtract and the clamp-at-zero are one atomic step - a
//! concurrent peek can never observe a negative value.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use seatgrid_core::admission::{AdmissionCache, AdmissionCacheError};
use seatgrid_core::types::EventId;
use seatgrid_core::BoxFuture;
use tracing::{debug, warn};

/// Subtract ARGV[1], clamping the stored value at zero.
///
/// An absent key is left absent (nil reply): a decrement must never
/// resurrect a counter whose TTL already expired. `KEEPTTL` preserves the
/// key lifetime across the clamp write. Returns the pre-clamp value so the
/// caller can log drift.
const DECREMENT_SCRIPT: &str = "
if redis.call('EXISTS', KEYS[1]) == 0 then
    return false
end

local v = redis.call('DECRBY', KEYS[1], ARGV[1])
if v < 0 then
    redis.call('SET', KEYS[1], '0', 'KEEPTTL')
end
return v
";

/// Per-event remaining-seats counter in Redis.
#[derive(Clone)]
pub struct RedisAdmissionCache {
    conn: ConnectionManager,
    key_ttl: std::time::Duration,
}

impl RedisAdmissionCache {
    /// Cache over a shared connection multiplexer. `key_ttl` bounds each
    /// counter's lifetime (event duration plus grace).
    #[must_use]
    pub const fn new(conn: ConnectionManager, key_ttl: std::time::Duration) -> Self {
        Self { conn, key_ttl }
    }

    fn counter_key(event_id: EventId) -> String {
        format!("event:{}:available", event_id.as_i64())
    }
}

impl AdmissionCache for RedisAdmissionCache {
    fn peek(&self, event_id: EventId) -> BoxFuture<'_, Option<i64>> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            match conn.get::<_, Option<i64>>(Self::counter_key(event_id)).await {
                Ok(value) => value,
                Err(err) => {
                    // Advisory only: a cache fault means "no hint", never a
                    // rejection.
                    warn!(event_id = %event_id, error = %err, "Admission peek failed");
                    None
                }
            }
        })
    }

    fn decrement(
        &self,
        event_id: EventId,
        delta: i64,
    ) -> BoxFuture<'_, Result<(), AdmissionCacheError>> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            let observed: Option<i64> = redis::Script::new(DECREMENT_SCRIPT)
                .key(Self::counter_key(event_id))
                .arg(delta)
                .invoke_async(&mut conn)
                .await
                .map_err(|e| AdmissionCacheError(e.to_string()))?;

            match observed {
                None => {
                    debug!(event_id = %event_id, "Admission counter absent, decrement skipped");
                }
                Some(v) if v < 0 => {
                    warn!(
                        event_id = %event_id,
                        observed = v,
                        "Admission counter went negative, clamped to zero"
                    );
                }
                Some(_) => {}
            }
            Ok(())
        })
    }

    fn seed(
        &self,
        event_id: EventId,
        initial: i64,
    ) -> BoxFuture<'_, Result<(), AdmissionCacheError>> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            let _: () = conn
                .set_ex(Self::counter_key(event_id), initial, self.key_ttl.as_secs())
                .await
                .map_err(|e| AdmissionCacheError(e.to_string()))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect;

    // These tests require a running Redis instance:
    // docker run -d -p 6379:6379 redis:7-alpine
    // cargo test -p seatgrid-redis -- --ignored

    const TTL: std::time::Duration = std::time::Duration::from_secs(24 * 3600);

    async fn cache() -> (RedisAdmissionCache, ConnectionManager) {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let conn = connect(&url).await.unwrap();
        (RedisAdmissionCache::new(conn.clone(), TTL), conn)
    }

    async fn clear(conn: &mut ConnectionManager, event_id: EventId) {
        let _: () = conn
            .del(RedisAdmissionCache::counter_key(event_id))
            .await
            .unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_seed_peek_decrement() {
        let (cache, mut conn) = cache().await;
        let event_id = EventId::new(920_001);
        clear(&mut conn, event_id).await;

        cache.seed(event_id, 6).await.unwrap();
        assert_eq!(cache.peek(event_id).await, Some(6));

        cache.decrement(event_id, 2).await.unwrap();
        assert_eq!(cache.peek(event_id).await, Some(4));

        let ttl: i64 = conn
            .ttl(RedisAdmissionCache::counter_key(event_id))
            .await
            .unwrap();
        assert!(ttl > 0, "counter should carry a TTL, got {ttl}");

        clear(&mut conn, event_id).await;
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_decrement_clamps_at_zero() {
        let (cache, mut conn) = cache().await;
        let event_id = EventId::new(920_002);
        clear(&mut conn, event_id).await;

        cache.seed(event_id, 1).await.unwrap();
        cache.decrement(event_id, 5).await.unwrap();
        assert_eq!(cache.peek(event_id).await, Some(0));

        clear(&mut conn, event_id).await;
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_decrement_leaves_absent_counter_absent() {
        let (cache, mut conn) = cache().await;
        let event_id = EventId::new(920_003);
        clear(&mut conn, event_id).await;

        cache.decrement(event_id, 1).await.unwrap();
        assert_eq!(cache.peek(event_id).await, None);
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_peek_absent_is_none() {
        let (cache, mut conn) = cache().await;
        let event_id = EventId::new(920_004);
        clear(&mut conn, event_id).await;

        assert_eq!(cache.peek(event_id).await, None);
    }
}
