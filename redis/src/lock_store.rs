//! Redis-backed lock store.
//!
//! `try_claim` is one Lua script, so the existence check over every requested
//! field and the subsequent inserts form a single indivisible step on the
//! server - no other claim, release or scan over the same event key can
//! interleave. `release` is a single `HDEL` and `scan_stale` a single
//! `HGETALL`, each atomic on their own.

use chrono::{DateTime, Duration, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use seatgrid_core::lock_store::{LockStore, LockStoreError};
use seatgrid_core::types::{EventId, SeatPos};
use seatgrid_core::BoxFuture;
use tracing::warn;

/// Claim the whole seat set or nothing.
///
/// KEYS[1] = per-event seats hash; ARGV[1] = claim timestamp (epoch millis);
/// ARGV[2] = key TTL seconds; ARGV[3..] = seat field keys. The TTL is only
/// attached when the key has none yet, so claims never extend the lifetime of
/// an existing event map.
const TRY_CLAIM_SCRIPT: &str = r"
local key = KEYS[1]
local ts = ARGV[1]
local ttl = tonumber(ARGV[2])

for i = 3, #ARGV do
    if redis.call('HEXISTS', key, ARGV[i]) == 1 then
        return 0
    end
end

for i = 3, #ARGV do
    redis.call('HSET', key, ARGV[i], ts)
end

if redis.call('TTL', key) < 0 then
    redis.call('EXPIRE', key, ttl)
end

return 1
";

/// Per-event seat claims in a Redis hash.
#[derive(Clone)]
pub struct RedisLockStore {
    conn: ConnectionManager,
    key_ttl: std::time::Duration,
}

impl RedisLockStore {
    /// Lock store over a shared connection multiplexer.
    ///
    /// `key_ttl` is attached to each event's claim map when it is first
    /// created (event duration plus grace).
    #[must_use]
    pub const fn new(conn: ConnectionManager, key_ttl: std::time::Duration) -> Self {
        Self { conn, key_ttl }
    }

    fn seats_key(event_id: EventId) -> String {
        format!("event:{}:seats", event_id.as_i64())
    }
}

fn unavailable(err: redis::RedisError) -> LockStoreError {
    LockStoreError::Unavailable(err.to_string())
}

impl LockStore for RedisLockStore {
    fn try_claim<'a>(
        &'a self,
        event_id: EventId,
        seats: &'a [SeatPos],
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<bool, LockStoreError>> {
        Box::pin(async move {
            if seats.is_empty() {
                return Ok(true);
            }
            let mut conn = self.conn.clone();
            let fields: Vec<String> = seats.iter().map(SeatPos::field_key).collect();

            let granted: i64 = redis::Script::new(TRY_CLAIM_SCRIPT)
                .key(Self::seats_key(event_id))
                .arg(now.timestamp_millis())
                .arg(self.key_ttl.as_secs())
                .arg(&fields)
                .invoke_async(&mut conn)
                .await
                .map_err(unavailable)?;

            Ok(granted == 1)
        })
    }

    fn release<'a>(
        &'a self,
        event_id: EventId,
        seats: &'a [SeatPos],
    ) -> BoxFuture<'a, Result<usize, LockStoreError>> {
        Box::pin(async move {
            if seats.is_empty() {
                return Ok(0);
            }
            let mut conn = self.conn.clone();
            let fields: Vec<String> = seats.iter().map(SeatPos::field_key).collect();
            let removed: usize = conn
                .hdel(Self::seats_key(event_id), &fields)
                .await
                .map_err(unavailable)?;
            Ok(removed)
        })
    }

    fn scan_stale(
        &self,
        event_id: EventId,
        threshold: Duration,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<SeatPos>, LockStoreError>> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            let entries: std::collections::HashMap<String, i64> = conn
                .hgetall(Self::seats_key(event_id))
                .await
                .map_err(unavailable)?;

            let cutoff = (now - threshold).timestamp_millis();
            let stale = entries
                .into_iter()
                .filter(|(_, claimed_at)| *claimed_at < cutoff)
                .filter_map(|(field, _)| {
                    let pos = SeatPos::from_field_key(&field);
                    if pos.is_none() {
                        warn!(event_id = %event_id, field, "Skipping malformed claim field");
                    }
                    pos
                })
                .collect();
            Ok(stale)
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), LockStoreError>> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            let _: String = redis::cmd("PING")
                .query_async(&mut conn)
                .await
                .map_err(unavailable)?;
            Ok(())
        })
    }
}
