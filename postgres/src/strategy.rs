//! Commit strategies over the seat table.
//!
//! Each strategy books a seat set inside one transaction and reports a typed
//! outcome. The Gatekeeper upstream guarantees at most one booking per seat
//! reaches a strategy, so these differ only in how they behave when that
//! guarantee is deliberately bypassed for measurement:
//!
//! - [`NaiveStrategy`] reads then writes with no locking - the baseline.
//! - [`PessimisticStrategy`] takes row locks with `FOR UPDATE NOWAIT` and
//!   surfaces `CONFLICT_ROWLOCK` when a competitor holds them.
//! - [`OptimisticStrategy`] predicates its update on unchanged seat state and
//!   surfaces `CONFLICT_VERSION` when fewer rows match than were requested.

use seatgrid_core::strategy::{CommitError, CommitStrategy, StrategyKind};
use seatgrid_core::types::{EventId, SeatPos};
use seatgrid_core::BoxFuture;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;

/// `PostgreSQL` error code for "lock not available" under `NOWAIT`.
const LOCK_NOT_AVAILABLE: &str = "55P03";

const FETCH_SQL: &str = "SELECT s.id, s.status
     FROM seats s
     JOIN unnest($2::text[], $3::text[]) AS req(seat_row, seat_col)
       ON s.seat_row = req.seat_row AND s.seat_col = req.seat_col
     WHERE s.event_id = $1";

const FETCH_SQL_LOCKED: &str = "SELECT s.id, s.status
     FROM seats s
     JOIN unnest($2::text[], $3::text[]) AS req(seat_row, seat_col)
       ON s.seat_row = req.seat_row AND s.seat_col = req.seat_col
     WHERE s.event_id = $1
     FOR UPDATE OF s NOWAIT";

/// Instantiate the configured strategy over a shared pool.
#[must_use]
pub fn build_strategy(kind: StrategyKind, pool: PgPool) -> Arc<dyn CommitStrategy> {
    match kind {
        StrategyKind::Naive => Arc::new(NaiveStrategy::new(pool)),
        StrategyKind::Pessimistic => Arc::new(PessimisticStrategy::new(pool)),
        StrategyKind::Optimistic => Arc::new(OptimisticStrategy::new(pool)),
    }
}

fn split_labels(seats: &[SeatPos]) -> (Vec<String>, Vec<String>) {
    seats
        .iter()
        .map(|p| (p.row.clone(), p.col.clone()))
        .unzip()
}

fn map_db_err(err: sqlx::Error) -> CommitError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(LOCK_NOT_AVAILABLE) {
            return CommitError::RowLockConflict;
        }
    }
    CommitError::Store(err.to_string())
}

/// Fetch id + status of the requested seats inside the transaction,
/// optionally taking exclusive row locks without waiting.
async fn fetch_requested(
    tx: &mut Transaction<'_, Postgres>,
    event_id: EventId,
    seats: &[SeatPos],
    lock_rows: bool,
) -> Result<Vec<(i64, String)>, CommitError> {
    let (row_labels, col_labels) = split_labels(seats);
    let sql = if lock_rows { FETCH_SQL_LOCKED } else { FETCH_SQL };
    sqlx::query_as(sql)
        .bind(event_id.as_i64())
        .bind(&row_labels)
        .bind(&col_labels)
        .fetch_all(&mut **tx)
        .await
        .map_err(map_db_err)
}

/// All seats present and `AVAILABLE`, or a typed rejection.
fn ensure_bookable(fetched: &[(i64, String)], requested: usize) -> Result<Vec<i64>, CommitError> {
    if fetched.len() != requested {
        return Err(CommitError::SeatsNotFound);
    }
    if fetched.iter().any(|(_, status)| status != "AVAILABLE") {
        return Err(CommitError::SeatsUnavailable);
    }
    Ok(fetched.iter().map(|(id, _)| *id).collect())
}

async fn book_by_ids(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[i64],
    user_id: &str,
) -> Result<(), CommitError> {
    sqlx::query("UPDATE seats SET status = 'BOOKED', holder = $2 WHERE id = ANY($1)")
        .bind(ids)
        .bind(user_id)
        .execute(&mut **tx)
        .await
        .map_err(map_db_err)?;
    Ok(())
}

// ============================================================================
// Naive
// ============================================================================

/// Read-then-write with no locking. Kept as the measurement baseline; the
/// Gatekeeper prevents double-booking in spite of its race window.
pub struct NaiveStrategy {
    pool: PgPool,
}

impl NaiveStrategy {
    /// Strategy over a shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CommitStrategy for NaiveStrategy {
    fn name(&self) -> &'static str {
        StrategyKind::Naive.as_str()
    }

    fn commit<'a>(
        &'a self,
        event_id: EventId,
        user_id: &'a str,
        seats: &'a [SeatPos],
    ) -> BoxFuture<'a, Result<(), CommitError>> {
        Box::pin(async move {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| CommitError::Store(e.to_string()))?;
            let fetched = fetch_requested(&mut tx, event_id, seats, false).await?;
            let ids = ensure_bookable(&fetched, seats.len())?;
            book_by_ids(&mut tx, &ids, user_id).await?;
            tx.commit().await.map_err(|e| CommitError::Store(e.to_string()))?;
            Ok(())
        })
    }
}

// ============================================================================
// Pessimistic
// ============================================================================

/// Row-level exclusive locks, acquired non-blockingly.
pub struct PessimisticStrategy {
    pool: PgPool,
}

impl PessimisticStrategy {
    /// Strategy over a shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CommitStrategy for PessimisticStrategy {
    fn name(&self) -> &'static str {
        StrategyKind::Pessimistic.as_str()
    }

    fn commit<'a>(
        &'a self,
        event_id: EventId,
        user_id: &'a str,
        seats: &'a [SeatPos],
    ) -> BoxFuture<'a, Result<(), CommitError>> {
        Box::pin(async move {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| CommitError::Store(e.to_string()))?;
            // NOWAIT keeps losers cheap: a held lock surfaces immediately as
            // CONFLICT_ROWLOCK instead of queueing on the row.
            let fetched = fetch_requested(&mut tx, event_id, seats, true).await?;
            let ids = ensure_bookable(&fetched, seats.len())?;
            book_by_ids(&mut tx, &ids, user_id).await?;
            tx.commit().await.map_err(|e| CommitError::Store(e.to_string()))?;
            Ok(())
        })
    }
}

// ============================================================================
// Optimistic
// ============================================================================

/// Conditional update predicated on unchanged seat state.
///
/// Booked seats are immutable, so "still `AVAILABLE` with no holder" is
/// exactly "the `(status, holder)` version observed at fetch time". An update
/// matching fewer rows than requested means a competitor won the race; the
/// transaction rolls back and reports `CONFLICT_VERSION`.
pub struct OptimisticStrategy {
    pool: PgPool,
}

impl OptimisticStrategy {
    /// Strategy over a shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CommitStrategy for OptimisticStrategy {
    fn name(&self) -> &'static str {
        StrategyKind::Optimistic.as_str()
    }

    fn commit<'a>(
        &'a self,
        event_id: EventId,
        user_id: &'a str,
        seats: &'a [SeatPos],
    ) -> BoxFuture<'a, Result<(), CommitError>> {
        Box::pin(async move {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| CommitError::Store(e.to_string()))?;

            let fetched = fetch_requested(&mut tx, event_id, seats, false).await?;
            ensure_bookable(&fetched, seats.len())?;

            let (row_labels, col_labels) = split_labels(seats);
            let result = sqlx::query(
                "UPDATE seats s
                 SET status = 'BOOKED', holder = $4
                 FROM unnest($2::text[], $3::text[]) AS req(seat_row, seat_col)
                 WHERE s.event_id = $1
                   AND s.seat_row = req.seat_row
                   AND s.seat_col = req.seat_col
                   AND s.status = 'AVAILABLE'
                   AND s.holder IS NULL",
            )
            .bind(event_id.as_i64())
            .bind(&row_labels)
            .bind(&col_labels)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;

            if result.rows_affected() as usize != seats.len() {
                tx.rollback()
                    .await
                    .map_err(|e| CommitError::Store(e.to_string()))?;
                return Err(CommitError::VersionConflict);
            }

            tx.commit().await.map_err(|e| CommitError::Store(e.to_string()))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_bookable_accepts_full_available_set() {
        let fetched = vec![(1, "AVAILABLE".to_string()), (2, "AVAILABLE".to_string())];
        assert_eq!(ensure_bookable(&fetched, 2).unwrap(), vec![1, 2]);
    }

    #[test]
    fn ensure_bookable_rejects_missing_seats() {
        let fetched = vec![(1, "AVAILABLE".to_string())];
        assert_eq!(
            ensure_bookable(&fetched, 2),
            Err(CommitError::SeatsNotFound)
        );
    }

    #[test]
    fn ensure_bookable_rejects_booked_seats() {
        let fetched = vec![(1, "AVAILABLE".to_string()), (2, "BOOKED".to_string())];
        assert_eq!(
            ensure_bookable(&fetched, 2),
            Err(CommitError::SeatsUnavailable)
        );
    }

    #[test]
    fn labels_split_in_request_order() {
        let seats = vec![SeatPos::new("A", "1"), SeatPos::new("B", "2")];
        let (rows, cols) = split_labels(&seats);
        assert_eq!(rows, vec!["A", "B"]);
        assert_eq!(cols, vec!["1", "2"]);
    }
}
