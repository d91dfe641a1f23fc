//! `PostgreSQL`-backed seat store.

use chrono::{DateTime, Utc};
use seatgrid_core::seat_store::{SeatStore, SeatStoreError};
use seatgrid_core::types::{Event, EventId, NewEvent, Seat, SeatId, SeatPos, SeatStatus};
use seatgrid_core::BoxFuture;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

/// Durable event + seat persistence over a sqlx connection pool.
///
/// The pool is safe for concurrent use and shared with the commit strategies;
/// this type itself only materializes grids and serves reads.
#[derive(Clone)]
pub struct PostgresSeatStore {
    pool: PgPool,
}

impl PostgresSeatStore {
    /// Connect with default pool settings (max 5 connections).
    ///
    /// # Errors
    ///
    /// [`SeatStoreError::Unavailable`] if the URL is invalid or the database
    /// cannot be reached.
    pub async fn new(database_url: &str) -> Result<Self, SeatStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| SeatStoreError::Unavailable(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool, for callers that configure pooling themselves.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, shared with the commit strategies.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending embedded migrations. Idempotent.
    ///
    /// # Errors
    ///
    /// [`SeatStoreError::Unavailable`] if a migration fails to apply.
    pub async fn run_migrations(&self) -> Result<(), SeatStoreError> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| SeatStoreError::Unavailable(format!("migration failed: {e}")))?;
        info!("Seat store migrations applied");
        Ok(())
    }
}

fn store_err(err: sqlx::Error) -> SeatStoreError {
    SeatStoreError::Unavailable(err.to_string())
}

fn row_to_seat(
    event_id: EventId,
    row: (i64, String, String, String, Option<String>),
) -> Result<Seat, SeatStoreError> {
    let (id, seat_row, seat_col, status, holder) = row;
    let status = SeatStatus::parse(&status)
        .ok_or_else(|| SeatStoreError::Unavailable(format!("unknown seat status '{status}'")))?;
    Ok(Seat {
        id: SeatId::new(id),
        event_id,
        pos: SeatPos::new(seat_row, seat_col),
        status,
        holder,
    })
}

impl SeatStore for PostgresSeatStore {
    fn create_event(&self, spec: NewEvent) -> BoxFuture<'_, Result<Event, SeatStoreError>> {
        Box::pin(async move {
            if spec.rows < 1 || spec.cols < 1 {
                return Err(SeatStoreError::InvalidEvent(format!(
                    "grid dimensions must be at least 1x1, got {}x{}",
                    spec.rows, spec.cols
                )));
            }

            let mut tx = self.pool.begin().await.map_err(store_err)?;

            let (event_id,): (i64,) = sqlx::query_as(
                "INSERT INTO events (name, date, rows, cols)
                 VALUES ($1, $2, $3, $4)
                 RETURNING id",
            )
            .bind(&spec.name)
            .bind(spec.date)
            .bind(spec.rows)
            .bind(spec.cols)
            .fetch_one(&mut *tx)
            .await
            .map_err(store_err)?;

            // Materialize the whole grid in one statement, row-major so seat
            // ids follow reading order.
            sqlx::query(
                "INSERT INTO seats (event_id, seat_row, seat_col, status)
                 SELECT $1, r::text, c::text, 'AVAILABLE'
                 FROM generate_series(1, $2::int) AS r,
                      generate_series(1, $3::int) AS c",
            )
            .bind(event_id)
            .bind(spec.rows)
            .bind(spec.cols)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

            tx.commit().await.map_err(store_err)?;

            Ok(Event {
                id: EventId::new(event_id),
                name: spec.name,
                date: spec.date,
                rows: spec.rows,
                cols: spec.cols,
            })
        })
    }

    fn get_event(&self, event_id: EventId) -> BoxFuture<'_, Result<Option<Event>, SeatStoreError>> {
        Box::pin(async move {
            let row: Option<(i64, String, DateTime<Utc>, i32, i32)> = sqlx::query_as(
                "SELECT id, name, date, rows, cols FROM events WHERE id = $1",
            )
            .bind(event_id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

            Ok(row.map(|(id, name, date, rows, cols)| Event {
                id: EventId::new(id),
                name,
                date,
                rows,
                cols,
            }))
        })
    }

    fn list_event_ids(&self) -> BoxFuture<'_, Result<Vec<EventId>, SeatStoreError>> {
        Box::pin(async move {
            let rows: Vec<(i64,)> = sqlx::query_as("SELECT id FROM events ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(store_err)?;
            Ok(rows.into_iter().map(|(id,)| EventId::new(id)).collect())
        })
    }

    fn fetch_seats<'a>(
        &'a self,
        event_id: EventId,
        seats: &'a [SeatPos],
    ) -> BoxFuture<'a, Result<Vec<Seat>, SeatStoreError>> {
        Box::pin(async move {
            let row_labels: Vec<String> = seats.iter().map(|p| p.row.clone()).collect();
            let col_labels: Vec<String> = seats.iter().map(|p| p.col.clone()).collect();

            let rows: Vec<(i64, String, String, String, Option<String>)> = sqlx::query_as(
                "SELECT s.id, s.seat_row, s.seat_col, s.status, s.holder
                 FROM seats s
                 JOIN unnest($2::text[], $3::text[]) AS req(seat_row, seat_col)
                   ON s.seat_row = req.seat_row AND s.seat_col = req.seat_col
                 WHERE s.event_id = $1",
            )
            .bind(event_id.as_i64())
            .bind(&row_labels)
            .bind(&col_labels)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

            rows.into_iter().map(|r| row_to_seat(event_id, r)).collect()
        })
    }

    fn fetch_available(
        &self,
        event_id: EventId,
    ) -> BoxFuture<'_, Result<Vec<SeatPos>, SeatStoreError>> {
        Box::pin(async move {
            let rows: Vec<(String, String)> = sqlx::query_as(
                "SELECT seat_row, seat_col FROM seats
                 WHERE event_id = $1 AND status = 'AVAILABLE'",
            )
            .bind(event_id.as_i64())
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;
            Ok(rows
                .into_iter()
                .map(|(row, col)| SeatPos::new(row, col))
                .collect())
        })
    }

    fn seat_map(&self, event_id: EventId) -> BoxFuture<'_, Result<Vec<Seat>, SeatStoreError>> {
        Box::pin(async move {
            let rows: Vec<(i64, String, String, String, Option<String>)> = sqlx::query_as(
                "SELECT id, seat_row, seat_col, status, holder
                 FROM seats
                 WHERE event_id = $1
                 ORDER BY id",
            )
            .bind(event_id.as_i64())
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

            rows.into_iter().map(|r| row_to_seat(event_id, r)).collect()
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), SeatStoreError>> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(store_err)?;
            Ok(())
        })
    }
}
