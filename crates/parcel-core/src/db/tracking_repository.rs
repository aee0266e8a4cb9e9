//! Tracking record repository implementation

use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::{Checkpoint, TrackingId, TrackingRecord};
use libsql::{params, Connection, Row};

const TRACKING_COLUMNS: &str = "id, tracking_number, title, carrier, archived";
const CHECKPOINT_COLUMNS: &str =
    "tracking_id, time, status_code, status_name, location, delivered, arrived";

/// Trait for tracking record storage operations (async)
#[allow(async_fn_in_trait)]
pub trait TrackingRepository {
    /// Every cached record, archived ones included, ordered by id
    async fn list_all(&self) -> Result<Vec<TrackingRecord>>;

    /// Records with the given archived flag, most recently synced first
    async fn list(&self, archived: bool, limit: usize) -> Result<Vec<TrackingRecord>>;

    /// Get a record by id
    async fn get(&self, id: TrackingId) -> Result<Option<TrackingRecord>>;

    /// Insert or replace every record in one transaction.
    ///
    /// A replaced record's checkpoints are rewritten in the given order.
    async fn upsert_all(&self, records: &[TrackingRecord]) -> Result<()>;
}

/// libSQL implementation of `TrackingRepository`
pub struct LibSqlTrackingRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlTrackingRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a record (without checkpoints) from a database row
    fn parse_record(row: &Row) -> Result<TrackingRecord> {
        Ok(TrackingRecord {
            id: TrackingId::new(row.get::<i64>(0)?),
            tracking_number: row.get(1)?,
            title: row.get::<Option<String>>(2)?,
            carrier: row.get::<Option<String>>(3)?,
            archived: row.get::<i64>(4)? != 0,
            checkpoints: Vec::new(),
        })
    }

    /// Parse a checkpoint and its owning record id from a database row
    fn parse_checkpoint(row: &Row) -> Result<(i64, Checkpoint)> {
        let tracking_id = row.get::<i64>(0)?;
        let checkpoint = Checkpoint {
            time: row.get(1)?,
            status_code: row.get(2)?,
            status_name: row.get(3)?,
            location: row.get::<Option<String>>(4)?,
            delivered: row.get::<i64>(5)? != 0,
            arrived: row.get::<i64>(6)? != 0,
        };
        Ok((tracking_id, checkpoint))
    }

    async fn query_records(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<TrackingRecord>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(Self::parse_record(&row)?);
        }
        Ok(records)
    }

    /// Attach stored checkpoints to each record, reading only those records' rows
    async fn load_checkpoints(&self, records: &mut [TrackingRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let ids = records
            .iter()
            .map(|record| record.id.get().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        self.attach_checkpoints(
            records,
            &format!(
                "SELECT {CHECKPOINT_COLUMNS} FROM checkpoints
                 WHERE tracking_id IN ({ids})
                 ORDER BY tracking_id, position"
            ),
        )
        .await
    }

    /// Attach checkpoints when every record is loaded anyway
    async fn load_all_checkpoints(&self, records: &mut [TrackingRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        self.attach_checkpoints(
            records,
            &format!("SELECT {CHECKPOINT_COLUMNS} FROM checkpoints ORDER BY tracking_id, position"),
        )
        .await
    }

    async fn attach_checkpoints(&self, records: &mut [TrackingRecord], sql: &str) -> Result<()> {
        let mut rows = self.conn.query(sql, ()).await?;

        let mut by_record: BTreeMap<i64, Vec<Checkpoint>> = BTreeMap::new();
        while let Some(row) = rows.next().await? {
            let (tracking_id, checkpoint) = Self::parse_checkpoint(&row)?;
            by_record.entry(tracking_id).or_default().push(checkpoint);
        }

        for record in records.iter_mut() {
            record.checkpoints = by_record.remove(&record.id.get()).unwrap_or_default();
        }
        Ok(())
    }

    async fn write_record(&self, record: &TrackingRecord, updated_at: i64) -> Result<()> {
        let id = record.id.get();

        self.conn
            .execute(
                "INSERT INTO trackings (id, tracking_number, title, carrier, archived, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                     tracking_number = excluded.tracking_number,
                     title = excluded.title,
                     carrier = excluded.carrier,
                     archived = excluded.archived,
                     updated_at = excluded.updated_at",
                params![
                    id,
                    record.tracking_number.as_str(),
                    record.title.clone(),
                    record.carrier.clone(),
                    i64::from(record.archived),
                    updated_at
                ],
            )
            .await?;

        self.conn
            .execute("DELETE FROM checkpoints WHERE tracking_id = ?1", params![id])
            .await?;

        for (position, checkpoint) in (0_i64..).zip(&record.checkpoints) {
            self.conn
                .execute(
                    "INSERT INTO checkpoints
                     (tracking_id, position, time, status_code, status_name, location, delivered, arrived)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        id,
                        position,
                        checkpoint.time.as_str(),
                        checkpoint.status_code.as_str(),
                        checkpoint.status_name.as_str(),
                        checkpoint.location.clone(),
                        i64::from(checkpoint.delivered),
                        i64::from(checkpoint.arrived)
                    ],
                )
                .await?;
        }

        Ok(())
    }
}

impl TrackingRepository for LibSqlTrackingRepository<'_> {
    async fn list_all(&self) -> Result<Vec<TrackingRecord>> {
        let mut records = self
            .query_records(
                &format!("SELECT {TRACKING_COLUMNS} FROM trackings ORDER BY id"),
                (),
            )
            .await?;
        self.load_all_checkpoints(&mut records).await?;
        Ok(records)
    }

    async fn list(&self, archived: bool, limit: usize) -> Result<Vec<TrackingRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut records = self
            .query_records(
                &format!(
                    "SELECT {TRACKING_COLUMNS} FROM trackings
                     WHERE archived = ?1
                     ORDER BY updated_at DESC, id DESC
                     LIMIT ?2"
                ),
                params![i64::from(archived), limit],
            )
            .await?;
        self.load_checkpoints(&mut records).await?;
        Ok(records)
    }

    async fn get(&self, id: TrackingId) -> Result<Option<TrackingRecord>> {
        let mut records = self
            .query_records(
                &format!("SELECT {TRACKING_COLUMNS} FROM trackings WHERE id = ?1"),
                params![id.get()],
            )
            .await?;
        self.load_checkpoints(&mut records).await?;
        Ok(records.pop())
    }

    async fn upsert_all(&self, records: &[TrackingRecord]) -> Result<()> {
        let updated_at = chrono::Utc::now().timestamp_millis();

        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        for record in records {
            if let Err(e) = self.write_record(record, updated_at).await {
                self.conn.execute("ROLLBACK", ()).await.ok();
                return Err(e);
            }
        }

        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }

        tracing::debug!("Upserted {} tracking records", records.len());
        Ok(())
    }
}
