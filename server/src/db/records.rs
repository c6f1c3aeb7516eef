//! Database access for the records table.

use buendia_engine::{
    EntityKind, Metadata, OrderAction, Record, RecordFilter, RecordId, RecordSource, ScanQuery,
    Timestamp,
};
use sqlx::{PgPool, Row};
use std::future::Future;

/// A stored record row from the database.
#[derive(Debug)]
pub struct StoredRecord {
    pub uuid: String,
    pub kind: String,
    pub date_created: i64,
    pub date_changed: Option<i64>,
    pub voided: bool,
    pub action: Option<String>,
    pub previous_revision_uuid: Option<String>,
    pub payload: serde_json::Value,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredRecord {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredRecord {
            uuid: row.try_get("uuid")?,
            kind: row.try_get("kind")?,
            date_created: row.try_get("date_created")?,
            date_changed: row.try_get("date_changed")?,
            voided: row.try_get("voided")?,
            action: row.try_get("action")?,
            previous_revision_uuid: row.try_get("previous_revision_uuid")?,
            payload: row.try_get("payload")?,
        })
    }
}

fn decode_error(
    column: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

fn millis(column: &str, value: i64) -> Result<Timestamp, sqlx::Error> {
    Timestamp::try_from(value).map_err(|e| decode_error(column, e))
}

impl StoredRecord {
    /// Convert database row to a buendia-engine Record.
    pub fn into_record(self) -> Result<Record, sqlx::Error> {
        let kind: EntityKind = self.kind.parse().map_err(|e| decode_error("kind", e))?;
        let action = self
            .action
            .as_deref()
            .map(str::parse::<OrderAction>)
            .transpose()
            .map_err(|e| decode_error("action", e))?;

        Ok(Record {
            id: self.uuid,
            kind,
            metadata: Metadata {
                created_at: millis("date_created", self.date_created)?,
                changed_at: self
                    .date_changed
                    .map(|changed| millis("date_changed", changed))
                    .transpose()?,
            },
            voided: self.voided,
            action,
            previous_revision_id: self.previous_revision_uuid,
            payload: self.payload,
        })
    }
}

/// Records in PostgreSQL, scanned in `(date_updated, uuid)` order.
#[derive(Debug, Clone)]
pub struct PgRecordSource {
    pool: PgPool,
}

impl PgRecordSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load every revision in the chains that contain `ids`.
    ///
    /// The walk runs back to each root, then forward from there to the latest
    /// revision. `UNION` drops repeated rows, so a cyclic chain still
    /// terminates here and is reported by [`buendia_engine::RevisionIndex`].
    pub async fn revision_chains(&self, ids: &[RecordId]) -> Result<Vec<Record>, sqlx::Error> {
        let rows = sqlx::query_as::<_, StoredRecord>(
            r#"
            WITH RECURSIVE back (uuid, previous_revision_uuid) AS (
                SELECT uuid, previous_revision_uuid
                FROM records
                WHERE uuid = ANY($1)
                UNION
                SELECT r.uuid, r.previous_revision_uuid
                FROM records r
                JOIN back b ON r.uuid = b.previous_revision_uuid
            ),
            forward (uuid) AS (
                SELECT uuid FROM back
                UNION
                SELECT r.uuid
                FROM records r
                JOIN forward f ON r.previous_revision_uuid = f.uuid
            )
            SELECT uuid, kind, date_created, date_changed, voided,
                   action, previous_revision_uuid, payload
            FROM records
            WHERE uuid IN (SELECT uuid FROM forward)
            ORDER BY date_updated ASC, uuid ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StoredRecord::into_record).collect()
    }
}

impl RecordSource<RecordFilter> for PgRecordSource {
    type Record = Record;
    type Error = sqlx::Error;

    fn scan(
        &self,
        query: &ScanQuery<'_, RecordFilter>,
    ) -> impl Future<Output = Result<Vec<Record>, sqlx::Error>> + Send {
        let pool = self.pool.clone();
        let filter = query.selection.filter;
        let kind = filter.kind.as_str();
        let actions: Option<Vec<String>> = filter
            .actions
            .as_ref()
            .map(|actions| actions.iter().map(|a| a.as_str().to_string()).collect());

        // An open bookmark compares against '' so that every uuid at the same
        // instant sorts after it. Instants past i64::MAX select nothing.
        let (after_instant, after_id) = match query.selection.after {
            Some(after) => (
                Some(i64::try_from(after.instant).unwrap_or(i64::MAX)),
                after.id.clone(),
            ),
            None => (None, None),
        };
        let include_voided = query.include_voided;
        let limit = query
            .limit
            .map(|limit| i64::try_from(limit).unwrap_or(i64::MAX));

        async move {
            let rows = sqlx::query_as::<_, StoredRecord>(
                r#"
                SELECT uuid, kind, date_created, date_changed, voided,
                       action, previous_revision_uuid, payload
                FROM records
                WHERE kind = $1
                  AND ($2::text[] IS NULL OR action = ANY($2))
                  AND ($3::bigint IS NULL OR (date_updated, uuid) > ($3, COALESCE($4::text, '')))
                  AND ($5::boolean OR NOT voided)
                ORDER BY date_updated ASC, uuid ASC
                LIMIT $6
                "#,
            )
            .bind(kind)
            .bind(actions)
            .bind(after_instant)
            .bind(after_id)
            .bind(include_voided)
            .bind(limit)
            .fetch_all(&pool)
            .await?;

            rows.into_iter().map(StoredRecord::into_record).collect()
        }
    }
}
