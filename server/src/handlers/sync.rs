//! Sync handler - serves one page of an entity kind to a field client.

use crate::db::PgRecordSource;
use crate::error::{AppError, Result};
use buendia_engine::{
    assemble, max_results, parse_since, EntityKind, MemoryStore, Record, RecordFilter, RecordId,
    RecordSource, RevisionIndex, SyncRequest, SyncResponse, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::future::Future;

/// Query parameters for a sync request.
#[derive(Debug, Default, Deserialize)]
pub struct SyncQuery {
    /// Bookmark from the previous response; absent for a full sync
    pub since: Option<String>,
    /// Page size; missing or 0 means the server maximum
    pub limit: Option<i64>,
}

/// One result as the client sees it: the entity fields plus its identity.
///
/// A voided entity is a tombstone carrying only `uuid` and `voided`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncItem {
    /// Id of the entity, which for order revisions is the root revision
    pub uuid: RecordId,
    pub voided: bool,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl SyncItem {
    fn new(uuid: RecordId, record: Record) -> Self {
        let mut fields = match record.payload {
            serde_json::Value::Object(fields) if !record.voided => fields,
            _ => serde_json::Map::new(),
        };
        fields.remove("uuid");
        fields.remove("voided");
        Self {
            uuid,
            voided: record.voided,
            fields,
        }
    }
}

/// A record source that can also resolve order revision chains.
pub trait SyncBackend: RecordSource<RecordFilter, Record = Record> + Sync {
    /// Every revision in the chains containing `ids`, from root to latest.
    fn revision_chains(
        &self,
        ids: &[RecordId],
    ) -> impl Future<Output = std::result::Result<Vec<Record>, Self::Error>> + Send;
}

impl SyncBackend for PgRecordSource {
    fn revision_chains(
        &self,
        ids: &[RecordId],
    ) -> impl Future<Output = std::result::Result<Vec<Record>, sqlx::Error>> + Send {
        PgRecordSource::revision_chains(self, ids)
    }
}

impl SyncBackend for MemoryStore<Record> {
    fn revision_chains(
        &self,
        ids: &[RecordId],
    ) -> impl Future<Output = std::result::Result<Vec<Record>, Infallible>> + Send {
        let mut members: HashSet<RecordId> = HashSet::new();
        let mut pending: Vec<RecordId> = ids.to_vec();
        while let Some(id) = pending.pop() {
            if let Some(previous) = self.get(&id).and_then(|r| r.previous_revision_id.clone()) {
                if !members.contains(&previous) {
                    pending.push(previous);
                }
            }
            members.insert(id);
        }

        // Forward links are only stored on the successor, so sweep until no
        // new revision joins.
        loop {
            let before = members.len();
            let successors: Vec<RecordId> = self
                .ordered()
                .filter(|r| {
                    r.previous_revision_id
                        .as_ref()
                        .is_some_and(|previous| members.contains(previous))
                })
                .map(|r| r.id.clone())
                .collect();
            members.extend(successors);
            if members.len() == before {
                break;
            }
        }

        let chains = self
            .ordered()
            .filter(|r| members.contains(&r.id))
            .cloned()
            .collect();
        std::future::ready(Ok(chains))
    }
}

/// Resolve the page size a client asked for.
///
/// Negative limits are rejected. Missing, zero and oversized limits all become
/// `max_page_size`, so a response is never unbounded.
pub fn page_size(limit: Option<i64>, max_page_size: usize) -> Result<usize> {
    let requested = match limit {
        Some(limit) => max_results(limit)?,
        None => 0,
    };
    Ok(match requested {
        0 => max_page_size,
        n => n.min(max_page_size),
    })
}

/// Process a sync request for one entity kind.
///
/// Incremental syncs (those with `since`) include voided records so clients
/// learn about deletions; a full sync leaves them out.
pub async fn handle_sync<S>(
    source: &S,
    kind: EntityKind,
    query: SyncQuery,
    max_page_size: usize,
    request_time: Timestamp,
) -> Result<SyncResponse<SyncItem>>
where
    S: SyncBackend,
    AppError: From<S::Error>,
{
    let bookmark = query
        .since
        .as_deref()
        .map(|since| {
            parse_since(since).map_err(|e| {
                tracing::warn!(since, error = %e, "rejecting malformed bookmark");
                AppError::BadRequest(format!("Invalid bookmark \"{since}\""))
            })
        })
        .transpose()?;
    let max_results = page_size(query.limit, max_page_size)?;
    let filter = RecordFilter::for_client(kind);

    let response = assemble(
        source,
        SyncRequest {
            bookmark: bookmark.as_ref(),
            include_voided: bookmark.is_some(),
            max_results,
            filter: &filter,
            request_time,
        },
    )
    .await?;

    tracing::info!(
        %kind,
        results = response.results.len(),
        more = response.more,
        "served sync page"
    );

    let revisions = match kind {
        EntityKind::Orders => {
            let ids: Vec<RecordId> = response.results.iter().map(|r| r.id.clone()).collect();
            let chains = source.revision_chains(&ids).await?;
            let index = RevisionIndex::from_records(&chains);
            let by_id: HashMap<RecordId, Record> =
                chains.into_iter().map(|r| (r.id.clone(), r)).collect();
            Some((index, by_id))
        }
        _ => None,
    };

    let SyncResponse {
        results,
        bookmark,
        more,
    } = response;
    // Orders are keyed by their root revision but show the latest one, so a
    // re-delivered older revision never rolls the client back.
    let results = results
        .into_iter()
        .map(|record| match &revisions {
            Some((index, by_id)) => {
                let root = index.root_of(&record.id)?;
                let latest = index.latest_of(&root)?;
                let record = by_id.get(&latest).cloned().unwrap_or(record);
                Ok(SyncItem::new(root, record))
            }
            None => Ok(SyncItem::new(record.id.clone(), record)),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SyncResponse {
        results,
        bookmark,
        more,
    })
}
