//! Page fetching: one bounded scan and the bookmark that resumes after it.

use crate::filter::{Selection, StructuralFilter};
use crate::source::{RecordSource, ScanQuery};
use crate::{error::Result, Error, Position, SyncError, Syncable};
use serde::Serialize;

/// One page of a sync scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncPage<R> {
    /// Emitted records in ascending position order
    pub results: Vec<R>,
    /// Position of the last emitted record, or `None` if nothing was emitted.
    ///
    /// `None` here means "no progress", not "start of set"; pass it through
    /// [`crate::clamp_bookmark`] before handing anything back to a client.
    #[serde(skip)]
    pub bookmark: Option<Position>,
    /// Whether the page came back full, so more data is likely.
    pub more: bool,
}

impl<R> SyncPage<R> {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl<R: Syncable> SyncPage<R> {
    /// Build a page from the rows a scan emitted.
    pub fn from_rows(results: Vec<R>, max_results: usize) -> Self {
        let bookmark = results.last().map(Syncable::position);
        let more = max_results > 0 && results.len() == max_results;
        Self {
            results,
            bookmark,
            more,
        }
    }
}

/// Validate a signed result limit. `0` means unbounded.
pub fn max_results(requested: i64) -> Result<usize> {
    usize::try_from(requested).map_err(|_| {
        Error::InvalidArgument(format!(
            "maxResults must not be negative, got {requested}"
        ))
    })
}

/// Fetch the page of records strictly after `bookmark`.
///
/// Records are scanned in ascending position order among those `filter`
/// admits; voided ones are emitted only with `include_voided`. At most
/// `max_results` records are emitted, or all of them when it is `0`.
pub async fn fetch_page<S, F>(
    source: &S,
    bookmark: Option<&Position>,
    include_voided: bool,
    max_results: usize,
    filter: &F,
) -> std::result::Result<SyncPage<S::Record>, SyncError<S::Error>>
where
    S: RecordSource<F>,
    S::Record: Syncable,
    F: StructuralFilter<S::Record>,
{
    let query = ScanQuery {
        selection: Selection::new(bookmark, filter),
        include_voided,
        limit: (max_results > 0).then_some(max_results),
    };

    let mut rows = source.scan(&query).await.map_err(SyncError::Source)?;
    if let Some(limit) = query.limit {
        rows.truncate(limit);
    }
    // An empty id would encode as `"u":""`, which reads back as an open
    // tie-break and re-admits the record.
    if rows.iter().any(|row| row.id().is_empty()) {
        return Err(Error::InvalidArgument("record with an empty id".to_string()).into());
    }

    let page = SyncPage::from_rows(rows, max_results);
    tracing::debug!(
        after = ?bookmark,
        include_voided,
        max_results,
        emitted = page.len(),
        next = ?page.bookmark,
        more = page.more,
        "fetched sync page"
    );
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::AllRecords;
    use crate::{EntityKind, MemoryStore, Record};

    fn store() -> MemoryStore<Record> {
        (1..=5)
            .map(|i| Record::new(format!("p-{i}"), EntityKind::Patients, i * 1000))
            .collect()
    }

    #[test]
    fn max_results_accepts_zero_and_positive() {
        assert_eq!(max_results(0).unwrap(), 0);
        assert_eq!(max_results(500).unwrap(), 500);
    }

    #[test]
    fn max_results_rejects_negative() {
        assert!(matches!(max_results(-1), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn from_rows_takes_bookmark_from_last_row() {
        let rows = vec![
            Record::new("a", EntityKind::Patients, 1000),
            Record::new("b", EntityKind::Patients, 2000),
        ];
        let page = SyncPage::from_rows(rows, 2);
        assert_eq!(page.bookmark, Some(Position::new(2000, "b")));
        assert!(page.more);
    }

    #[test]
    fn from_rows_empty_has_no_bookmark() {
        let page: SyncPage<Record> = SyncPage::from_rows(Vec::new(), 10);
        assert_eq!(page.bookmark, None);
        assert!(!page.more);
        assert!(page.is_empty());
    }

    #[test]
    fn from_rows_unbounded_never_reports_more() {
        let rows = vec![Record::new("a", EntityKind::Patients, 1000)];
        assert!(!SyncPage::from_rows(rows, 0).more);
    }

    #[tokio::test]
    async fn fetch_bounded_page() {
        let store = store();
        let page = fetch_page(&store, None, false, 2, &AllRecords).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page.bookmark, Some(Position::new(2000, "p-2")));
        assert!(page.more);
    }

    #[tokio::test]
    async fn fetch_unbounded_returns_remaining_set() {
        let store = store();
        let after = Position::new(2000, "p-2");
        let page = fetch_page(&store, Some(&after), false, 0, &AllRecords)
            .await
            .unwrap();
        let ids: Vec<_> = page.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["p-3", "p-4", "p-5"]);
        assert!(!page.more);
    }

    #[tokio::test]
    async fn fetch_past_end_returns_sentinel() {
        let store = store();
        let after = Position::new(5000, "p-5");
        let page = fetch_page(&store, Some(&after), true, 3, &AllRecords)
            .await
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.bookmark, None);
        assert!(!page.more);
    }

    #[tokio::test]
    async fn empty_id_is_rejected() {
        let store: MemoryStore<Record> = [
            Record::new("", EntityKind::Patients, 1000),
            Record::new("p-1", EntityKind::Patients, 2000),
        ]
        .into_iter()
        .collect();

        let result = fetch_page(&store, None, true, 0, &AllRecords).await;
        assert!(matches!(
            result,
            Err(SyncError::Engine(Error::InvalidArgument(_)))
        ));
    }

    #[test]
    fn page_serializes_results_and_more() {
        let page = SyncPage::from_rows(vec![Record::new("a", EntityKind::Patients, 1)], 1);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["more"], true);
        assert_eq!(json["results"][0]["id"], "a");
        assert!(json.get("bookmark").is_none());
    }
}
