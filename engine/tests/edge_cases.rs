//! Edge case tests for buendia-engine
//!
//! These tests cover boundary conditions and unusual inputs.

use buendia_engine::{
    clamp_bookmark, decode_bookmark, encode_bookmark, fetch_page, max_results, parse_since,
    AllRecords, EntityKind, Error, MemoryStore, Position, Record, RecordFilter, SyncError,
    Syncable,
};
use std::convert::Infallible;

// ============================================================================
// Empty and single-record sets
// ============================================================================

#[tokio::test]
async fn empty_store_from_start() {
    let store: MemoryStore<Record> = MemoryStore::new();
    let page = fetch_page(&store, None, true, 10, &AllRecords).await.unwrap();
    assert!(page.is_empty());
    assert_eq!(page.bookmark, None);
    assert!(!page.more);
}

#[tokio::test]
async fn single_record_fills_page_of_one() {
    let store: MemoryStore<Record> = [Record::new("only", EntityKind::Patients, 1000)]
        .into_iter()
        .collect();

    // A full page says "more" even though nothing follows; the next call is
    // simply empty.
    let page = fetch_page(&store, None, true, 1, &AllRecords).await.unwrap();
    assert!(page.more);
    let next = fetch_page(&store, page.bookmark.as_ref(), true, 1, &AllRecords)
        .await
        .unwrap();
    assert!(next.is_empty());
    assert!(!next.more);
}

#[tokio::test]
async fn all_voided_emits_nothing_without_flag() {
    let store: MemoryStore<Record> = (0..5)
        .map(|i| Record::new(format!("v-{i}"), EntityKind::Patients, 1000).voided_at(2000))
        .collect();

    let page = fetch_page(&store, None, false, 0, &AllRecords).await.unwrap();
    assert!(page.is_empty());
    assert_eq!(page.bookmark, None);
}

// ============================================================================
// Identifier edge cases
// ============================================================================

#[tokio::test]
async fn ids_compare_as_strings() {
    // "10" sorts before "9" as a string; byte order, not numeric order.
    let store: MemoryStore<Record> = ["9", "10", "Z", "a"]
        .into_iter()
        .map(|id| Record::new(id, EntityKind::Patients, 1000))
        .collect();

    let page = fetch_page(&store, None, true, 0, &AllRecords).await.unwrap();
    let ids: Vec<_> = page.results.iter().map(Syncable::id).collect();
    assert_eq!(ids, ["10", "9", "Z", "a"]);
}

#[test]
fn unicode_ids_survive_codec() {
    for id in ["日本語テスト", "Привет", "🎉🚀", "with \"quotes\"", "back\\slash"] {
        let bookmark = Position::new(1448450728000, id);
        let decoded = decode_bookmark(&encode_bookmark(&bookmark).unwrap()).unwrap();
        assert_eq!(decoded, bookmark, "failed for {id}");
    }
}

#[test]
fn very_long_id_survives_codec() {
    let bookmark = Position::new(1000, "x".repeat(64 * 1024));
    let decoded = decode_bookmark(&encode_bookmark(&bookmark).unwrap()).unwrap();
    assert_eq!(decoded, bookmark);
}

#[test]
fn empty_id_on_the_wire_is_open() {
    let decoded = decode_bookmark(r#"{"t":"2015-11-25T11:25:28.000Z","u":""}"#).unwrap();
    assert!(decoded.is_open());
}

#[tokio::test]
async fn empty_id_record_never_reaches_a_bookmark() {
    // Paging past an empty id would emit `"u":""`, which the decoder reads as
    // open and replays the same record forever.
    let store: MemoryStore<Record> = [
        Record::new("", EntityKind::Patients, 1000),
        Record::new("p-1", EntityKind::Patients, 1000),
    ]
    .into_iter()
    .collect();

    let result = fetch_page(&store, None, true, 1, &AllRecords).await;
    assert!(matches!(
        result,
        Err(SyncError::<Infallible>::Engine(Error::InvalidArgument(_)))
    ));
}

// ============================================================================
// Timestamp edge cases
// ============================================================================

#[test]
fn epoch_round_trips() {
    let encoded = encode_bookmark(&Position::open(0)).unwrap();
    assert_eq!(encoded, r#"{"t":"1970-01-01T00:00:00.000Z","u":null}"#);
    assert_eq!(decode_bookmark(&encoded).unwrap(), Position::open(0));
}

#[test]
fn sub_millisecond_input_is_truncated() {
    let decoded = decode_bookmark(r#"{"t":"2015-11-25T11:25:28.000999Z"}"#).unwrap();
    assert_eq!(decoded.instant, 1448450728000);
}

#[test]
fn timestamp_without_zone_is_malformed() {
    let result = decode_bookmark(r#"{"t":"2015-11-25T11:25:28.000"}"#);
    assert!(matches!(result, Err(Error::MalformedBookmark(_))));
}

#[test]
fn since_with_leading_whitespace_is_json() {
    let parsed = parse_since(r#"  {"t":"2015-11-25T11:25:28.000Z","u":"x"}"#).unwrap();
    assert_eq!(parsed, Position::new(1448450728000, "x"));
}

#[test]
fn since_never_defaults_to_start_of_set() {
    for since in ["", " ", "null", "0", "{}", "garbage/123"] {
        assert!(
            matches!(parse_since(since), Err(Error::MalformedBookmark(_))),
            "expected failure for {since:?}"
        );
    }
}

// ============================================================================
// Argument validation
// ============================================================================

#[test]
fn negative_max_results_is_invalid() {
    assert!(matches!(max_results(i64::MIN), Err(Error::InvalidArgument(_))));
    assert!(matches!(max_results(-1), Err(Error::InvalidArgument(_))));
}

#[test]
fn request_time_at_epoch_is_invalid() {
    assert!(matches!(
        clamp_bookmark(None, 0),
        Err(Error::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn filter_for_other_kind_sees_nothing() {
    let store: MemoryStore<Record> = [Record::new("p-1", EntityKind::Patients, 1000)]
        .into_iter()
        .collect();
    let filter = RecordFilter::of(EntityKind::Observations);

    let page = fetch_page(&store, None, true, 0, &filter).await.unwrap();
    assert!(page.is_empty());
}

#[test]
fn sync_error_from_engine_error() {
    let err: SyncError<Infallible> = Error::MalformedBookmark("x".into()).into();
    assert!(matches!(err, SyncError::Engine(Error::MalformedBookmark(_))));
}
