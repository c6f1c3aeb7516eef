//! # Buendia Engine
//!
//! Bookmark-based incremental sync for disconnected EMR clients.
//!
//! A client pulls records created or modified on the server, one page at a
//! time, and resumes exactly where it left off. This holds even while the
//! server takes concurrent writes, voids records, or stores many records with
//! the same timestamp.
//!
//! ## Design Principles
//!
//! - **No IO**: The engine talks to storage only through [`RecordSource`]
//! - **Deterministic**: The engine never reads the clock; request time is an input
//! - **Stateless**: Every call is an independent, repeatable read
//!
//! ## Core Concepts
//!
//! ### Positions
//!
//! Every record sits at a [`Position`] `(modified_at, id)`. Positions are
//! totally ordered by instant, then id, so timestamp ties are resolved the
//! same way on every query.
//!
//! ### Pages
//!
//! [`fetch_page`] scans the records strictly after a bookmark that the
//! structural filter admits, emits up to `max_results` of them (dropping
//! voided ones unless asked), and returns the position of the last one as the
//! next bookmark.
//!
//! ### Clamping
//!
//! [`clamp_bookmark`] rewinds any bookmark newer than
//! `request_time - BUFFER_WINDOW_MS`. This way a row stamped before a scan
//! but committed after it is never skipped.
//!
//! ### Wire Format
//!
//! [`encode_bookmark`] and [`decode_bookmark`] convert bookmarks to and from
//! `{"t": "<ISO-8601 UTC>", "u": "<id or null>"}`.
//!
//! ## Quick Start
//!
//! ```rust
//! use buendia_engine::{
//!     assemble, decode_bookmark, EntityKind, MemoryStore, Record, RecordFilter, SyncRequest,
//! };
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! // 1. Something that can scan records in position order
//! let store: MemoryStore<Record> = [
//!     Record::new("patient-a", EntityKind::Patients, 1448450000000),
//!     Record::new("patient-b", EntityKind::Patients, 1448450000000),
//! ]
//! .into_iter()
//! .collect();
//!
//! // 2. Serve a first sync request
//! let filter = RecordFilter::of(EntityKind::Patients);
//! let response = assemble(
//!     &store,
//!     SyncRequest {
//!         bookmark: None,
//!         include_voided: false,
//!         max_results: 500,
//!         filter: &filter,
//!         request_time: 1448450728000,
//!     },
//! )
//! .await
//! .unwrap();
//! assert_eq!(response.results.len(), 2);
//!
//! // 3. The client sends the bookmark back next time
//! let next = decode_bookmark(&response.bookmark).unwrap();
//! assert_eq!(next.id.as_deref(), Some("patient-b"));
//! # });
//! ```

pub mod clamp;
pub mod codec;
pub mod error;
pub mod filter;
pub mod page;
pub mod position;
pub mod record;
pub mod replica;
pub mod response;
pub mod revision;
pub mod source;
pub mod store;

// Re-export main types at crate root
pub use clamp::{buffered_threshold, clamp_bookmark, BUFFER_WINDOW_MS};
pub use codec::{decode_bookmark, encode_bookmark, parse_since};
pub use error::{Error, SyncError};
pub use filter::{AllRecords, RecordFilter, Selection, StructuralFilter};
pub use page::{fetch_page, max_results, SyncPage};
pub use position::Position;
pub use record::{EntityKind, Metadata, OrderAction, Record, Syncable};
pub use replica::{ApplySummary, Replica};
pub use response::{assemble, SyncRequest, SyncResponse};
pub use revision::RevisionIndex;
pub use source::{RecordSource, ScanQuery};
pub use store::MemoryStore;

/// Type aliases for clarity
pub type RecordId = String;
pub type Timestamp = u64;
