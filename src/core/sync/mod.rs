//! Registry sync: partitioned fetch, idempotent upsert and the coordinator
//! that drives them

pub mod coordinator;
pub mod fetcher;
pub mod summary;
pub mod upsert;

pub use coordinator::{store_is_fresh, SyncCoordinator, SyncOptions, SyncParts};
pub use fetcher::{FetchReport, FetchSettings, PageSink, SubjectFetcher, PREFIX_ALPHABET};
pub use summary::{SyncIssue, SyncIssueKind, SyncSummary};
pub use upsert::{normalize, BatchUpserter, UpsertSink};
