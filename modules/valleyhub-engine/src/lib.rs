pub mod classifier;
pub mod pipeline;
pub mod snapshot;
pub mod store;
pub mod sync;
pub mod testing;

pub use classifier::{Classifier, ClaudeClassifier};
pub use pipeline::{enrich, RawItem};
pub use snapshot::{PgSnapshotStore, SnapshotStore};
pub use store::{dedup_key, HubStore};
pub use sync::{run_sync, FeedFetcher, FeedItem, HttpFeedFetcher, REGION_SOURCES};
