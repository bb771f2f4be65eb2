pub mod aggregator;
pub mod cache;
pub mod config;
pub mod crawler;
pub mod drive;
pub mod emitter;
pub mod error;
pub mod logging;
pub mod name;
pub mod store;
pub mod text;
pub mod types;
pub mod walker;

pub use aggregator::{Aggregator, AssetUrls, Ingest};
pub use cache::{Cache, CachedStore, DiskCache, NoCache};
pub use config::CrawlConfig;
pub use crawler::{CrawlOptions, CrawlOutput, Crawler};
pub use drive::DriveStore;
pub use emitter::{CatalogSink, JsonFileSink, MemorySink};
pub use error::{CatalogError, Result};
pub use name::{NameParser, TechnologyPolicy};
pub use store::RemoteStore;
pub use types::{
    Button, Catalog, EntryKind, FileContent, ProjectDescriptor, ProjectRecord, QueueItem,
    RemoteEntry,
};
pub use walker::{FetchFailure, ListFailure, WalkReport, Walker};
