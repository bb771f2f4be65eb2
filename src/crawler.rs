use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::{
    aggregator::{Aggregator, AssetUrls},
    emitter::CatalogSink,
    error::{CatalogError, Result},
    name::{NameParser, TechnologyPolicy},
    store::RemoteStore,
    types::Catalog,
    walker::{WalkReport, Walker},
};

/// Tuning knobs for one crawl
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Folder listings / downloads allowed in flight at once
    pub concurrency: usize,
    /// Upper bound on the whole walk
    pub deadline: Option<Duration>,
    /// On deadline, return what was gathered instead of failing
    pub partial_on_deadline: bool,
    pub technology_policy: TechnologyPolicy,
    pub asset_urls: AssetUrls,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            deadline: None,
            partial_on_deadline: false,
            technology_policy: TechnologyPolicy::default(),
            asset_urls: AssetUrls::default(),
        }
    }
}

/// Result of a crawl
#[derive(Debug, Clone)]
pub struct CrawlOutput {
    pub catalog: Catalog,
    pub report: WalkReport,
}

/// Builds project catalogs from a remote store
pub struct Crawler {
    store: Arc<dyn RemoteStore>,
    options: CrawlOptions,
}

impl Crawler {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self::with_options(store, CrawlOptions::default())
    }

    pub fn with_options(store: Arc<dyn RemoteStore>, options: CrawlOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Walk everything below `root_folder_id` and return the catalog
    ///
    /// Folder and download failures never fail the crawl; they are listed
    /// in the report. The only error is an exceeded deadline when partial
    /// output was not requested.
    pub async fn crawl(&self, root_folder_id: &str) -> Result<CrawlOutput> {
        let aggregator = Arc::new(Aggregator::with_options(
            self.store.clone(),
            NameParser::new(self.options.technology_policy),
            self.options.asset_urls.clone(),
        ));
        let walker = Walker::new(self.store.clone(), aggregator.clone())
            .with_concurrency(self.options.concurrency);

        info!(
            store = %self.store.identifier(),
            root = root_folder_id,
            concurrency = self.options.concurrency,
            "starting crawl"
        );
        let started = Instant::now();
        let mut report = WalkReport::default();

        match self.options.deadline {
            Some(deadline) => {
                let walk = walker.walk_into(root_folder_id, &mut report);
                if tokio::time::timeout(deadline, walk).await.is_err() {
                    report.timed_out = true;
                    if !self.options.partial_on_deadline {
                        return Err(CatalogError::DeadlineExceeded {
                            seconds: deadline.as_secs(),
                        });
                    }
                    warn!(
                        deadline_secs = deadline.as_secs(),
                        "crawl deadline exceeded, keeping partial catalog"
                    );
                }
            }
            None => walker.walk_into(root_folder_id, &mut report).await,
        }

        let catalog = aggregator.finish().await;
        info!(
            projects = catalog.len(),
            folders = report.folders_listed,
            files = report.files_seen,
            list_failures = report.list_failures.len(),
            fetch_failures = report.fetch_failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "crawl finished"
        );

        Ok(CrawlOutput { catalog, report })
    }

    /// Crawl and hand the catalog to `sink`
    pub async fn crawl_into(&self, root_folder_id: &str, sink: &dyn CatalogSink) -> Result<WalkReport> {
        let output = self.crawl(root_folder_id).await?;
        sink.accept(&output.catalog).await?;
        Ok(output.report)
    }
}
