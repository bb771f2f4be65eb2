use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use drive_catalog::{
    logging, Cache, CachedStore, CrawlConfig, Crawler, DiskCache, DriveStore, JsonFileSink,
    NoCache, RemoteStore,
};

/// Crawl a Drive folder tree and write the project catalog as JSON
#[derive(Parser, Debug)]
#[command(name = "drive-catalog", version)]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Id of the folder to start from
    #[arg(long)]
    root: Option<String>,

    /// OAuth access token with drive.readonly scope
    #[arg(long)]
    token: Option<String>,

    /// Where to write the catalog
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Folder listings and downloads in flight at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Abort the crawl after this many seconds
    #[arg(long)]
    deadline_secs: Option<u64>,

    /// Write whatever was gathered when the deadline hits
    #[arg(long)]
    partial: bool,

    /// Cache downloaded text files in this directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Drop technology names that are empty after trimming
    #[arg(long)]
    drop_empty_technologies: bool,

    /// Debug logging for this crate
    #[arg(long, short)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<CrawlConfig> {
        let mut config = match &self.config {
            Some(path) => CrawlConfig::load(path)?,
            None => CrawlConfig::default(),
        };
        config.apply_env();

        if let Some(root) = self.root {
            config.root_folder_id = Some(root);
        }
        if let Some(token) = self.token {
            config.access_token = Some(token);
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if self.deadline_secs.is_some() {
            config.deadline_secs = self.deadline_secs;
        }
        if self.cache_dir.is_some() {
            config.cache_dir = self.cache_dir;
        }
        config.partial_on_deadline |= self.partial;
        config.drop_empty_technologies |= self.drop_empty_technologies;

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.verbose)?;
    let config = args.into_config()?;

    let root = config.root_folder_id.clone().unwrap_or_default();
    let token = config.access_token.clone().unwrap_or_default();
    let drive = DriveStore::with_api_base(token, config.api_base.clone());

    let cache: Arc<dyn Cache> = match &config.cache_dir {
        Some(dir) => Arc::new(
            DiskCache::new(dir.clone())
                .await
                .with_context(|| format!("opening cache at {}", dir.display()))?,
        ),
        None => Arc::new(NoCache),
    };
    let store: Arc<dyn RemoteStore> = Arc::new(CachedStore::new(drive, cache));

    let crawler = Crawler::with_options(store, config.crawl_options());
    let sink = JsonFileSink::new(&config.output);
    let report = crawler
        .crawl_into(&root, &sink)
        .await
        .context("crawl failed")?;

    for failure in &report.list_failures {
        warn!(folder = %failure.folder_id, path = %failure.logical_path, error = %failure.error, "folder skipped");
    }
    for failure in &report.fetch_failures {
        warn!(file = %failure.file_id, name = %failure.name, error = %failure.error, "text asset missing");
    }
    info!(output = %sink.path().display(), complete = report.is_complete(), "catalog written");

    Ok(())
}
