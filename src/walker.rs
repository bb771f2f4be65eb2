use std::collections::VecDeque;
use std::sync::Arc;

use futures::{future::join_all, stream, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    aggregator::{Aggregator, Ingest},
    store::RemoteStore,
    types::{QueueItem, RemoteEntry},
};

/// A folder whose listing failed; its subtree was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListFailure {
    pub folder_id: String,
    pub logical_path: String,
    pub error: String,
}

/// A text asset whose download failed; the field kept its prior value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub file_id: String,
    pub name: String,
    pub error: String,
}

/// What happened during a walk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkReport {
    pub folders_listed: usize,
    pub files_seen: usize,
    /// Files under folders that do not encode a project
    pub files_ignored: usize,
    /// Files attached to a project but matching no asset kind
    pub files_unclassified: usize,
    pub list_failures: Vec<ListFailure>,
    pub fetch_failures: Vec<FetchFailure>,
    /// Set when the walk was cut short by a deadline
    pub timed_out: bool,
}

impl WalkReport {
    pub fn is_complete(&self) -> bool {
        !self.timed_out && self.list_failures.is_empty() && self.fetch_failures.is_empty()
    }
}

/// A file waiting to be folded into the aggregator
struct Discovered {
    owner_segment: String,
    entry: RemoteEntry,
    seq: u64,
}

/// Walks a folder tree breadth-first and feeds every file to an aggregator
pub struct Walker {
    store: Arc<dyn RemoteStore>,
    aggregator: Arc<Aggregator>,
    concurrency: usize,
}

impl Walker {
    pub fn new(store: Arc<dyn RemoteStore>, aggregator: Arc<Aggregator>) -> Self {
        Self {
            store,
            aggregator,
            concurrency: 1,
        }
    }

    /// Allow up to `concurrency` listings or downloads in flight at once
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    /// Walk everything below `root_folder_id`
    pub async fn walk(&self, root_folder_id: &str) -> WalkReport {
        let mut report = WalkReport::default();
        self.walk_into(root_folder_id, &mut report).await;
        report
    }

    /// Walk everything below `root_folder_id`, recording progress as it goes
    ///
    /// The report stays valid if this future is dropped half-way, which is
    /// how deadlines are enforced.
    ///
    /// Folders are taken from the front of the queue in batches of at most
    /// `concurrency`. Results are handled in queue order and files are
    /// numbered in that order, so discovery order is the same as a one at a
    /// time FIFO walk whatever the batch size.
    pub async fn walk_into(&self, root_folder_id: &str, report: &mut WalkReport) {
        let mut queue = VecDeque::from([QueueItem::root(root_folder_id)]);
        let mut next_seq = 0u64;

        while !queue.is_empty() {
            let take = self.concurrency.min(queue.len());
            let batch: Vec<QueueItem> = queue.drain(..take).collect();

            let listings = join_all(
                batch
                    .iter()
                    .map(|item| self.store.list_children(&item.folder_id)),
            )
            .await;

            let mut discovered = Vec::new();
            for (item, listing) in batch.iter().zip(listings) {
                let entries = match listing {
                    Ok(entries) => entries,
                    Err(e) => {
                        warn!(folder = %item.folder_id, path = %item.logical_path, error = %e, "failed to list folder, skipping subtree");
                        report.list_failures.push(ListFailure {
                            folder_id: item.folder_id.clone(),
                            logical_path: item.logical_path.clone(),
                            error: e.to_string(),
                        });
                        continue;
                    }
                };

                report.folders_listed += 1;
                debug!(folder = %item.folder_id, path = %item.logical_path, entries = entries.len(), "listed folder");

                for entry in entries {
                    if entry.is_folder() {
                        queue.push_back(item.child(&entry));
                    } else {
                        discovered.push(Discovered {
                            owner_segment: item.owner_segment().to_string(),
                            entry,
                            seq: next_seq,
                        });
                        next_seq += 1;
                    }
                }
            }

            self.ingest_all(discovered, report).await;
        }
    }

    async fn ingest_all(&self, discovered: Vec<Discovered>, report: &mut WalkReport) {
        let outcomes: Vec<_> = stream::iter(discovered.iter())
            .map(|file| async move {
                self.aggregator
                    .ingest(&file.owner_segment, &file.entry, file.seq)
                    .await
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        for (file, outcome) in discovered.iter().zip(outcomes) {
            report.files_seen += 1;
            match outcome {
                Ok(Ingest::Ignored) => report.files_ignored += 1,
                Ok(Ingest::Unclassified) => report.files_unclassified += 1,
                Ok(_) => {}
                Err(e) => {
                    warn!(file = %file.entry.id, name = %file.entry.name, error = %e, "failed to fetch text asset");
                    report.fetch_failures.push(FetchFailure {
                        file_id: file.entry.id.clone(),
                        name: file.entry.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }
}
