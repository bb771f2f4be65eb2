use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::{
    error::Result,
    name::NameParser,
    store::RemoteStore,
    text,
    types::{Button, Catalog, ProjectDescriptor, ProjectRecord, RemoteEntry},
};

const DESCRIPTION_FILE: &str = "Description.txt";
const LINK_FILES: [&str; 2] = ["link.txt", "Link.txt"];

/// URL templates for media assets; `{id}` is replaced by the file id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUrls {
    pub image: String,
    pub video: String,
}

impl AssetUrls {
    pub fn image_url(&self, file_id: &str) -> String {
        self.image.replace("{id}", file_id)
    }

    pub fn video_url(&self, file_id: &str) -> String {
        self.video.replace("{id}", file_id)
    }
}

impl Default for AssetUrls {
    fn default() -> Self {
        Self {
            image: "https://drive.google.com/thumbnail?id={id}&sz=w1000".to_string(),
            video: "https://drive.google.com/file/d/{id}/preview".to_string(),
        }
    }
}

/// What a single ingested file did to the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    /// The owning folder does not encode a project
    Ignored,
    /// Attached to a project but neither a text asset nor media
    Unclassified,
    Description,
    Link,
    Image,
    Video,
}

/// How a file contributes to its project, decided before any download
enum Asset {
    Description,
    Link,
    Image,
    Video,
    Unclassified,
}

fn classify(file: &RemoteEntry) -> Asset {
    if file.name == DESCRIPTION_FILE {
        return Asset::Description;
    }
    if LINK_FILES.contains(&file.name.as_str()) {
        return Asset::Link;
    }
    match file.mime_type.as_deref() {
        Some(mime) if mime.contains("video") => Asset::Video,
        Some(mime) if mime.contains("image") => Asset::Image,
        _ => Asset::Unclassified,
    }
}

/// Mutable state behind one project key.
///
/// Overwritable fields remember the sequence number of the file that set
/// them; media keep theirs so the finished lists follow discovery order.
struct ProjectSlot {
    record: ProjectRecord,
    first_seq: u64,
    description_seq: Option<u64>,
    buttons_seq: Option<u64>,
    images: Vec<(u64, String)>,
    videos: Vec<(u64, String)>,
}

impl ProjectSlot {
    fn new(descriptor: &ProjectDescriptor, seq: u64) -> Self {
        Self {
            record: ProjectRecord::from_descriptor(descriptor),
            first_seq: seq,
            description_seq: None,
            buttons_seq: None,
            images: Vec::new(),
            videos: Vec::new(),
        }
    }

    fn reseed(&mut self, descriptor: &ProjectDescriptor, seq: u64) {
        self.record.start = descriptor.start.clone();
        self.record.end = descriptor.end.clone();
        self.record.technologies = descriptor.technologies.clone();
        self.first_seq = seq;
    }

    fn overwrite_description(&mut self, seq: u64, lines: Vec<String>) {
        if self.description_seq.map_or(true, |current| seq >= current) {
            self.record.description = lines;
            self.description_seq = Some(seq);
        }
    }

    fn overwrite_buttons(&mut self, seq: u64, button: Button) {
        if self.buttons_seq.map_or(true, |current| seq >= current) {
            self.record.buttons = vec![button];
            self.buttons_seq = Some(seq);
        }
    }

    fn finish(&self) -> ProjectRecord {
        let mut images = self.images.clone();
        images.sort_by_key(|(seq, _)| *seq);
        let mut videos = self.videos.clone();
        videos.sort_by_key(|(seq, _)| *seq);

        let mut record = self.record.clone();
        record.images = images.into_iter().map(|(_, url)| url).collect();
        record.videos = videos.into_iter().map(|(_, url)| url).collect();
        record
    }
}

/// Accumulates project records over one crawl
///
/// Every file arrives with the display name of the folder that holds it and
/// its discovery sequence number. The folder name selects the project; the
/// file name, or failing that the mime type, selects the field it fills.
///
/// Safe to share between tasks: creation of a key is serialized by the
/// index lock and each record is mutated under its own lock.
pub struct Aggregator {
    store: Arc<dyn RemoteStore>,
    parser: NameParser,
    urls: AssetUrls,
    projects: RwLock<HashMap<String, Arc<Mutex<ProjectSlot>>>>,
}

impl Aggregator {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self::with_options(store, NameParser::default(), AssetUrls::default())
    }

    pub fn with_options(store: Arc<dyn RemoteStore>, parser: NameParser, urls: AssetUrls) -> Self {
        Self {
            store,
            parser,
            urls,
            projects: RwLock::new(HashMap::new()),
        }
    }

    /// Fold one file into the catalog
    ///
    /// `owner_segment` is the display name of the folder holding `file` and
    /// `seq` its position in discovery order. Errors are only returned for
    /// failed text downloads; the project record exists regardless.
    pub async fn ingest(&self, owner_segment: &str, file: &RemoteEntry, seq: u64) -> Result<Ingest> {
        let Some(descriptor) = self.parser.parse(owner_segment) else {
            debug!(folder = owner_segment, file = %file.name, "folder is not a project, ignoring file");
            return Ok(Ingest::Ignored);
        };

        let slot = self.slot_for(&descriptor, seq).await;

        match classify(file) {
            Asset::Description => {
                let raw = text::load_text(self.store.as_ref(), &file.id).await?;
                slot.lock()
                    .await
                    .overwrite_description(seq, text::clean_lines(&raw));
                Ok(Ingest::Description)
            }
            Asset::Link => {
                let button = text::load_link(self.store.as_ref(), &file.id).await?;
                slot.lock().await.overwrite_buttons(seq, button);
                Ok(Ingest::Link)
            }
            Asset::Video => {
                let url = self.urls.video_url(&file.id);
                slot.lock().await.videos.push((seq, url));
                Ok(Ingest::Video)
            }
            Asset::Image => {
                let url = self.urls.image_url(&file.id);
                slot.lock().await.images.push((seq, url));
                Ok(Ingest::Image)
            }
            Asset::Unclassified => {
                debug!(project = %descriptor.name, file = %file.name, "unclassified file dropped");
                Ok(Ingest::Unclassified)
            }
        }
    }

    /// Find the slot for a project, creating it on first sight
    ///
    /// Name, dates and technologies come from the earliest discovered
    /// folder, even when a later one got here first.
    async fn slot_for(&self, descriptor: &ProjectDescriptor, seq: u64) -> Arc<Mutex<ProjectSlot>> {
        let existing = self.projects.read().await.get(&descriptor.name).cloned();
        let slot = match existing {
            Some(slot) => slot,
            None => {
                let mut projects = self.projects.write().await;
                projects
                    .entry(descriptor.name.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(ProjectSlot::new(descriptor, seq))))
                    .clone()
            }
        };

        {
            let mut guard = slot.lock().await;
            if seq < guard.first_seq {
                guard.reseed(descriptor, seq);
            }
        }
        slot
    }

    /// Number of distinct projects seen so far
    pub async fn len(&self) -> usize {
        self.projects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of all records, ordered by first discovery
    pub async fn finish(&self) -> Catalog {
        let slots: Vec<_> = self.projects.read().await.values().cloned().collect();

        let mut finished = Vec::with_capacity(slots.len());
        for slot in slots {
            let guard = slot.lock().await;
            finished.push((guard.first_seq, guard.finish()));
        }
        finished.sort_by_key(|(seq, _)| *seq);
        finished.into_iter().map(|(_, record)| record).collect()
    }
}
