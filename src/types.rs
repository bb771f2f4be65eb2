use serde::{Deserialize, Serialize};

/// Raw bytes of a file fetched from the remote store
#[derive(Debug, Clone)]
pub struct FileContent {
    /// The raw bytes of the file
    pub content: bytes::Bytes,
    /// Where the bytes came from (request URL, cache key, ...)
    pub source: String,
}

/// Kind of a remote entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    File,
}

/// One item of a folder listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Opaque identifier assigned by the store
    pub id: String,
    /// Display name
    pub name: String,
    pub kind: EntryKind,
    /// Content type; only meaningful for files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl RemoteEntry {
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: EntryKind::Folder,
            mime_type: None,
        }
    }

    pub fn file(
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: EntryKind::File,
            mime_type: Some(mime_type.into()),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

/// A folder waiting to be listed, with the display-name chain leading to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    pub folder_id: String,
    /// `/`-joined display names from the crawl root; empty for the root
    pub logical_path: String,
}

impl QueueItem {
    pub fn root(folder_id: impl Into<String>) -> Self {
        Self {
            folder_id: folder_id.into(),
            logical_path: String::new(),
        }
    }

    /// Queue item for a sub-folder of this one
    pub fn child(&self, entry: &RemoteEntry) -> Self {
        Self {
            folder_id: entry.id.clone(),
            logical_path: format!("{}/{}", self.logical_path, entry.name),
        }
    }

    /// Display name of this folder, i.e. the last segment of the logical path
    pub fn owner_segment(&self) -> &str {
        self.logical_path
            .rsplit('/')
            .next()
            .unwrap_or(self.logical_path.as_str())
    }
}

/// Project fields decoded from a folder name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    pub name: String,
    pub start: String,
    pub end: String,
    pub technologies: Vec<String>,
}

/// A labelled link shown with a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub text: String,
    pub link: String,
}

/// One catalog entry; field names are part of the output format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub name: String,
    pub start: String,
    pub end: String,
    pub technologies: Vec<String>,
    pub description: Vec<String>,
    pub buttons: Vec<Button>,
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub image_heading: String,
    pub overview: bool,
}

impl ProjectRecord {
    /// Fresh record with no assets, seeded from a parsed folder name
    pub fn from_descriptor(descriptor: &ProjectDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            start: descriptor.start.clone(),
            end: descriptor.end.clone(),
            technologies: descriptor.technologies.clone(),
            description: Vec::new(),
            buttons: Vec::new(),
            images: Vec::new(),
            videos: Vec::new(),
            image_heading: descriptor.name.clone(),
            overview: true,
        }
    }
}

/// Finished crawl output, in first-created order
pub type Catalog = Vec<ProjectRecord>;
