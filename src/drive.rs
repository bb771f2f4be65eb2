use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::{CatalogError, Result},
    store::RemoteStore,
    types::{EntryKind, FileContent, RemoteEntry},
};

/// Default endpoint of the Drive v3 REST API
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Mime type Drive uses to mark folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

const PAGE_SIZE: &str = "1000";
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType)";

/// Google Drive backed store
///
/// Uses the Drive v3 REST API with an already-issued OAuth access token:
/// - `files.list` with a `'<id>' in parents` query for folder listings
/// - `files.get?alt=media` for downloads
#[derive(Clone)]
pub struct DriveStore {
    client: Client,
    access_token: String,
    api_base: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListPage {
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    #[serde(default)]
    mime_type: Option<String>,
}

impl From<DriveFile> for RemoteEntry {
    fn from(file: DriveFile) -> Self {
        let kind = if file.mime_type.as_deref() == Some(FOLDER_MIME_TYPE) {
            EntryKind::Folder
        } else {
            EntryKind::File
        };
        let mime_type = match kind {
            EntryKind::Folder => None,
            EntryKind::File => file.mime_type,
        };

        RemoteEntry {
            id: file.id,
            name: file.name,
            kind,
            mime_type,
        }
    }
}

impl DriveStore {
    /// Create a store talking to the public Drive API
    pub fn new(access_token: String) -> Self {
        Self::with_api_base(access_token, DRIVE_API_BASE.to_string())
    }

    /// Create a store talking to a different API endpoint (proxies, tests)
    pub fn with_api_base(access_token: String, api_base: String) -> Self {
        let client = Client::builder()
            .user_agent(concat!("drive-catalog/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            access_token,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.api_base)
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/files/{}", self.api_base, file_id)
    }

    /// Query selecting the non-trashed children of a folder
    fn parent_query(folder_id: &str) -> String {
        format!(
            "'{}' in parents and trashed = false",
            folder_id.replace('\\', "\\\\").replace('\'', "\\'")
        )
    }

    /// Map a non-success response to an error
    ///
    /// Drive reports quota exhaustion as 403 with a `rateLimitExceeded` or
    /// `userRateLimitExceeded` reason, so 403 bodies are inspected.
    async fn status_error(id: &str, response: Response) -> CatalogError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match status {
            StatusCode::NOT_FOUND => CatalogError::NotFound { id: id.to_string() },
            StatusCode::TOO_MANY_REQUESTS => CatalogError::RateLimited { message: body },
            StatusCode::FORBIDDEN if body.contains("RateLimitExceeded") || body.contains("rateLimitExceeded") => {
                CatalogError::RateLimited { message: body }
            }
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => CatalogError::Forbidden {
                id: id.to_string(),
                message: format!("{}: {}", status, body),
            },
            status => CatalogError::InvalidStructure {
                message: format!("Unexpected status {}: {}", status, body),
            },
        }
    }
}

#[async_trait]
impl RemoteStore for DriveStore {
    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteEntry>> {
        let query = Self::parent_query(folder_id);
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("q", query.as_str()),
                ("fields", LIST_FIELDS),
                ("pageSize", PAGE_SIZE),
                ("spaces", "drive"),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            let response = self
                .client
                .get(self.files_url())
                .bearer_auth(&self.access_token)
                .query(&params)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(Self::status_error(folder_id, response).await);
            }

            let page: FileListPage = response.json().await?;
            entries.extend(page.files.into_iter().map(RemoteEntry::from));

            match page.next_page_token {
                Some(token) if !token.is_empty() => {
                    debug!(folder = folder_id, fetched = entries.len(), "following listing page");
                    page_token = Some(token);
                }
                _ => break,
            }
        }

        Ok(entries)
    }

    async fn fetch_content(&self, file_id: &str) -> Result<FileContent> {
        let url = self.file_url(file_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::status_error(file_id, response).await);
        }

        let content = response.bytes().await?;
        Ok(FileContent {
            content,
            source: url,
        })
    }

    fn identifier(&self) -> String {
        format!("drive://{}", self.api_base)
    }
}
