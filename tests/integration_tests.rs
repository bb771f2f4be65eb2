/// Integration tests for the drive catalog crawler
///
/// Most tests run against an in-memory store; the Drive backend is
/// exercised against a local mockito server.

use drive_catalog::{
    Cache, CachedStore, Catalog, CatalogError, CrawlOptions, Crawler, DiskCache,
    DriveStore, FileContent, JsonFileSink, ProjectRecord, RemoteEntry, RemoteStore,
};
use mockito::Matcher;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

// Mock store for testing without network access
struct MockDrive {
    folders: HashMap<String, Vec<RemoteEntry>>,
    files: HashMap<String, Vec<u8>>,
}

impl MockDrive {
    fn new() -> Self {
        Self {
            folders: HashMap::new(),
            files: HashMap::new(),
        }
    }

    fn add_folder(&mut self, id: &str, entries: Vec<RemoteEntry>) {
        self.folders.insert(id.to_string(), entries);
    }

    fn add_file(&mut self, id: &str, content: &[u8]) {
        self.files.insert(id.to_string(), content.to_vec());
    }

    fn into_store(self) -> Arc<dyn RemoteStore> {
        Arc::new(self)
    }
}

#[async_trait::async_trait]
impl RemoteStore for MockDrive {
    async fn list_children(&self, folder_id: &str) -> drive_catalog::Result<Vec<RemoteEntry>> {
        self.folders
            .get(folder_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                id: folder_id.to_string(),
            })
    }

    async fn fetch_content(&self, file_id: &str) -> drive_catalog::Result<FileContent> {
        self.files
            .get(file_id)
            .map(|content| FileContent {
                content: bytes::Bytes::from(content.clone()),
                source: file_id.to_string(),
            })
            .ok_or_else(|| CatalogError::NotFound {
                id: file_id.to_string(),
            })
    }

    fn identifier(&self) -> String {
        "mock".to_string()
    }
}

fn alpha_drive() -> MockDrive {
    let mut drive = MockDrive::new();
    drive.add_folder(
        "root",
        vec![RemoteEntry::folder("alpha", "Alpha|2021-2022|Go-Rust")],
    );
    drive.add_folder(
        "alpha",
        vec![
            RemoteEntry::file("desc", "Description.txt", "text/plain"),
            RemoteEntry::file("IMGID", "picture.png", "image/png"),
        ],
    );
    drive.add_file("desc", b"Line one.\n\nLine two.\r\n");
    drive
}

fn assert_alpha(catalog: &Catalog) {
    assert_eq!(catalog.len(), 1);
    let record = &catalog[0];
    assert_eq!(record.name, "Alpha");
    assert_eq!(record.start, "2021");
    assert_eq!(record.end, "2022");
    assert_eq!(record.technologies, vec!["Go", "Rust"]);
    assert_eq!(record.description, vec!["Line one.", "Line two."]);
    assert!(record.buttons.is_empty());
    assert_eq!(record.images.len(), 1);
    assert!(record.images[0].contains("IMGID"));
    assert!(record.videos.is_empty());
    assert_eq!(record.image_heading, "Alpha");
    assert!(record.overview);
}

#[tokio::test]
async fn test_end_to_end_single_project() {
    let crawler = Crawler::new(alpha_drive().into_store());
    let output = crawler.crawl("root").await.unwrap();

    assert_alpha(&output.catalog);
    assert!(output.report.is_complete());
    assert_eq!(output.report.folders_listed, 2);
    assert_eq!(output.report.files_seen, 2);
}

#[tokio::test]
async fn test_non_project_folder_contributes_nothing() {
    let mut drive = MockDrive::new();
    drive.add_folder("root", vec![RemoteEntry::folder("plain", "NoPipesHere")]);
    drive.add_folder(
        "plain",
        vec![
            RemoteEntry::file("d", "Description.txt", "text/plain"),
            RemoteEntry::file("i", "a.png", "image/png"),
        ],
    );
    drive.add_file("d", b"ignored");

    let output = Crawler::new(drive.into_store()).crawl("root").await.unwrap();
    assert!(output.catalog.is_empty());
    assert_eq!(output.report.files_ignored, 2);
}

#[tokio::test]
async fn test_non_project_folder_is_still_traversed() {
    let mut drive = MockDrive::new();
    drive.add_folder("root", vec![RemoteEntry::folder("group", "Work")]);
    drive.add_folder(
        "group",
        vec![RemoteEntry::folder("p", "Nested|2018-2019|Python")],
    );
    drive.add_folder("p", vec![RemoteEntry::file("v", "demo.mp4", "video/mp4")]);

    let output = Crawler::new(drive.into_store()).crawl("root").await.unwrap();
    assert_eq!(output.catalog.len(), 1);
    assert_eq!(output.catalog[0].name, "Nested");
    assert_eq!(output.catalog[0].videos.len(), 1);
}

#[tokio::test]
async fn test_folders_sharing_a_name_merge() {
    // Images and the description live in separate folders that both
    // encode the same project, at different depths.
    let mut drive = MockDrive::new();
    drive.add_folder(
        "root",
        vec![
            RemoteEntry::folder("media", "Media"),
            RemoteEntry::folder("text", "Alpha|2021-2022|Go"),
        ],
    );
    drive.add_folder(
        "media",
        vec![RemoteEntry::folder("alpha-media", "Alpha|2021-2022|Go")],
    );
    drive.add_folder(
        "alpha-media",
        vec![
            RemoteEntry::file("i1", "1.png", "image/png"),
            RemoteEntry::file("v1", "1.mp4", "video/mp4"),
            RemoteEntry::file("i2", "2.jpg", "image/jpeg"),
        ],
    );
    drive.add_folder(
        "text",
        vec![
            RemoteEntry::file("d", "Description.txt", "text/plain"),
            RemoteEntry::file("l", "Link.txt", "text/plain"),
        ],
    );
    drive.add_file("d", b"About alpha");
    drive.add_file("l", b"https://alpha.example\n");

    let output = Crawler::new(drive.into_store()).crawl("root").await.unwrap();
    assert_eq!(output.catalog.len(), 1);
    let record = &output.catalog[0];
    assert_eq!(record.description, vec!["About alpha"]);
    assert_eq!(record.buttons.len(), 1);
    assert_eq!(record.buttons[0].text, "link");
    assert_eq!(record.buttons[0].link, "https://alpha.example");
    assert_eq!(record.images.len(), 2);
    assert!(record.images[0].contains("i1"));
    assert!(record.images[1].contains("i2"));
    assert_eq!(record.videos.len(), 1);
}

#[tokio::test]
async fn test_visitation_order_does_not_change_membership() {
    fn drive(reversed: bool) -> Arc<dyn RemoteStore> {
        let mut drive = MockDrive::new();
        let mut children = vec![
            RemoteEntry::folder("x", "Shared|2020-2021|A"),
            RemoteEntry::folder("y", "Shared|2020-2021|A"),
        ];
        if reversed {
            children.reverse();
        }
        drive.add_folder("root", children);
        drive.add_folder("x", vec![RemoteEntry::file("ix", "x.png", "image/png")]);
        drive.add_folder("y", vec![RemoteEntry::file("vy", "y.mp4", "video/mp4")]);
        drive.into_store()
    }

    for reversed in [false, true] {
        let output = Crawler::new(drive(reversed)).crawl("root").await.unwrap();
        assert_eq!(output.catalog.len(), 1);
        assert_eq!(output.catalog[0].name, "Shared");
        assert_eq!(output.catalog[0].images.len(), 1);
        assert_eq!(output.catalog[0].videos.len(), 1);
    }
}

#[tokio::test]
async fn test_sibling_survives_listing_failure() {
    let mut drive = MockDrive::new();
    drive.add_folder(
        "root",
        vec![
            RemoteEntry::folder("gone", "Broken|2020-2021|X"),
            RemoteEntry::folder("ok", "Working|2020-2021|Y"),
        ],
    );
    drive.add_folder("ok", vec![RemoteEntry::file("i", "a.png", "image/png")]);

    let output = Crawler::new(drive.into_store()).crawl("root").await.unwrap();
    assert_eq!(output.catalog.len(), 1);
    assert_eq!(output.catalog[0].name, "Working");
    assert_eq!(output.report.list_failures.len(), 1);
    assert_eq!(output.report.list_failures[0].folder_id, "gone");
}

fn wide_drive() -> Arc<dyn RemoteStore> {
    let mut drive = MockDrive::new();
    let mut root = Vec::new();
    for p in 0..6 {
        let id = format!("p{}", p);
        root.push(RemoteEntry::folder(&id, format!("Project {}|201{}-202{}|Rust", p % 3, p, p)));

        let mut files = vec![
            RemoteEntry::file(format!("{}-d", id), "Description.txt", "text/plain"),
            RemoteEntry::file(format!("{}-i", id), "shot.png", "image/png"),
            RemoteEntry::folder(format!("{}-sub", id), format!("Project {}|x-y|Go", p % 3)),
        ];
        if p % 2 == 0 {
            files.push(RemoteEntry::file(format!("{}-v", id), "clip.mp4", "video/mp4"));
        }
        drive.add_folder(&id, files);
        drive.add_folder(
            &format!("{}-sub", id),
            vec![
                RemoteEntry::file(format!("{}-sub-i", id), "more.jpg", "image/jpeg"),
                RemoteEntry::file(format!("{}-sub-l", id), "link.txt", "text/plain"),
            ],
        );
        drive.add_file(&format!("{}-d", id), format!("Description of {}", p).as_bytes());
        drive.add_file(&format!("{}-sub-l", id), format!("https://{}.example", p).as_bytes());
    }
    drive.add_folder("root", root);
    drive.into_store()
}

#[tokio::test]
async fn test_concurrent_crawl_matches_sequential() {
    let sequential = Crawler::new(wide_drive()).crawl("root").await.unwrap();

    for concurrency in [2, 4, 16] {
        let options = CrawlOptions {
            concurrency,
            ..CrawlOptions::default()
        };
        let concurrent = Crawler::with_options(wide_drive(), options)
            .crawl("root")
            .await
            .unwrap();
        assert_eq!(concurrent.catalog, sequential.catalog, "concurrency {}", concurrency);
    }

    // Three keys, each fed by two top-level folders and their sub-folders.
    assert_eq!(sequential.catalog.len(), 3);
    for record in &sequential.catalog {
        assert_eq!(record.images.len(), 4);
        assert_eq!(record.buttons.len(), 1);
    }
    // Last discovered description wins: p3, p4, p5 come after p0, p1, p2.
    assert_eq!(sequential.catalog[0].description, vec!["Description of 3"]);
    assert_eq!(sequential.catalog[0].buttons[0].link, "https://3.example");
}

#[tokio::test]
async fn test_catalog_written_as_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("projects.json");
    let sink = JsonFileSink::new(&path);

    let report = Crawler::new(alpha_drive().into_store())
        .crawl_into("root", &sink)
        .await
        .unwrap();
    assert!(report.is_complete());

    let written = tokio::fs::read_to_string(&path).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();
    let records = value.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["imageHeading"], "Alpha");
    assert_eq!(records[0]["overview"], true);
    assert_eq!(records[0]["buttons"], serde_json::json!([]));

    let catalog: Vec<ProjectRecord> = serde_json::from_value(value).unwrap();
    assert_alpha(&catalog);
}

#[tokio::test]
async fn test_disk_cache_serves_second_crawl() {
    let temp_dir = TempDir::new().unwrap();
    let cache_path = temp_dir.path().to_path_buf();

    struct Forward(Arc<dyn RemoteStore>);

    #[async_trait::async_trait]
    impl RemoteStore for Forward {
        async fn list_children(&self, id: &str) -> drive_catalog::Result<Vec<RemoteEntry>> {
            self.0.list_children(id).await
        }
        async fn fetch_content(&self, id: &str) -> drive_catalog::Result<FileContent> {
            self.0.fetch_content(id).await
        }
        fn identifier(&self) -> String {
            self.0.identifier()
        }
    }

    let cache = Arc::new(DiskCache::new(cache_path.clone()).await.unwrap());
    let store = CachedStore::new(Forward(alpha_drive().into_store()), cache.clone());
    let first = Crawler::new(Arc::new(store)).crawl("root").await.unwrap();
    assert_alpha(&first.catalog);
    assert!(cache.get("content:desc").await.unwrap().is_some());

    // Same tree, but the description can no longer be downloaded.
    let mut offline = alpha_drive();
    offline.files.clear();
    let cache2 = Arc::new(DiskCache::new(cache_path).await.unwrap());
    let store2 = CachedStore::new(Forward(offline.into_store()), cache2);
    let second = Crawler::new(Arc::new(store2)).crawl("root").await.unwrap();
    assert_eq!(second.catalog, first.catalog);
    assert!(second.report.fetch_failures.is_empty());
}

// ----------------------------------------------------------------------------
// Drive backend
// ----------------------------------------------------------------------------

fn parents_query(folder_id: &str) -> Matcher {
    Matcher::UrlEncoded(
        "q".to_string(),
        format!("'{}' in parents and trashed = false", folder_id),
    )
}

#[tokio::test]
async fn test_drive_listing_follows_pages() {
    let mut server = mockito::Server::new_async().await;

    let first = server
        .mock("GET", "/files")
        .match_query(Matcher::AllOf(vec![
            parents_query("root"),
            Matcher::Regex("spaces=drive$".to_string()),
        ]))
        .match_header("authorization", "Bearer secret")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"nextPageToken": "page2", "files": [
                {"id": "f1", "name": "Alpha|2021-2022|Go", "mimeType": "application/vnd.google-apps.folder"}
            ]}"#,
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", "/files")
        .match_query(Matcher::AllOf(vec![
            parents_query("root"),
            Matcher::UrlEncoded("pageToken".to_string(), "page2".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"files": [{"id": "i1", "name": "a.png", "mimeType": "image/png"}]}"#)
        .create_async()
        .await;

    let store = DriveStore::with_api_base("secret".to_string(), server.url());
    let entries = store.list_children("root").await.unwrap();

    assert_eq!(
        entries,
        vec![
            RemoteEntry::folder("f1", "Alpha|2021-2022|Go"),
            RemoteEntry::file("i1", "a.png", "image/png"),
        ]
    );
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_drive_status_mapping() {
    let mut server = mockito::Server::new_async().await;

    let _missing = server
        .mock("GET", "/files")
        .match_query(parents_query("missing"))
        .with_status(404)
        .create_async()
        .await;
    let _denied = server
        .mock("GET", "/files")
        .match_query(parents_query("denied"))
        .with_status(403)
        .with_body(r#"{"error": {"errors": [{"reason": "insufficientFilePermissions"}]}}"#)
        .create_async()
        .await;
    let _quota = server
        .mock("GET", "/files")
        .match_query(parents_query("quota"))
        .with_status(403)
        .with_body(r#"{"error": {"errors": [{"reason": "userRateLimitExceeded"}]}}"#)
        .create_async()
        .await;
    let _busy = server
        .mock("GET", "/files")
        .match_query(parents_query("busy"))
        .with_status(429)
        .create_async()
        .await;
    let _broken = server
        .mock("GET", "/files")
        .match_query(parents_query("broken"))
        .with_status(500)
        .create_async()
        .await;

    let store = DriveStore::with_api_base("t".to_string(), server.url());

    let err = store.list_children("missing").await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { ref id } if id == "missing"));
    assert!(!err.is_transient());

    let err = store.list_children("denied").await.unwrap_err();
    assert!(matches!(err, CatalogError::Forbidden { .. }));
    assert!(!err.is_transient());

    let err = store.list_children("quota").await.unwrap_err();
    assert!(matches!(err, CatalogError::RateLimited { .. }));
    assert!(err.is_transient());

    let err = store.list_children("busy").await.unwrap_err();
    assert!(matches!(err, CatalogError::RateLimited { .. }));

    let err = store.list_children("broken").await.unwrap_err();
    assert!(matches!(err, CatalogError::InvalidStructure { .. }));
}

#[tokio::test]
async fn test_drive_end_to_end_crawl() {
    let mut server = mockito::Server::new_async().await;

    let _root = server
        .mock("GET", "/files")
        .match_query(parents_query("root"))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"files": [
                {"id": "alpha", "name": "Alpha|2021-2022|Go-Rust", "mimeType": "application/vnd.google-apps.folder"},
                {"id": "notes", "name": "notes.txt", "mimeType": "text/plain"}
            ]}"#,
        )
        .create_async()
        .await;
    let _alpha = server
        .mock("GET", "/files")
        .match_query(parents_query("alpha"))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"files": [
                {"id": "desc", "name": "Description.txt", "mimeType": "text/plain"},
                {"id": "IMGID", "name": "picture.png", "mimeType": "image/png"}
            ]}"#,
        )
        .create_async()
        .await;
    let download = server
        .mock("GET", "/files/desc")
        .match_query(Matcher::UrlEncoded("alt".to_string(), "media".to_string()))
        .with_status(200)
        .with_body("Line one.\n\nLine two.\r\n")
        .create_async()
        .await;

    let store = Arc::new(DriveStore::with_api_base("t".to_string(), server.url()));
    let output = Crawler::new(store).crawl("root").await.unwrap();

    assert_alpha(&output.catalog);
    assert_eq!(
        output.catalog[0].images,
        vec!["https://drive.google.com/thumbnail?id=IMGID&sz=w1000"]
    );
    assert_eq!(output.report.files_ignored, 1);
    download.assert_async().await;
}

#[tokio::test]
async fn test_drive_download_missing_file() {
    let mut server = mockito::Server::new_async().await;
    let _gone = server
        .mock("GET", "/files/gone")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let store = DriveStore::with_api_base("t".to_string(), server.url());
    assert!(matches!(
        store.fetch_content("gone").await,
        Err(CatalogError::NotFound { .. })
    ));
}

#[test]
fn test_crawl_with_blocking_executor() {
    let output = tokio_test::block_on(async {
        Crawler::new(alpha_drive().into_store()).crawl("root").await
    });
    assert_alpha(&output.unwrap().catalog);
}
