use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{
    crawler::CrawlOptions,
    drive::DRIVE_API_BASE,
    error::{CatalogError, Result},
    name::TechnologyPolicy,
};

pub const ENV_ROOT_ID: &str = "DRIVE_ROOT_ID";
pub const ENV_ACCESS_TOKEN: &str = "DRIVE_ACCESS_TOKEN";
pub const ENV_OUTPUT: &str = "DRIVE_CATALOG_OUTPUT";

/// Crawl configuration
///
/// Values are layered: an optional TOML file, then environment variables,
/// then whatever the caller (usually the CLI) sets explicitly.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CrawlConfig {
    pub root_folder_id: Option<String>,
    pub access_token: Option<String>,
    pub output: PathBuf,
    pub concurrency: usize,
    pub deadline_secs: Option<u64>,
    pub partial_on_deadline: bool,
    pub api_base: String,
    pub cache_dir: Option<PathBuf>,
    pub drop_empty_technologies: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            root_folder_id: None,
            access_token: None,
            output: PathBuf::from("projects.json"),
            concurrency: 1,
            deadline_secs: None,
            partial_on_deadline: false,
            api_base: DRIVE_API_BASE.to_string(),
            cache_dir: None,
            drop_empty_technologies: false,
        }
    }
}

impl CrawlConfig {
    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CatalogError::InvalidConfig {
            message: e.to_string(),
        })
    }

    /// Read a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CatalogError::InvalidConfig {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml(&text)
    }

    /// Override values with the `DRIVE_*` environment variables that are set
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| var(key).filter(|value: &String| !value.is_empty());

        if let Some(root) = non_empty(ENV_ROOT_ID) {
            self.root_folder_id = Some(root);
        }
        if let Some(token) = non_empty(ENV_ACCESS_TOKEN) {
            self.access_token = Some(token);
        }
        if let Some(output) = non_empty(ENV_OUTPUT) {
            self.output = PathBuf::from(output);
        }
    }

    /// Check that a crawl can start with this configuration
    pub fn validate(&self) -> Result<()> {
        let missing = |what: &str| CatalogError::InvalidConfig {
            message: format!("{} is not set", what),
        };

        if self.root_folder_id.as_deref().map_or(true, str::is_empty) {
            return Err(missing("root folder id"));
        }
        if self.access_token.as_deref().map_or(true, str::is_empty) {
            return Err(missing("access token"));
        }
        if self.concurrency == 0 {
            return Err(CatalogError::InvalidConfig {
                message: "concurrency must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn technology_policy(&self) -> TechnologyPolicy {
        if self.drop_empty_technologies {
            TechnologyPolicy::DropEmpty
        } else {
            TechnologyPolicy::KeepEmpty
        }
    }

    pub fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            concurrency: self.concurrency,
            deadline: self.deadline_secs.map(Duration::from_secs),
            partial_on_deadline: self.partial_on_deadline,
            technology_policy: self.technology_policy(),
            ..CrawlOptions::default()
        }
    }
}
