use serde::{Deserialize, Serialize};

use crate::types::ProjectDescriptor;

/// What to do with technology tokens that are empty after trimming,
/// e.g. the one produced by a trailing dash in `"Go-Rust-"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnologyPolicy {
    #[default]
    KeepEmpty,
    DropEmpty,
}

/// Folder name decoder
///
/// A project folder is named `"<name>|<start>-<end>|<tech1>-<tech2>-..."`.
/// Folders whose names do not follow this shape are not projects; parsing
/// returns `None` for them and the crawler still descends into them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameParser {
    policy: TechnologyPolicy,
}

impl NameParser {
    pub fn new(policy: TechnologyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> TechnologyPolicy {
        self.policy
    }

    /// Decode a folder display name into a project descriptor
    pub fn parse(&self, folder_name: &str) -> Option<ProjectDescriptor> {
        let segments: Vec<&str> = folder_name.split('|').collect();
        let [name, dates, technologies] = segments.as_slice() else {
            return None;
        };

        let dates: Vec<&str> = dates.split('-').collect();
        let [start, end] = dates.as_slice() else {
            return None;
        };

        let technologies = technologies
            .split('-')
            .map(str::trim)
            .filter(|tech| self.policy == TechnologyPolicy::KeepEmpty || !tech.is_empty())
            .map(String::from)
            .collect();

        Some(ProjectDescriptor {
            name: name.trim().to_string(),
            start: start.trim().to_string(),
            end: end.trim().to_string(),
            technologies,
        })
    }
}

/// Parse with the default policy
pub fn parse(folder_name: &str) -> Option<ProjectDescriptor> {
    NameParser::default().parse(folder_name)
}
