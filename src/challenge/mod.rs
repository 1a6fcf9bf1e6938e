//! Challenge profiles: static metadata about each vulnerable MCP server.

pub mod catalog;
pub mod prompt;

pub use catalog::BuiltinCatalog;

use serde::Serialize;
use strum::{Display, EnumString};

use crate::mcp::Endpoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A tool the challenge server is known to expose.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub params: Vec<String>,
}

/// A resource the challenge server is known to expose, listed or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSummary {
    pub uri: String,
    pub description: String,
}

impl ResourceSummary {
    /// Parse the `"uri - description"` catalog form.
    pub fn parse(entry: &str) -> Self {
        match entry.split_once(" - ") {
            Some((uri, description)) => Self {
                uri: uri.trim().to_string(),
                description: description.trim().to_string(),
            },
            None => Self {
                uri: entry.trim().to_string(),
                description: String::new(),
            },
        }
    }
}

/// Immutable description of one challenge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeProfile {
    pub id: u32,
    pub name: String,
    pub difficulty: Difficulty,
    pub endpoint: Endpoint,
    pub description: String,
    pub tools: Vec<ToolSummary>,
    pub resources: Vec<ResourceSummary>,
    pub objectives: Vec<String>,
    pub hints: Vec<String>,
}

impl ChallengeProfile {
    /// Port of the endpoint URL, when it names one.
    pub fn port(&self) -> Option<u16> {
        reqwest::Url::parse(&self.endpoint.url)
            .ok()
            .and_then(|url| url.port_or_known_default())
    }

    pub fn tool(&self, name: &str) -> Option<&ToolSummary> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// One-line heading, e.g. `Challenge 3: Excessive Permission Scope (Easy)`.
    pub fn title(&self) -> String {
        format!("Challenge {}: {} ({})", self.id, self.name, self.difficulty)
    }
}

/// Read-only lookup of challenge profiles by small integer id.
pub trait ProfileSource: Send + Sync {
    fn lookup(&self, id: u32) -> Option<ChallengeProfile>;

    /// All known ids, ascending.
    fn ids(&self) -> Vec<u32>;

    fn all(&self) -> Vec<ChallengeProfile> {
        self.ids().into_iter().filter_map(|id| self.lookup(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_summary_splits_uri_and_description() {
        let summary = ResourceSummary::parse("internal://credentials - Hidden resource");
        assert_eq!(summary.uri, "internal://credentials");
        assert_eq!(summary.description, "Hidden resource");

        let bare = ResourceSummary::parse("files://public");
        assert_eq!(bare.uri, "files://public");
        assert!(bare.description.is_empty());
    }

    #[test]
    fn difficulty_parses_from_catalog_text() {
        assert_eq!("Hard".parse::<Difficulty>().ok(), Some(Difficulty::Hard));
        assert_eq!(Difficulty::Medium.to_string(), "Medium");
    }
}
