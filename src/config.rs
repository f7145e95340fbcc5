//! Render configuration.
//!
//! Every field has a default, so `{}` is a valid configuration. The page
//! geometry itself is fixed (US Letter, zero margin) and is not configurable.

use serde::{Deserialize, Serialize};

use crate::render::Metadata;

/// Top-level options for one render.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Title/author/subject written to the document info dictionary.
    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Knobs for the layout engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Smallest size shrink-to-fit may reduce text to before truncating.
    #[serde(default = "default_min_font_size")]
    pub min_font_size: f64,

    /// When set, moving a cursor past the bottom of a fixed-height box is a
    /// `LayoutInvariant` error instead of a silent clamp.
    #[serde(default)]
    pub strict_cursor: bool,

    #[serde(default)]
    pub pagination: PaginationConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_font_size: default_min_font_size(),
            strict_cursor: false,
            pagination: PaginationConfig::default(),
        }
    }
}

fn default_min_font_size() -> f64 {
    5.0
}

/// Where flowing content stops on a page and resumes on the next one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Distance from the bottom page edge that flowing content may not cross.
    #[serde(default = "default_page_gutter")]
    pub bottom_margin: f64,

    /// Distance from the top page edge where content continues after a break.
    #[serde(default = "default_page_gutter")]
    pub continuation_top: f64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            bottom_margin: default_page_gutter(),
            continuation_top: default_page_gutter(),
        }
    }
}

fn default_page_gutter() -> f64 {
    36.0 // half an inch
}

/// Remote image fetching.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-attempt timeout for remote sources.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts after the first failure.
    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retries() -> u32 {
    2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: RenderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.fetch.retries, 2);
        assert!((config.layout.min_font_size - 5.0).abs() < f64::EPSILON);
        assert!(!config.layout.strict_cursor);
        assert!((config.layout.pagination.bottom_margin - 36.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_override() {
        let config: RenderConfig = serde_json::from_str(
            r#"{ "layout": { "strict_cursor": true, "pagination": { "bottom_margin": 0 } },
                 "metadata": { "title": "Statement" } }"#,
        )
        .unwrap();
        assert!(config.layout.strict_cursor);
        assert_eq!(config.layout.pagination.bottom_margin, 0.0);
        assert_eq!(config.layout.pagination.continuation_top, 36.0);
        assert_eq!(config.metadata.title.as_deref(), Some("Statement"));
    }
}
