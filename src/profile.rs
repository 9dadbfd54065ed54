use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Literal, layout-specific knowledge about one family of menus: what marks
/// a heading, which fragments are noise and which categories need repair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutProfile {
    pub currency_marker: char,
    /// Tokens that make a fragment a heading even when it is not upper-case
    /// or carries a price.
    pub heading_markers: Vec<String>,
    /// Case-sensitive substrings of fragments that are dropped entirely.
    pub exclusion_markers: Vec<String>,
    pub resolvers: Vec<ResolverSpec>,
}

/// One special-case repair applied to the grouped menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolverSpec {
    /// A heading naming two sibling sub-categories that share one dish list.
    CompoundHeading {
        label: String,
        separator: String,
        merged_label: String,
        shared_tail: usize,
    },
    /// Categories whose dish boundaries are re-segmented by the remote oracle.
    RemoteSplit {
        pattern: String,
        target: SplitTarget,
    },
    /// Categories emitted as alternating name and description lines.
    RowPairs { labels: Vec<String> },
    /// A sentinel heading after which every "heading" is really a dish name.
    RangeCategory { marker: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitTarget {
    /// The first parsed item is the new category label, the rest its dishes.
    FirstItemLabel,
    /// All parsed items become the dishes of a fixed label.
    Fixed(String),
}

impl LayoutProfile {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Profile {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|err| ConfigError::Profile {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }
}

impl Default for LayoutProfile {
    /// The sports-bar menu layout the heuristics were written against.
    fn default() -> Self {
        Self {
            currency_marker: '$',
            heading_markers: vec!["kcal".to_string()],
            exclusion_markers: vec!["served".to_string(), "Contains".to_string()],
            resolvers: vec![
                ResolverSpec::CompoundHeading {
                    label: "JUMBO CHICKEN WINGS OR TENDERS".to_string(),
                    separator: " OR ".to_string(),
                    merged_label: "JUMBO CHICKEN".to_string(),
                    shared_tail: 2,
                },
                ResolverSpec::RemoteSplit {
                    pattern: "SAUCE|RUB".to_string(),
                    target: SplitTarget::FirstItemLabel,
                },
                ResolverSpec::RemoteSplit {
                    pattern: "FLIGHT".to_string(),
                    target: SplitTarget::Fixed("FLIGHTS".to_string()),
                },
                ResolverSpec::RowPairs {
                    labels: vec!["COCKTAILS".to_string(), "ZERO PROOF".to_string()],
                },
                ResolverSpec::RangeCategory {
                    marker: "(PRICE VARIES)".to_string(),
                },
            ],
        }
    }
}
