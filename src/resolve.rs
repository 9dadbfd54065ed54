//! Special-case repairs over a grouped menu.
//!
//! Every resolver reads the grouped menu without mutating it and describes its
//! rewrite as a [`Patch`]. Resolvers of one document run concurrently; the
//! patches are then merged in a single pass that keeps the original category
//! order. Patches must touch disjoint categories.

use std::collections::{HashMap, HashSet};

use futures::future::try_join_all;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::disambiguate::{Disambiguator, parse_item_list};
use crate::error::{PipelineError, Result};
use crate::group::GroupedMenu;
use crate::profile::{LayoutProfile, ResolverSpec, SplitTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Replacement {
    anchor: String,
    label: String,
    dishes: Vec<String>,
}

/// Rewrite of a grouped menu: categories replaced in place and categories
/// removed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Patch {
    replacements: Vec<Replacement>,
    removals: Vec<String>,
}

impl Patch {
    /// Puts `label` with `dishes` where `anchor` stood. Several replacements
    /// may share one anchor; they keep their order.
    pub fn replace(&mut self, anchor: &str, label: impl Into<String>, dishes: Vec<String>) {
        self.replacements.push(Replacement {
            anchor: anchor.to_string(),
            label: label.into(),
            dishes,
        });
    }

    pub fn remove(&mut self, key: &str) {
        self.removals.push(key.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty() && self.removals.is_empty()
    }

    /// Every category this patch reads over or writes to: anchors, removals
    /// and the labels it emits.
    fn touched(&self) -> HashSet<&str> {
        self.replacements
            .iter()
            .flat_map(|r| [r.anchor.as_str(), r.label.as_str()])
            .chain(self.removals.iter().map(String::as_str))
            .collect()
    }
}

/// Runs every resolver of the profile and merges their patches.
pub async fn resolve(
    menu: GroupedMenu,
    profile: &LayoutProfile,
    oracle: &dyn Disambiguator,
) -> Result<GroupedMenu> {
    let patches = try_join_all(
        profile
            .resolvers
            .iter()
            .map(|spec| run_resolver(spec, &menu, oracle)),
    )
    .await?;
    merge(menu, patches)
}

async fn run_resolver(
    spec: &ResolverSpec,
    menu: &GroupedMenu,
    oracle: &dyn Disambiguator,
) -> Result<Patch> {
    match spec {
        ResolverSpec::CompoundHeading {
            label,
            separator,
            merged_label,
            shared_tail,
        } => compound_heading(menu, label, separator, merged_label, *shared_tail),
        ResolverSpec::RemoteSplit { pattern, target } => {
            remote_split(menu, pattern, target, oracle).await
        }
        ResolverSpec::RowPairs { labels } => row_pairs(menu, labels),
        ResolverSpec::RangeCategory { marker } => Ok(range_category(menu, marker)),
    }
}

/// Applies all patches over `menu`. Patches must not share any category,
/// whether as anchor, removal or emitted label. A replacement whose label
/// names a category no patch touches has its dishes appended to it.
pub fn merge(menu: GroupedMenu, patches: Vec<Patch>) -> Result<GroupedMenu> {
    let mut seen: HashSet<String> = HashSet::new();
    for patch in &patches {
        for key in patch.touched() {
            if !seen.insert(key.to_string()) {
                return Err(PipelineError::PatchConflict {
                    label: key.to_string(),
                });
            }
        }
    }

    let mut anchored: HashMap<String, Vec<Replacement>> = HashMap::new();
    let mut removed: HashSet<String> = HashSet::new();
    for patch in patches {
        for replacement in patch.replacements {
            anchored
                .entry(replacement.anchor.clone())
                .or_default()
                .push(replacement);
        }
        removed.extend(patch.removals);
    }

    let mut out = GroupedMenu::new();
    for (label, dishes) in menu {
        if let Some(replacements) = anchored.remove(&label) {
            for replacement in replacements {
                out.entry(replacement.label)
                    .or_default()
                    .extend(replacement.dishes);
            }
        } else if !removed.contains(&label) {
            out.entry(label).or_default().extend(dishes);
        }
    }
    Ok(out)
}

/// One heading naming two sibling groups ("JUMBO CHICKEN WINGS OR TENDERS")
/// whose last `shared_tail` lines describe both. Every remaining dish is
/// emitted once per sibling name under `merged_label`.
pub fn compound_heading(
    menu: &GroupedMenu,
    label: &str,
    separator: &str,
    merged_label: &str,
    shared_tail: usize,
) -> Result<Patch> {
    let dishes = menu
        .get(label)
        .ok_or_else(|| PipelineError::MissingCategory {
            label: label.to_string(),
        })?;

    let names: Vec<&str> = label
        .strip_prefix(merged_label)
        .unwrap_or(label)
        .trim()
        .split(separator)
        .map(str::trim)
        .collect();
    if names.len() != 2 || names.iter().any(|name| name.is_empty()) {
        return Err(PipelineError::MalformedCompoundLabel {
            label: label.to_string(),
            separator: separator.to_string(),
        });
    }
    if dishes.len() < shared_tail {
        return Err(PipelineError::CompoundTooShort {
            label: label.to_string(),
            len: dishes.len(),
            tail: shared_tail,
        });
    }

    let kept = &dishes[..dishes.len() - shared_tail];
    let merged: Vec<String> = names
        .iter()
        .flat_map(|name| kept.iter().map(move |dish| format!("{name} {dish}")))
        .collect();
    info!(label, merged_label, dishes = merged.len(), "split compound heading");

    let mut patch = Patch::default();
    patch.replace(label, merged_label, merged);
    Ok(patch)
}

/// Joins alternating name and description lines into one dish each.
pub fn row_pairs(menu: &GroupedMenu, labels: &[String]) -> Result<Patch> {
    let mut patch = Patch::default();
    for label in labels {
        let lines = menu
            .get(label)
            .ok_or_else(|| PipelineError::MissingCategory {
                label: label.clone(),
            })?;
        if lines.len() % 2 != 0 {
            return Err(PipelineError::OddRowPairs {
                label: label.clone(),
                len: lines.len(),
            });
        }
        let joined: Vec<String> = lines
            .chunks_exact(2)
            .map(|pair| format!("{} {}", pair[0], pair[1]))
            .collect();
        debug!(label = %label, dishes = joined.len(), "joined row pairs");
        patch.replace(label, label.clone(), joined);
    }
    Ok(patch)
}

/// Folds the sentinel heading carrying `marker`, and every heading after it,
/// into one category named after the sentinel with the marker removed.
pub fn range_category(menu: &GroupedMenu, marker: &str) -> Patch {
    let mut patch = Patch::default();
    let Some(start) = menu.keys().position(|label| label.contains(marker)) else {
        debug!(marker, "no range sentinel in menu");
        return patch;
    };

    let (sentinel, own) = menu
        .get_index(start)
        .map(|(label, dishes)| (label.as_str(), dishes.clone()))
        .unwrap_or_default();
    let mut dishes = own;
    for (label, body) in menu.iter().skip(start + 1) {
        if !body.is_empty() {
            warn!(label = %label, dropped = body.len(), "range entry carried fragments");
        }
        dishes.push(label.clone());
        patch.remove(label);
    }

    let new_label = sentinel.replace(marker, "").trim().to_string();
    info!(label = %new_label, dishes = dishes.len(), "flattened range category");
    patch.replace(sentinel, new_label, dishes);
    patch
}

/// Sends the fragments of every category matching `pattern` to the oracle and
/// rebuilds them from its answer. An unusable answer drops the categories.
pub async fn remote_split(
    menu: &GroupedMenu,
    pattern: &str,
    target: &SplitTarget,
    oracle: &dyn Disambiguator,
) -> Result<Patch> {
    let selector = Regex::new(pattern)?;
    let matched: Vec<(&String, &Vec<String>)> = menu
        .iter()
        .filter(|(label, _)| selector.is_match(label))
        .collect();
    let mut patch = Patch::default();
    let Some((anchor, _)) = matched.first() else {
        debug!(pattern, "no categories to re-split");
        return Ok(patch);
    };
    let items: Vec<String> = matched
        .iter()
        .flat_map(|(_, dishes)| dishes.iter().cloned())
        .collect();
    if items.is_empty() {
        debug!(pattern, "matched categories are empty, nothing to re-split");
        return Ok(patch);
    }

    let response = oracle.disambiguate(&items).await?;
    let mut parsed = parse_item_list(&response);
    info!(pattern, sent = items.len(), received = parsed.len(), "re-split categories");

    for (label, _) in matched.iter().skip(1) {
        patch.remove(label);
    }
    match target {
        SplitTarget::FirstItemLabel => {
            if parsed.len() < 2 {
                warn!(pattern, items = parsed.len(), "no usable label and dishes in answer");
                patch.remove(anchor);
            } else {
                let label = parsed.remove(0);
                patch.replace(anchor, label, parsed);
            }
        }
        SplitTarget::Fixed(label) => {
            if parsed.is_empty() {
                warn!(pattern, label = %label, "answer held no bracketed list");
            }
            patch.replace(anchor, label.clone(), parsed);
        }
    }
    Ok(patch)
}
