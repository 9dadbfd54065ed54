use indexmap::IndexMap;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::profile::LayoutProfile;

/// Category label to dish fragments, in order of first appearance.
pub type GroupedMenu = IndexMap<String, Vec<String>>;

/// At least one cased character and no lower-case ones.
pub(crate) fn is_upper(text: &str) -> bool {
    !text.chars().any(char::is_lowercase) && text.chars().any(char::is_uppercase)
}

pub fn is_heading(fragment: &str, profile: &LayoutProfile) -> bool {
    (is_upper(fragment) && !fragment.contains(profile.currency_marker))
        || profile
            .heading_markers
            .iter()
            .any(|marker| fragment.contains(marker.as_str()))
}

pub fn is_excluded(fragment: &str, profile: &LayoutProfile) -> bool {
    profile
        .exclusion_markers
        .iter()
        .any(|marker| fragment.contains(marker.as_str()))
}

/// Partitions the fragment sequence into categories. The document must open
/// with a heading; a dish fragment before any heading rejects it.
pub fn group(fragments: &[String], profile: &LayoutProfile) -> Result<GroupedMenu> {
    let mut menu = GroupedMenu::new();
    let mut current: Option<usize> = None;

    for (index, fragment) in fragments.iter().enumerate() {
        if is_heading(fragment, profile) {
            let entry = menu.entry(fragment.clone());
            current = Some(entry.index());
            entry.or_default();
            continue;
        }
        if is_excluded(fragment, profile) {
            debug!(index, fragment = %fragment, "dropping excluded fragment");
            continue;
        }
        let Some(slot) = current else {
            return Err(PipelineError::NoOpenCategory {
                index,
                fragment: fragment.clone(),
            });
        };
        if let Some((_, dishes)) = menu.get_index_mut(slot) {
            dishes.push(fragment.clone());
        }
    }

    Ok(menu)
}
