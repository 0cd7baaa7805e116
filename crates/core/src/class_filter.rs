//! Mapping of user-selected class names onto a model's class-index space.

use std::collections::{BTreeMap, HashSet};

/// A model's class table: integer class index to class name.
pub type ClassNames = BTreeMap<u32, String>;

/// Resolve a class-name selection against a model's class table.
///
/// Returns `None` when no filtering should be applied (selection absent or
/// empty). Otherwise returns the ascending indices whose name appears in the
/// selection. Unknown names are dropped; if none of them are known the
/// result is an empty filter, so the model reports nothing.
pub fn resolve_class_indices(selection: Option<&[String]>, names: &ClassNames) -> Option<Vec<u32>> {
    let selection = selection.filter(|s| !s.is_empty())?;
    let wanted: HashSet<&str> = selection.iter().map(|s| s.trim()).collect();

    let indices: Vec<u32> = names
        .iter()
        .filter(|(_, name)| wanted.contains(name.as_str()))
        .map(|(idx, _)| *idx)
        .collect();

    if indices.len() < wanted.len() {
        tracing::debug!(
            requested = wanted.len(),
            resolved = indices.len(),
            "Some selected classes are unknown to the model and were ignored"
        );
    }

    Some(indices)
}
