use crate::tree_item::{ItemForest, ItemHandle};
use crate::widget::TreeWidget;
use std::collections::HashSet;

/// Structural key of a row: `<typeIndex>_<displayName>` for every row from the root down
/// to `handle`, joined by `/`. Renaming any row on the path changes the key.
pub fn item_key(forest: &ItemForest, handle: ItemHandle) -> Option<String> {
    let item = forest.get(handle)?;
    let mut segments: Vec<String> = forest
        .ancestors(handle)
        .iter()
        .rev()
        .filter_map(|ancestor| forest.get(*ancestor))
        .map(|ancestor| format!("{}_{}", ancestor.kind.index(), ancestor.display_name))
        .collect();
    segments.push(format!("{}_{}", item.kind.index(), item.display_name));
    Some(segments.join("/"))
}

/// Keys of the rows that were expanded when the snapshot was taken.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExpansionSnapshot {
    keys: HashSet<String>,
}

impl ExpansionSnapshot {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

/// Records every expanded row reachable through expanded ancestors. Collapsed subtrees are
/// not descended into.
pub fn snapshot_expansion<W: TreeWidget + ?Sized>(forest: &ItemForest, widget: &W) -> ExpansionSnapshot {
    let mut snapshot = ExpansionSnapshot::default();
    let mut stack: Vec<ItemHandle> = forest.roots().to_vec();
    while let Some(handle) = stack.pop() {
        if !widget.is_expanded(handle) {
            continue;
        }
        if let Some(key) = item_key(forest, handle) {
            snapshot.keys.insert(key);
        }
        stack.extend_from_slice(forest.children(handle));
    }
    snapshot
}

/// Re-expands rows of a freshly built forest whose key was saved, descending only into
/// matched rows. An empty snapshot expands the roots when `expand_roots_when_empty` is set.
/// Returns the number of rows expanded.
pub fn restore_expansion<W: TreeWidget + ?Sized>(
    forest: &ItemForest,
    widget: &mut W,
    saved: &ExpansionSnapshot,
    expand_roots_when_empty: bool,
) -> usize {
    if saved.is_empty() {
        if !expand_roots_when_empty {
            return 0;
        }
        for root in forest.roots() {
            widget.set_expansion(*root, true);
        }
        return forest.roots().len();
    }
    let mut restored = 0;
    let mut stack: Vec<ItemHandle> = forest.roots().to_vec();
    while let Some(handle) = stack.pop() {
        let matched = item_key(forest, handle).is_some_and(|key| saved.contains(&key));
        if !matched {
            continue;
        }
        widget.set_expansion(handle, true);
        restored += 1;
        stack.extend_from_slice(forest.children(handle));
    }
    restored
}

/// Structural keys of the selected rows, in selection order.
pub fn snapshot_selection<W: TreeWidget + ?Sized>(forest: &ItemForest, widget: &W) -> Vec<String> {
    widget.selected_items().into_iter().filter_map(|handle| item_key(forest, handle)).collect()
}

/// Selects the first row of `forest` matching each saved key. Returns the rows selected.
pub fn restore_selection<W: TreeWidget + ?Sized>(
    forest: &ItemForest,
    widget: &mut W,
    saved: &[String],
) -> Vec<ItemHandle> {
    if saved.is_empty() {
        return Vec::new();
    }
    let keyed: Vec<(String, ItemHandle)> =
        forest.handles().filter_map(|handle| item_key(forest, handle).map(|key| (key, handle))).collect();
    let mut selected = Vec::with_capacity(saved.len());
    for key in saved {
        let found = keyed.iter().find(|(candidate, _)| candidate == key).map(|(_, handle)| *handle);
        if let Some(handle) = found.filter(|handle| !selected.contains(handle)) {
            selected.push(handle);
        }
    }
    widget.set_selection(&selected);
    selected
}
