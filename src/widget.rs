use crate::tree_item::ItemHandle;
use std::collections::HashSet;

/// Operations the outliner drives on its hosting tree widget.
pub trait TreeWidget {
    fn is_expanded(&self, item: ItemHandle) -> bool;

    fn set_expansion(&mut self, item: ItemHandle, expanded: bool);

    /// Replaces the selection with exactly `items`.
    fn set_selection(&mut self, items: &[ItemHandle]);

    fn clear_selection(&mut self);

    fn selected_items(&self) -> Vec<ItemHandle>;

    fn request_scroll_into_view(&mut self, item: ItemHandle);

    /// Asks the widget to regenerate its rows from the current forest.
    fn request_refresh(&mut self);
}

/// Headless tree widget: expansion set, ordered selection and pending requests.
#[derive(Debug, Default, Clone)]
pub struct TreeViewState {
    expanded: HashSet<ItemHandle>,
    selected: Vec<ItemHandle>,
    scroll_target: Option<ItemHandle>,
    refresh_requests: usize,
    selection_writes: usize,
}

impl TreeViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain click: selects the row alone, or toggles it when `additive`.
    pub fn click_select(&mut self, item: ItemHandle, additive: bool) {
        if !additive {
            self.selected.clear();
            self.selected.push(item);
            return;
        }
        match self.selected.iter().position(|selected| *selected == item) {
            Some(pos) => {
                self.selected.remove(pos);
            }
            None => self.selected.push(item),
        }
    }

    pub fn toggle_expansion(&mut self, item: ItemHandle) -> bool {
        let expanded = !self.is_expanded(item);
        self.set_expansion(item, expanded);
        expanded
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_selected(&self, item: ItemHandle) -> bool {
        self.selected.contains(&item)
    }

    pub fn take_scroll_request(&mut self) -> Option<ItemHandle> {
        self.scroll_target.take()
    }

    pub fn refresh_requests(&self) -> usize {
        self.refresh_requests
    }

    /// Programmatic selection writes made through [`TreeWidget`].
    pub fn selection_writes(&self) -> usize {
        self.selection_writes
    }

    /// Forgets everything tied to the current forest; used on a full UI replace.
    pub fn reset(&mut self) {
        self.expanded.clear();
        self.selected.clear();
        self.scroll_target = None;
    }
}

impl TreeWidget for TreeViewState {
    fn is_expanded(&self, item: ItemHandle) -> bool {
        self.expanded.contains(&item)
    }

    fn set_expansion(&mut self, item: ItemHandle, expanded: bool) {
        if expanded {
            self.expanded.insert(item);
        } else {
            self.expanded.remove(&item);
        }
    }

    fn set_selection(&mut self, items: &[ItemHandle]) {
        self.selected.clear();
        self.selected.extend_from_slice(items);
        self.selection_writes += 1;
    }

    fn clear_selection(&mut self) {
        self.selected.clear();
        self.selection_writes += 1;
    }

    fn selected_items(&self) -> Vec<ItemHandle> {
        self.selected.clone()
    }

    fn request_scroll_into_view(&mut self, item: ItemHandle) {
        self.scroll_target = Some(item);
    }

    fn request_refresh(&mut self) {
        self.refresh_requests += 1;
    }
}
