use crate::model::{ActorRef, StageId};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_FOREST_GENERATION: AtomicU32 = AtomicU32::new(1);

/// Row kinds of the outliner. Closed set; every call site matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeItemKind {
    Stage,
    ActsFolder,
    EntitiesFolder,
    Act,
    Entity,
}

impl TreeItemKind {
    /// Stable index used in structural keys.
    pub fn index(self) -> u8 {
        match self {
            TreeItemKind::Stage => 0,
            TreeItemKind::ActsFolder => 1,
            TreeItemKind::EntitiesFolder => 2,
            TreeItemKind::Act => 3,
            TreeItemKind::Entity => 4,
        }
    }

    pub fn is_folder(self) -> bool {
        matches!(self, TreeItemKind::ActsFolder | TreeItemKind::EntitiesFolder)
    }

    pub fn label(self) -> &'static str {
        match self {
            TreeItemKind::Stage => "Stage",
            TreeItemKind::ActsFolder => "Acts Folder",
            TreeItemKind::EntitiesFolder => "Entities Folder",
            TreeItemKind::Act => "Act",
            TreeItemKind::Entity => "Entity",
        }
    }
}

/// Handle to an item inside one [`ItemForest`].
///
/// Handles carry the forest generation, so a handle kept across a rebuild resolves to
/// nothing instead of aliasing an unrelated row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemHandle {
    generation: u32,
    index: u32,
}

impl ItemHandle {
    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeItem {
    pub kind: TreeItemKind,
    /// Stage id, Act id or Entity id; -1 for folders.
    pub id: i32,
    pub display_name: String,
    /// Present only for Entity rows nested under an Act.
    pub entity_state: Option<i32>,
    pub actor: Option<ActorRef>,
    pub stage: Option<StageId>,
    pub external_path: Option<String>,
    /// Set when the row stands in for data that no longer resolves.
    pub placeholder: bool,
    parent: Option<ItemHandle>,
    children: Vec<ItemHandle>,
}

impl TreeItem {
    pub fn new(kind: TreeItemKind, display_name: impl Into<String>, id: i32) -> Self {
        Self {
            kind,
            id,
            display_name: display_name.into(),
            entity_state: None,
            actor: None,
            stage: None,
            external_path: None,
            placeholder: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn folder(kind: TreeItemKind, display_name: impl Into<String>) -> Self {
        Self::new(kind, display_name, -1)
    }

    pub fn with_actor(mut self, actor: ActorRef) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn with_stage(mut self, stage: StageId) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_entity_state(mut self, state: i32) -> Self {
        self.entity_state = Some(state);
        self
    }

    pub fn with_external_path(mut self, path: impl Into<String>) -> Self {
        self.external_path = Some(path.into());
        self
    }

    pub fn placeholder(mut self) -> Self {
        self.placeholder = true;
        self
    }

    pub fn parent(&self) -> Option<ItemHandle> {
        self.parent
    }

    pub fn children(&self) -> &[ItemHandle] {
        &self.children
    }

    pub fn has_entity_state(&self) -> bool {
        self.entity_state.is_some()
    }
}

/// Arena owning one generation of the outliner tree.
#[derive(Debug)]
pub struct ItemForest {
    generation: u32,
    items: Vec<TreeItem>,
    roots: Vec<ItemHandle>,
}

impl Default for ItemForest {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemForest {
    pub fn new() -> Self {
        Self {
            generation: NEXT_FOREST_GENERATION.fetch_add(1, Ordering::Relaxed),
            items: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn roots(&self) -> &[ItemHandle] {
        &self.roots
    }

    pub fn push_root(&mut self, mut item: TreeItem) -> ItemHandle {
        item.parent = None;
        let handle = self.insert(item);
        self.roots.push(handle);
        handle
    }

    /// Appends `item` as the last child of `parent`. Returns `None` for a foreign handle.
    pub fn push_child(&mut self, parent: ItemHandle, mut item: TreeItem) -> Option<ItemHandle> {
        self.get(parent)?;
        item.parent = Some(parent);
        let handle = self.insert(item);
        self.items[parent.index as usize].children.push(handle);
        Some(handle)
    }

    fn insert(&mut self, item: TreeItem) -> ItemHandle {
        let handle = ItemHandle { generation: self.generation, index: self.items.len() as u32 };
        self.items.push(item);
        handle
    }

    pub fn contains(&self, handle: ItemHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: ItemHandle) -> Option<&TreeItem> {
        if handle.generation != self.generation {
            return None;
        }
        self.items.get(handle.index as usize)
    }

    pub fn parent(&self, handle: ItemHandle) -> Option<ItemHandle> {
        self.get(handle)?.parent
    }

    pub fn children(&self, handle: ItemHandle) -> &[ItemHandle] {
        self.get(handle).map(TreeItem::children).unwrap_or(&[])
    }

    pub fn kind(&self, handle: ItemHandle) -> Option<TreeItemKind> {
        self.get(handle).map(|item| item.kind)
    }

    /// Every handle in insertion order (parents before children).
    pub fn handles(&self) -> impl Iterator<Item = ItemHandle> + '_ {
        let generation = self.generation;
        (0..self.items.len() as u32).map(move |index| ItemHandle { generation, index })
    }

    /// Strict ancestors of `handle`, nearest first.
    pub fn ancestors(&self, handle: ItemHandle) -> SmallVec<[ItemHandle; 4]> {
        let mut chain = SmallVec::new();
        let mut current = self.parent(handle);
        while let Some(ancestor) = current {
            chain.push(ancestor);
            current = self.parent(ancestor);
        }
        chain
    }

    /// Walks from `handle` (inclusive) towards the root until an item of `kind` is found.
    pub fn find_ancestor_of_kind(&self, handle: ItemHandle, kind: TreeItemKind) -> Option<ItemHandle> {
        let mut current = Some(handle);
        while let Some(candidate) = current {
            let item = self.get(candidate)?;
            if item.kind == kind {
                return Some(candidate);
            }
            current = item.parent;
        }
        None
    }

    /// True when `item` is `target` or one of its descendants.
    pub fn is_item_or_descendant_of(&self, item: ItemHandle, target: ItemHandle) -> bool {
        if !self.contains(item) || !self.contains(target) {
            return false;
        }
        if item == target {
            return true;
        }
        self.ancestors(item).contains(&target)
    }

    /// Depth from the root row (roots are depth 0).
    pub fn depth(&self, handle: ItemHandle) -> usize {
        self.ancestors(handle).len()
    }

    pub fn stage_id_of(&self, handle: ItemHandle) -> Option<StageId> {
        let stage = self.find_ancestor_of_kind(handle, TreeItemKind::Stage)?;
        self.get(stage).map(|item| item.id)
    }

    /// Identifier text: `S_<stage>.0.0`, `A_<stage>.<act>.0`, `P_<stage>.0.<entity>`.
    /// Folders have none.
    pub fn identifier(&self, handle: ItemHandle) -> String {
        let Some(item) = self.get(handle) else {
            return String::new();
        };
        let stage_id = self.stage_id_of(handle).unwrap_or(0);
        match item.kind {
            TreeItemKind::Stage => format!("S_{stage_id}.0.0"),
            TreeItemKind::Act => format!("A_{stage_id}.{}.0", item.id),
            TreeItemKind::Entity => format!("P_{stage_id}.0.{}", item.id),
            TreeItemKind::ActsFolder | TreeItemKind::EntitiesFolder => String::new(),
        }
    }

    /// Pre-order traversal of rows whose ancestors all satisfy `is_open`.
    pub fn visible(&self, mut is_open: impl FnMut(ItemHandle) -> bool) -> Vec<ItemHandle> {
        let mut rows = Vec::with_capacity(self.items.len());
        let mut stack: Vec<ItemHandle> = self.roots.iter().rev().copied().collect();
        while let Some(handle) = stack.pop() {
            rows.push(handle);
            if is_open(handle) {
                stack.extend(self.children(handle).iter().rev().copied());
            }
        }
        rows
    }
}
