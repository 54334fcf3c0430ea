use crate::model::{ActId, ActorRef, EntityId, StageId, DEFAULT_ACT_ID};
use crate::tree_item::{ItemForest, ItemHandle, TreeItem, TreeItemKind};
use bitflags::bitflags;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// Active-stage toggle; Stage rows only.
    Toggle,
    Identifier,
    Name,
    Actions,
}

impl Column {
    pub const ALL: [Column; 4] = [Column::Toggle, Column::Identifier, Column::Name, Column::Actions];

    pub fn header(self) -> &'static str {
        match self {
            Column::Toggle => "",
            Column::Identifier => "ID",
            Column::Name => "Name",
            Column::Actions => "Actions",
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RowFlags: u8 {
        const BOLD = 1 << 0;
        const DROP_TARGET = 1 << 1;
        const SELECTED = 1 << 2;
        const EXPANDED = 1 << 3;
        const HAS_CHILDREN = 1 << 4;
        const ACTIVE_STAGE = 1 << 5;
        const INVALID = 1 << 6;
    }
}

/// Commands the panel executes on behalf of buttons, menus and double-clicks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelAction {
    SetActiveStage { stage: StageId },
    RegisterSelectedActors { stage: StageId },
    UnregisterAllEntities { stage: StageId },
    CreateAct { stage: StageId },
    DeleteAct { stage: StageId, act: ActId },
    RenameAct { stage: StageId, act: ActId, name: String },
    PreviewAct { stage: StageId, act: ActId },
    RemoveAllEntitiesFromAct { stage: StageId, act: ActId },
    SetEntityState { stage: StageId, act: ActId, entity: EntityId, state: i32 },
    RemoveEntityFromAct { stage: StageId, act: ActId, entity: EntityId },
    UnregisterEntity { stage: StageId, entity: EntityId },
    SelectInViewport { actor: ActorRef },
}

impl PanelAction {
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            PanelAction::DeleteAct { .. }
                | PanelAction::RemoveAllEntitiesFromAct { .. }
                | PanelAction::UnregisterEntity { .. }
                | PanelAction::UnregisterAllEntities { .. }
        )
    }
}

impl fmt::Display for PanelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelAction::SetActiveStage { stage } => write!(f, "SetActiveStage stage={stage}"),
            PanelAction::RegisterSelectedActors { stage } => write!(f, "RegisterSelectedActors stage={stage}"),
            PanelAction::UnregisterAllEntities { stage } => write!(f, "UnregisterAllEntities stage={stage}"),
            PanelAction::CreateAct { stage } => write!(f, "CreateAct stage={stage}"),
            PanelAction::DeleteAct { stage, act } => write!(f, "DeleteAct stage={stage} act={act}"),
            PanelAction::RenameAct { stage, act, name } => {
                write!(f, "RenameAct stage={stage} act={act} name={name}")
            }
            PanelAction::PreviewAct { stage, act } => write!(f, "PreviewAct stage={stage} act={act}"),
            PanelAction::RemoveAllEntitiesFromAct { stage, act } => {
                write!(f, "RemoveAllEntitiesFromAct stage={stage} act={act}")
            }
            PanelAction::SetEntityState { stage, act, entity, state } => {
                write!(f, "SetEntityState stage={stage} act={act} entity={entity} state={state}")
            }
            PanelAction::RemoveEntityFromAct { stage, act, entity } => {
                write!(f, "RemoveEntityFromAct stage={stage} act={act} entity={entity}")
            }
            PanelAction::UnregisterEntity { stage, entity } => {
                write!(f, "UnregisterEntity stage={stage} entity={entity}")
            }
            PanelAction::SelectInViewport { actor } => write!(f, "SelectInViewport actor={actor}"),
        }
    }
}

/// A button in the actions column or an entry of a context menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionEntry {
    pub label: &'static str,
    pub action: PanelAction,
    pub enabled: bool,
}

impl ActionEntry {
    fn new(label: &'static str, action: PanelAction) -> Self {
        Self { label, action, enabled: true }
    }

    fn enabled_if(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Everything a host needs to draw one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub handle: ItemHandle,
    pub kind: TreeItemKind,
    pub stage: Option<StageId>,
    pub depth: usize,
    pub identifier: String,
    pub name: String,
    pub entity_state: Option<i32>,
    pub flags: RowFlags,
    pub actions: Vec<ActionEntry>,
}

impl RowView {
    /// Stage rows carry the active-stage toggle; every other kind leaves the column empty.
    pub fn toggle(&self) -> Option<bool> {
        (self.kind == TreeItemKind::Stage).then(|| self.flags.contains(RowFlags::ACTIVE_STAGE))
    }
}

/// Where a row sits, as far as actions are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowScope {
    Stage { stage: StageId },
    ActsFolder { stage: StageId },
    EntitiesFolder,
    Act { stage: StageId, act: ActId },
    EntityInAct { stage: StageId, act: ActId, entity: EntityId, state: i32 },
    RegisteredEntity { stage: StageId, entity: EntityId },
}

fn scope_of(forest: &ItemForest, handle: ItemHandle) -> Option<(RowScope, &TreeItem)> {
    let item = forest.get(handle)?;
    let stage = forest.stage_id_of(handle)?;
    let scope = match item.kind {
        TreeItemKind::Stage => RowScope::Stage { stage },
        TreeItemKind::ActsFolder => RowScope::ActsFolder { stage },
        TreeItemKind::EntitiesFolder => RowScope::EntitiesFolder,
        TreeItemKind::Act => RowScope::Act { stage, act: item.id },
        TreeItemKind::Entity => {
            let parent = forest.parent(handle).and_then(|parent| forest.get(parent))?;
            match parent.kind {
                TreeItemKind::Act => RowScope::EntityInAct {
                    stage,
                    act: parent.id,
                    entity: item.id,
                    state: item.entity_state.unwrap_or(0),
                },
                _ => RowScope::RegisteredEntity { stage, entity: item.id },
            }
        }
    };
    Some((scope, item))
}

/// Buttons of the actions column for `handle`.
pub fn row_actions(forest: &ItemForest, handle: ItemHandle) -> Vec<ActionEntry> {
    let Some((scope, _)) = scope_of(forest, handle) else {
        return Vec::new();
    };
    match scope {
        RowScope::Stage { stage } => {
            vec![ActionEntry::new("Register Selected Actors", PanelAction::RegisterSelectedActors { stage })]
        }
        RowScope::ActsFolder { stage } => vec![ActionEntry::new("Create Act", PanelAction::CreateAct { stage })],
        RowScope::EntitiesFolder => Vec::new(),
        RowScope::Act { stage, act } => {
            vec![ActionEntry::new("Delete Act", PanelAction::DeleteAct { stage, act }).enabled_if(act != DEFAULT_ACT_ID)]
        }
        RowScope::EntityInAct { stage, act, entity, .. } => {
            vec![ActionEntry::new("Remove from Act", PanelAction::RemoveEntityFromAct { stage, act, entity })]
        }
        RowScope::RegisteredEntity { stage, entity } => {
            vec![ActionEntry::new("Unregister Entity", PanelAction::UnregisterEntity { stage, entity })]
        }
    }
}

/// Context menu entries for `handle`; `None` for rows without a menu.
pub fn context_menu(forest: &ItemForest, handle: ItemHandle) -> Option<Vec<ActionEntry>> {
    let (scope, item) = scope_of(forest, handle)?;
    let entries = match scope {
        RowScope::Stage { stage } => vec![
            ActionEntry::new("Register Selected Actors", PanelAction::RegisterSelectedActors { stage }),
            ActionEntry::new("Unregister All Entities", PanelAction::UnregisterAllEntities { stage }),
            ActionEntry::new("Set Active Stage", PanelAction::SetActiveStage { stage }),
        ],
        RowScope::ActsFolder { stage } => vec![ActionEntry::new("Create Act", PanelAction::CreateAct { stage })],
        RowScope::EntitiesFolder => return None,
        RowScope::Act { stage, act } => vec![
            ActionEntry::new("Preview Act", PanelAction::PreviewAct { stage, act }),
            ActionEntry::new("Remove All Entities", PanelAction::RemoveAllEntitiesFromAct { stage, act }),
            ActionEntry::new("Delete Act", PanelAction::DeleteAct { stage, act }).enabled_if(act != DEFAULT_ACT_ID),
        ],
        RowScope::EntityInAct { stage, act, entity, state } => vec![
            ActionEntry::new("Increase State", PanelAction::SetEntityState { stage, act, entity, state: state + 1 }),
            ActionEntry::new(
                "Decrease State",
                PanelAction::SetEntityState { stage, act, entity, state: (state - 1).max(0) },
            )
            .enabled_if(state > 0),
            ActionEntry::new("Remove from Act", PanelAction::RemoveEntityFromAct { stage, act, entity }),
        ],
        RowScope::RegisteredEntity { stage, entity } => {
            let mut entries = Vec::with_capacity(2);
            if let Some(actor) = item.actor {
                entries.push(
                    ActionEntry::new("Select in Viewport", PanelAction::SelectInViewport { actor })
                        .enabled_if(!item.placeholder),
                );
            }
            entries.push(ActionEntry::new("Unregister Entity", PanelAction::UnregisterEntity { stage, entity }));
            entries
        }
    };
    Some(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_with_default_act() -> (ItemForest, ItemHandle, ItemHandle, ItemHandle) {
        let mut forest = ItemForest::new();
        let stage = forest.push_root(TreeItem::new(TreeItemKind::Stage, "Harbor", 3));
        let acts = forest.push_child(stage, TreeItem::folder(TreeItemKind::ActsFolder, "Acts")).expect("acts");
        let act = forest.push_child(acts, TreeItem::new(TreeItemKind::Act, "Default Act", 0)).expect("act");
        let entity = forest
            .push_child(act, TreeItem::new(TreeItemKind::Entity, "Crate (State: 0)", 2).with_entity_state(0))
            .expect("entity");
        (forest, stage, act, entity)
    }

    #[test]
    fn default_act_delete_is_disabled() {
        let (forest, _, act, _) = stage_with_default_act();
        let actions = row_actions(&forest, act);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action, PanelAction::DeleteAct { stage: 3, act: 0 });
        assert!(!actions[0].enabled);
    }

    #[test]
    fn entity_in_act_menu_cannot_go_below_zero() {
        let (forest, _, _, entity) = stage_with_default_act();
        let menu = context_menu(&forest, entity).expect("menu");
        let labels: Vec<_> = menu.iter().map(|entry| entry.label).collect();
        assert_eq!(labels, vec!["Increase State", "Decrease State", "Remove from Act"]);
        assert_eq!(menu[0].action, PanelAction::SetEntityState { stage: 3, act: 0, entity: 2, state: 1 });
        assert!(!menu[1].enabled);
    }

    #[test]
    fn destructive_actions_are_flagged() {
        assert!(PanelAction::UnregisterAllEntities { stage: 1 }.is_destructive());
        assert!(!PanelAction::CreateAct { stage: 1 }.is_destructive());
        assert_eq!(PanelAction::DeleteAct { stage: 1, act: 2 }.to_string(), "DeleteAct stage=1 act=2");
    }
}
