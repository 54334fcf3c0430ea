use crate::director::StageDirector;
use crate::model::{ActId, ActorRef, EntityId, StageId};
use crate::tree_item::{ItemForest, ItemHandle, TreeItemKind};

/// What a drag gesture carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPayload {
    /// Entities dragged out of one Stage's Entities folder. `entities` identifies them in
    /// the data store and outlives rebuilds; `rows` are the source rows, for display only.
    Entities { stage: StageId, entities: Vec<EntityId>, rows: Vec<ItemHandle> },
    /// Actors dragged in from outside the panel.
    Actors(Vec<ActorRef>),
}

impl DragPayload {
    pub fn len(&self) -> usize {
        match self {
            DragPayload::Entities { entities, .. } => entities.len(),
            DragPayload::Actors(actors) => actors.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row kind a drop target resolves to for this payload.
    pub fn target_kind(&self) -> TreeItemKind {
        match self {
            DragPayload::Entities { .. } => TreeItemKind::Act,
            DragPayload::Actors(_) => TreeItemKind::Stage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Unhandled,
    /// Entities ensured as members of an Act; `kept` were already members.
    Assigned { stage: StageId, act: ActId, added: usize, kept: usize },
    /// Actors offered to a Stage's registry.
    Registered { stage: StageId, offered: usize, any_new: bool },
}

impl DropOutcome {
    pub fn is_handled(&self) -> bool {
        !matches!(self, DropOutcome::Unhandled)
    }
}

/// Tracks the hovered drop target and applies drops to the director.
#[derive(Debug, Default)]
pub struct DragDropCoordinator {
    hovered: Option<ItemHandle>,
}

impl DragDropCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<ItemHandle> {
        self.hovered
    }

    /// Starts an entity drag from `dragged`. Only rows directly under an Entities folder
    /// can be dragged; the selection is pruned to rows sharing that folder.
    pub fn begin_entity_drag(
        &mut self,
        forest: &ItemForest,
        dragged: ItemHandle,
        selected: &[ItemHandle],
    ) -> Option<DragPayload> {
        let folder = forest.parent(dragged)?;
        if forest.kind(dragged) != Some(TreeItemKind::Entity)
            || forest.kind(folder) != Some(TreeItemKind::EntitiesFolder)
        {
            return None;
        }
        let stage = forest.stage_id_of(folder)?;
        let mut rows: Vec<ItemHandle> = selected
            .iter()
            .copied()
            .filter(|item| forest.kind(*item) == Some(TreeItemKind::Entity) && forest.parent(*item) == Some(folder))
            .collect();
        if !rows.contains(&dragged) {
            rows.insert(0, dragged);
        }
        let entities: Vec<EntityId> = rows.iter().filter_map(|row| forest.get(*row)).map(|item| item.id).collect();
        tracing::debug!("[drag] entity drag started with {} rows from stage {stage}", entities.len());
        Some(DragPayload::Entities { stage, entities, rows })
    }

    /// Walks from `target` (inclusive) up to the row kind the payload drops onto.
    pub fn resolve_target(&self, forest: &ItemForest, target: ItemHandle, payload: &DragPayload) -> Option<ItemHandle> {
        forest.find_ancestor_of_kind(target, payload.target_kind())
    }

    /// Updates the hovered target. Rows that resolve to nothing keep the previous one.
    pub fn drag_enter(&mut self, forest: &ItemForest, target: ItemHandle, payload: &DragPayload) -> Option<ItemHandle> {
        let resolved = self.resolve_target(forest, target, payload)?;
        self.hovered = Some(resolved);
        Some(resolved)
    }

    /// Leaving a row keeps the highlight; moving between sibling rows fires leave/enter
    /// pairs for the same target.
    pub fn drag_leave(&mut self, _target: ItemHandle) {}

    /// Drag ended without a drop.
    pub fn end_drag(&mut self) {
        if self.hovered.take().is_some() {
            tracing::debug!("[drag] drag abandoned");
        }
    }

    /// True when `item` is the hovered target or one of its descendants.
    pub fn is_drop_target(&self, forest: &ItemForest, item: ItemHandle) -> bool {
        self.hovered.is_some_and(|hovered| forest.is_item_or_descendant_of(item, hovered))
    }

    /// Applies `payload` dropped on `target`. Nothing is mutated unless the target and the
    /// payload both resolve.
    pub fn drop_onto(
        &mut self,
        forest: &ItemForest,
        director: &mut dyn StageDirector,
        target: ItemHandle,
        payload: &DragPayload,
        default_state: i32,
    ) -> DropOutcome {
        self.hovered = None;
        let Some(resolved) = self.resolve_target(forest, target, payload) else {
            tracing::debug!("[drag] drop on a row without a {} ancestor", payload.target_kind().label());
            return DropOutcome::Unhandled;
        };
        let Some(stage) = forest.stage_id_of(resolved) else {
            return DropOutcome::Unhandled;
        };
        let outcome = match payload {
            DragPayload::Entities { stage: source, entities, .. } => {
                let Some(act) = forest.get(resolved).map(|item| item.id) else {
                    return DropOutcome::Unhandled;
                };
                if *source != stage {
                    tracing::debug!("[drag] entities from stage {source} dropped on stage {stage}");
                    return DropOutcome::Unhandled;
                }
                drop_entities(director, stage, act, entities, default_state)
            }
            DragPayload::Actors(actors) => {
                let any_new = director.register_entities(stage, actors);
                DropOutcome::Registered { stage, offered: actors.len(), any_new }
            }
        };
        tracing::debug!("[drag] drop resolved: {outcome:?}");
        outcome
    }
}

fn drop_entities(
    director: &mut dyn StageDirector,
    stage: StageId,
    act: ActId,
    dragged: &[EntityId],
    default_state: i32,
) -> DropOutcome {
    let Some(record) = director.stage(stage) else {
        return DropOutcome::Unhandled;
    };
    // Entities unregistered while the drag was in flight are skipped.
    let entities: Vec<EntityId> =
        dragged.iter().copied().filter(|entity| record.entity_registry.contains_key(entity)).collect();
    if entities.is_empty() {
        tracing::debug!("[drag] no dragged entity is still registered on stage {stage}");
        return DropOutcome::Unhandled;
    }
    let existing: Vec<Option<i32>> = {
        let target = record.act(act);
        entities.iter().map(|entity| target.and_then(|act| act.entity_state(*entity))).collect()
    };
    let mut added = 0;
    let mut kept = 0;
    for (entity, state) in entities.iter().zip(existing) {
        if state.is_some() {
            kept += 1;
            continue;
        }
        if director.set_entity_state_in_act(stage, *entity, act, default_state) {
            added += 1;
        }
    }
    DropOutcome::Assigned { stage, act, added, kept }
}
