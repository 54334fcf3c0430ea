use crate::config::PanelConfig;
use crate::director::StageDirector;
use crate::model::StageRecord;
use crate::path_index::PathIndex;
use crate::tree_item::{ItemForest, TreeItem, TreeItemKind};

/// A freshly built outliner tree and its selection lookup map.
#[derive(Debug, Default)]
pub struct BuiltTree {
    pub forest: ItemForest,
    pub index: PathIndex,
    /// Rows that stand in for unresolvable or stale data.
    pub placeholders: usize,
}

/// Rebuilds the whole row hierarchy from the director's current data.
pub fn build_tree(director: &dyn StageDirector, config: &PanelConfig) -> BuiltTree {
    let mut built = BuiltTree::default();
    for stage in director.stages() {
        if build_stage(&mut built, director, config, stage).is_none() {
            tracing::warn!("[outliner] stage {} could not be attached to the tree", stage.id);
        }
    }
    if built.placeholders > 0 {
        tracing::warn!("[outliner] rebuilt tree with {} placeholder rows", built.placeholders);
    }
    tracing::debug!(
        "[outliner] rebuilt {} stages into {} rows (generation {})",
        built.forest.roots().len(),
        built.forest.len(),
        built.forest.generation()
    );
    built
}

fn build_stage(
    built: &mut BuiltTree,
    director: &dyn StageDirector,
    config: &PanelConfig,
    stage: &StageRecord,
) -> Option<()> {
    let stage_label = director.actor_label(stage.actor);
    let mut stage_item = TreeItem::new(
        TreeItemKind::Stage,
        stage_label.unwrap_or(config.invalid_stage_label.as_str()),
        stage.id,
    )
    .with_stage(stage.id)
    .with_actor(stage.actor);
    if stage_label.is_none() {
        stage_item = stage_item.placeholder();
        built.placeholders += 1;
    }
    let stage_path = director.actor_path(stage.actor);
    if let Some(path) = stage_path {
        stage_item = stage_item.with_external_path(path);
    }
    let stage_row = built.forest.push_root(stage_item);
    if let Some(path) = stage_path {
        built.index.register_first(path, stage_row);
    }

    let acts_folder = built.forest.push_child(
        stage_row,
        TreeItem::folder(TreeItemKind::ActsFolder, config.acts_folder_label.as_str()).with_stage(stage.id),
    )?;
    for act in &stage.acts {
        let act_row = built.forest.push_child(
            acts_folder,
            TreeItem::new(TreeItemKind::Act, act.display_name.as_str(), act.id).with_stage(stage.id),
        )?;
        for (&entity, &state) in &act.entity_state_overrides {
            let (item, resolved) = entity_item(director, config, stage, entity, |label| {
                format!("{label} (State: {state})")
            });
            if !resolved {
                built.placeholders += 1;
            }
            built.forest.push_child(act_row, item.with_entity_state(state))?;
        }
    }

    let entities_folder = built.forest.push_child(
        stage_row,
        TreeItem::folder(TreeItemKind::EntitiesFolder, config.entities_folder_label.as_str()).with_stage(stage.id),
    )?;
    for &entity in stage.entity_registry.keys() {
        let (item, resolved) =
            entity_item(director, config, stage, entity, |label| format!("{label} (ID: {entity})"));
        if !resolved {
            built.placeholders += 1;
        }
        let path = item.external_path.clone();
        let row = built.forest.push_child(entities_folder, item)?;
        if let Some(path) = path {
            built.index.register_first(&path, row);
        }
    }
    Some(())
}

/// Builds an Entity row; the flag is false when the row is a placeholder.
fn entity_item(
    director: &dyn StageDirector,
    config: &PanelConfig,
    stage: &StageRecord,
    entity: i32,
    name: impl FnOnce(&str) -> String,
) -> (TreeItem, bool) {
    let actor = stage.entity_actor(entity);
    let label = actor.and_then(|actor| director.actor_label(actor));
    let resolved = label.is_some();
    let mut item = TreeItem::new(
        TreeItemKind::Entity,
        name(label.unwrap_or(config.invalid_entity_label.as_str())),
        entity,
    )
    .with_stage(stage.id);
    if let Some(actor) = actor {
        item = item.with_actor(actor);
    }
    if let Some(path) = actor.and_then(|actor| director.actor_path(actor)) {
        item = item.with_external_path(path);
    }
    if !resolved {
        tracing::warn!("[outliner] stage {}: entity {entity} does not resolve to a live actor", stage.id);
        item = item.placeholder();
    }
    (item, resolved)
}
