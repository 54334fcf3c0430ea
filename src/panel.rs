use crate::capability::{CapabilityGate, RefreshKind};
use crate::columns::{self, ActionEntry, PanelAction, RowFlags, RowView};
use crate::config::PanelConfig;
use crate::dialog::{ConfirmDialog, ConfirmPrompt};
use crate::director::StageDirector;
use crate::drag_drop::{DragDropCoordinator, DragPayload, DropOutcome};
use crate::events::{EventBus, PanelEvent};
use crate::expansion::{restore_expansion, restore_selection, snapshot_expansion, snapshot_selection};
use crate::model::{ActId, ActorRef, SelectionObject, StageId};
use crate::selection_sync::{IgnoreReason, SelectionSync, SyncContext, SyncOutcome, SyncState};
use crate::tree_builder::{build_tree, BuiltTree};
use crate::tree_item::{ItemForest, ItemHandle, TreeItemKind};
use crate::viewport::ViewportSelection;
use crate::widget::{TreeViewState, TreeWidget};

pub const RESTRICTED_MESSAGE: &str =
    "The stage outliner is unavailable: the required world capability is not active in this level.";

/// The interactive tree: rows, widget state and drag tracking for one UI generation.
#[derive(Debug)]
pub struct OutlinerView {
    tree: BuiltTree,
    view: TreeViewState,
    drag: DragDropCoordinator,
    active_drag: Option<DragPayload>,
}

impl OutlinerView {
    fn build(config: &PanelConfig, director: &dyn StageDirector) -> Self {
        let tree = build_tree(director, config);
        let mut view = TreeViewState::new();
        restore_expansion(&tree.forest, &mut view, &Default::default(), config.expand_roots_on_first_load);
        Self { tree, view, drag: DragDropCoordinator::new(), active_drag: None }
    }

    /// Data-only refresh: new forest, expansion and selection carried over by key.
    fn rebuild(&mut self, config: &PanelConfig, director: &dyn StageDirector) {
        let expanded = snapshot_expansion(&self.tree.forest, &self.view);
        let selected = snapshot_selection(&self.tree.forest, &self.view);
        let tree = build_tree(director, config);
        self.view.reset();
        restore_expansion(&tree.forest, &mut self.view, &expanded, config.expand_roots_on_first_load);
        restore_selection(&tree.forest, &mut self.view, &selected);
        self.view.request_refresh();
        self.tree = tree;
        self.drag.end_drag();
    }

    pub fn forest(&self) -> &ItemForest {
        &self.tree.forest
    }

    pub fn tree(&self) -> &BuiltTree {
        &self.tree
    }

    pub fn view(&self) -> &TreeViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut TreeViewState {
        &mut self.view
    }

    pub fn drag(&self) -> &DragDropCoordinator {
        &self.drag
    }

    pub fn active_drag(&self) -> Option<&DragPayload> {
        self.active_drag.as_ref()
    }

    pub fn expand_all(&mut self) {
        let handles: Vec<ItemHandle> = self.tree.forest.handles().collect();
        for handle in handles {
            self.view.set_expansion(handle, true);
        }
    }
}

/// What the panel currently shows.
#[derive(Debug)]
pub enum PanelContent {
    Outliner(Box<OutlinerView>),
    Restricted { message: String },
}

/// The outliner panel: owns the tree and its interaction state, and talks to the
/// director, viewport and dialog collaborators passed into each call.
#[derive(Debug)]
pub struct StagePanel {
    config: PanelConfig,
    gate: CapabilityGate,
    content: PanelContent,
    sync: SelectionSync,
    ui_generation: u32,
    events: EventBus,
}

impl StagePanel {
    pub fn new(config: PanelConfig, director: &dyn StageDirector) -> Self {
        let active = director.is_capability_active();
        let content = Self::construct_content(&config, director, active);
        let mut panel = Self {
            config,
            gate: CapabilityGate::new(active),
            content,
            sync: SelectionSync::new(),
            ui_generation: 1,
            events: EventBus::default(),
        };
        panel.report_rebuild();
        panel
    }

    fn construct_content(config: &PanelConfig, director: &dyn StageDirector, active: bool) -> PanelContent {
        if active {
            PanelContent::Outliner(Box::new(OutlinerView::build(config, director)))
        } else {
            PanelContent::Restricted { message: RESTRICTED_MESSAGE.to_string() }
        }
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn content(&self) -> &PanelContent {
        &self.content
    }

    pub fn outliner(&self) -> Option<&OutlinerView> {
        match &self.content {
            PanelContent::Outliner(outliner) => Some(outliner),
            PanelContent::Restricted { .. } => None,
        }
    }

    pub fn outliner_mut(&mut self) -> Option<&mut OutlinerView> {
        match &mut self.content {
            PanelContent::Outliner(outliner) => Some(outliner),
            PanelContent::Restricted { .. } => None,
        }
    }

    /// Bumped on every full UI replace.
    pub fn ui_generation(&self) -> u32 {
        self.ui_generation
    }

    pub fn capability_active(&self) -> bool {
        self.gate.is_active()
    }

    pub fn selection_state(&self) -> SyncState {
        self.sync.state()
    }

    pub fn drain_events(&mut self) -> Vec<PanelEvent> {
        self.events.drain()
    }

    fn notice(&mut self, message: String) {
        tracing::info!("[outliner] {message}");
        self.events.push(PanelEvent::Notice { message });
    }

    fn report_rebuild(&mut self) {
        if let PanelContent::Outliner(outliner) = &self.content {
            let forest = outliner.forest();
            self.events.push(PanelEvent::TreeRebuilt { stages: forest.roots().len(), items: forest.len() });
        }
    }

    // ---- refresh ----------------------------------------------------------------------

    /// Re-reads the capability flag and rebuilds either the whole content or just the rows.
    pub fn refresh(&mut self, director: &dyn StageDirector) -> RefreshKind {
        let kind = self.gate.evaluate(director.is_capability_active());
        match kind {
            RefreshKind::FullReplace { capability_active } => {
                self.content = Self::construct_content(&self.config, director, capability_active);
                self.ui_generation += 1;
                tracing::debug!("[gate] replaced panel content (generation {})", self.ui_generation);
                self.events.push(PanelEvent::UiReplaced { capability_active });
            }
            RefreshKind::DataOnly => match &mut self.content {
                PanelContent::Outliner(outliner) => outliner.rebuild(&self.config, director),
                PanelContent::Restricted { .. } => return kind,
            },
        }
        self.report_rebuild();
        kind
    }

    /// Drains queued director notifications and refreshes once if there were any.
    pub fn pump(&mut self, director: &mut dyn StageDirector) -> Option<RefreshKind> {
        let notifications = director.drain_notifications();
        if notifications.is_empty() {
            return None;
        }
        for notification in &notifications {
            tracing::trace!("[outliner] notification {notification}");
        }
        Some(self.refresh(&*director))
    }

    /// Toolbar refresh: rescan the world for Stages, then refresh.
    pub fn on_refresh_clicked(&mut self, director: &mut dyn StageDirector) -> RefreshKind {
        director.rescan();
        director.drain_notifications();
        self.refresh(&*director)
    }

    // ---- rows -------------------------------------------------------------------------

    pub fn children(&self, handle: ItemHandle) -> &[ItemHandle] {
        self.outliner().map(|outliner| outliner.forest().children(handle)).unwrap_or(&[])
    }

    pub fn row(&self, director: &dyn StageDirector, handle: ItemHandle) -> Option<RowView> {
        let outliner = self.outliner()?;
        let forest = outliner.forest();
        let item = forest.get(handle)?;
        let mut flags = RowFlags::empty();
        flags.set(RowFlags::BOLD, item.kind.is_folder());
        flags.set(RowFlags::DROP_TARGET, outliner.drag.is_drop_target(forest, handle));
        flags.set(RowFlags::SELECTED, outliner.view.is_selected(handle));
        flags.set(RowFlags::EXPANDED, outliner.view.is_expanded(handle));
        flags.set(RowFlags::HAS_CHILDREN, !item.children().is_empty());
        flags.set(
            RowFlags::ACTIVE_STAGE,
            item.kind == TreeItemKind::Stage && director.active_stage() == Some(item.id),
        );
        flags.set(RowFlags::INVALID, item.placeholder);
        Some(RowView {
            handle,
            kind: item.kind,
            stage: forest.stage_id_of(handle),
            depth: forest.depth(handle),
            identifier: forest.identifier(handle),
            name: item.display_name.clone(),
            entity_state: item.entity_state,
            flags,
            actions: columns::row_actions(forest, handle),
        })
    }

    /// Rows whose ancestors are all expanded, in display order.
    pub fn rows(&self, director: &dyn StageDirector) -> Vec<RowView> {
        let Some(outliner) = self.outliner() else {
            return Vec::new();
        };
        outliner
            .forest()
            .visible(|handle| outliner.view.is_expanded(handle))
            .into_iter()
            .filter_map(|handle| self.row(director, handle))
            .collect()
    }

    pub fn selected_items(&self) -> Vec<ItemHandle> {
        self.outliner().map(|outliner| outliner.view.selected_items()).unwrap_or_default()
    }

    /// Context menu for the first selected row.
    pub fn context_menu(&self) -> Option<Vec<ActionEntry>> {
        let outliner = self.outliner()?;
        let first = *outliner.view.selected_items().first()?;
        columns::context_menu(outliner.forest(), first)
    }

    pub fn toggle_expansion(&mut self, handle: ItemHandle) -> bool {
        match self.outliner_mut() {
            Some(outliner) if outliner.tree.forest.contains(handle) => outliner.view.toggle_expansion(handle),
            _ => false,
        }
    }

    // ---- selection --------------------------------------------------------------------

    pub fn on_viewport_selection_changed(
        &mut self,
        director: &dyn StageDirector,
        viewport: &dyn ViewportSelection,
        changed: Option<&SelectionObject>,
    ) -> SyncOutcome {
        let PanelContent::Outliner(outliner) = &mut self.content else {
            if !self.sync.is_idle() {
                return SyncOutcome::Ignored(IgnoreReason::Reentrant(self.sync.state()));
            }
            return SyncOutcome::Ignored(IgnoreReason::NoWidget);
        };
        let OutlinerView { tree, view, .. } = &mut **outliner;
        let ctx = SyncContext { forest: &tree.forest, index: &tree.index, director, viewport };
        self.sync.sync_from_viewport(&ctx, changed, Some(view))
    }

    pub fn on_row_clicked(&mut self, handle: ItemHandle, additive: bool) {
        let Some(outliner) = self.outliner_mut() else {
            return;
        };
        if !outliner.tree.forest.contains(handle) {
            return;
        }
        outliner.view.click_select(handle, additive);
        self.on_tree_selection_changed();
    }

    pub fn on_tree_selection_changed(&self) {
        self.sync.tree_selection_changed(&self.selected_items());
    }

    pub fn on_row_double_clicked(
        &mut self,
        director: &mut dyn StageDirector,
        viewport: &mut dyn ViewportSelection,
        handle: ItemHandle,
    ) -> bool {
        let Some((kind, id, actor, stage)) = self.outliner().and_then(|outliner| {
            let forest = outliner.forest();
            let item = forest.get(handle)?;
            Some((item.kind, item.id, item.actor, forest.stage_id_of(handle)))
        }) else {
            return false;
        };
        let handled = match kind {
            TreeItemKind::Stage => director.set_active_stage(id),
            TreeItemKind::Act => match stage {
                Some(stage) => {
                    director.set_active_stage(stage);
                    director.preview_act(stage, id)
                }
                None => false,
            },
            TreeItemKind::Entity => match actor.filter(|actor| director.is_actor_alive(*actor)) {
                Some(actor) => self.sync.select_actor_in_viewport(viewport, actor),
                None => false,
            },
            TreeItemKind::ActsFolder | TreeItemKind::EntitiesFolder => {
                self.toggle_expansion(handle);
                true
            }
        };
        self.pump(director);
        handled
    }

    // ---- drag & drop ------------------------------------------------------------------

    /// Starts dragging `handle` (plus compatible selected rows) out of an Entities folder.
    pub fn begin_drag(&mut self, handle: ItemHandle) -> Option<DragPayload> {
        let OutlinerView { tree, view, drag, active_drag } = self.outliner_mut()?;
        let selected = view.selected_items();
        let payload = drag.begin_entity_drag(&tree.forest, handle, &selected)?;
        *active_drag = Some(payload.clone());
        Some(payload)
    }

    /// An external actor drag entered the panel.
    pub fn begin_actor_drag(&mut self, actors: Vec<ActorRef>) -> Option<DragPayload> {
        let outliner = self.outliner_mut()?;
        let payload = DragPayload::Actors(actors);
        outliner.active_drag = Some(payload.clone());
        Some(payload)
    }

    pub fn on_drag_enter(&mut self, handle: ItemHandle) -> Option<ItemHandle> {
        let OutlinerView { tree, drag, active_drag, .. } = self.outliner_mut()?;
        let payload = active_drag.as_ref()?;
        drag.drag_enter(&tree.forest, handle, payload)
    }

    pub fn on_drag_leave(&mut self, handle: ItemHandle) {
        if let Some(outliner) = self.outliner_mut() {
            outliner.drag.drag_leave(handle);
        }
    }

    pub fn end_drag(&mut self) {
        if let Some(outliner) = self.outliner_mut() {
            outliner.active_drag = None;
            outliner.drag.end_drag();
        }
    }

    pub fn on_drop(&mut self, director: &mut dyn StageDirector, handle: ItemHandle) -> DropOutcome {
        let Some(outliner) = self.outliner_mut() else {
            return DropOutcome::Unhandled;
        };
        let Some(payload) = outliner.active_drag.take() else {
            outliner.drag.end_drag();
            return DropOutcome::Unhandled;
        };
        let default_state = self.config.default_drop_state;
        let PanelContent::Outliner(outliner) = &mut self.content else {
            return DropOutcome::Unhandled;
        };
        let OutlinerView { tree, drag, .. } = &mut **outliner;
        let outcome = drag.drop_onto(&tree.forest, director, handle, &payload, default_state);
        match (outcome, &payload) {
            (DropOutcome::Assigned { stage, act, added, .. }, _) if added > 0 => {
                if self.config.show_notices {
                    let name = act_name(&*director, stage, act);
                    self.notice(format!("Assigned {added} entities to Act '{name}'"));
                }
            }
            (DropOutcome::Registered { stage, any_new, .. }, DragPayload::Actors(actors)) => {
                let live = actors.iter().filter(|actor| director.is_actor_alive(**actor)).count();
                self.registration_notice(&*director, stage, live, any_new);
            }
            _ => {}
        }
        self.pump(director);
        outcome
    }

    // ---- actions ----------------------------------------------------------------------

    /// Registers the viewport's selected actors to `stage`.
    pub fn register_selected_actors(
        &mut self,
        director: &mut dyn StageDirector,
        viewport: &dyn ViewportSelection,
        stage: StageId,
    ) -> bool {
        let actors: Vec<ActorRef> =
            viewport.selected_actors().into_iter().filter(|actor| director.is_actor_alive(*actor)).collect();
        let registered = director.register_entities(stage, &actors);
        self.registration_notice(&*director, stage, actors.len(), registered);
        registered
    }

    fn registration_notice(&mut self, director: &dyn StageDirector, stage: StageId, count: usize, registered: bool) {
        if !self.config.show_notices {
            return;
        }
        if registered {
            let label = stage_label(director, stage, &self.config);
            self.notice(format!("Registered {count} actors to Stage '{label}'"));
        } else {
            self.notice("Registration Failed: No valid actors or already registered.".to_string());
        }
    }

    fn confirm_prompt(&self, director: &dyn StageDirector, action: &PanelAction) -> Option<ConfirmPrompt> {
        let (title, message) = match action {
            PanelAction::DeleteAct { stage, act } => (
                "Delete Act",
                format!("Delete Act '{}'? Entity states stored in it are lost.", act_name(director, *stage, *act)),
            ),
            PanelAction::RemoveAllEntitiesFromAct { stage, act } => (
                "Remove All Entities",
                format!("Remove every entity from Act '{}'?", act_name(director, *stage, *act)),
            ),
            PanelAction::UnregisterEntity { stage, entity } => (
                "Unregister Entity",
                format!(
                    "Unregister entity {entity} from Stage '{}'? It is removed from every Act.",
                    stage_label(director, *stage, &self.config)
                ),
            ),
            PanelAction::UnregisterAllEntities { stage } => (
                "Unregister All Entities",
                format!("Unregister every entity from Stage '{}'?", stage_label(director, *stage, &self.config)),
            ),
            _ => return None,
        };
        Some(ConfirmPrompt { title: title.to_string(), message })
    }

    /// Runs a button, menu or double-click command. Destructive commands ask `dialog`
    /// first; a declined prompt changes nothing.
    pub fn execute_action(
        &mut self,
        director: &mut dyn StageDirector,
        viewport: &mut dyn ViewportSelection,
        dialog: &mut dyn ConfirmDialog,
        action: &PanelAction,
    ) -> bool {
        if let Some(prompt) = self.confirm_prompt(&*director, action) {
            if !dialog.confirm(&prompt) {
                tracing::debug!("[outliner] declined: {action}");
                return false;
            }
        }
        tracing::debug!("[outliner] executing {action}");
        let changed = match action {
            PanelAction::SetActiveStage { stage } => director.set_active_stage(*stage),
            PanelAction::RegisterSelectedActors { stage } => {
                self.register_selected_actors(director, &*viewport, *stage)
            }
            PanelAction::UnregisterAllEntities { stage } => director.unregister_all_entities(*stage),
            PanelAction::CreateAct { stage } => match director.create_act(*stage) {
                Some(act) => {
                    if self.config.show_notices {
                        let name = act_name(&*director, *stage, act);
                        self.notice(format!("Created new Act: {name}"));
                    }
                    true
                }
                None => false,
            },
            PanelAction::DeleteAct { stage, act } => director.delete_act(*stage, *act),
            PanelAction::RenameAct { stage, act, name } => director.rename_act(*stage, *act, name),
            PanelAction::PreviewAct { stage, act } => director.preview_act(*stage, *act),
            PanelAction::RemoveAllEntitiesFromAct { stage, act } => director.remove_all_entities_from_act(*stage, *act),
            PanelAction::SetEntityState { stage, act, entity, state } => {
                director.set_entity_state_in_act(*stage, *entity, *act, (*state).max(0))
            }
            PanelAction::RemoveEntityFromAct { stage, act, entity } => {
                director.remove_entity_from_act(*stage, *entity, *act)
            }
            PanelAction::UnregisterEntity { stage, entity } => director.unregister_entity(*stage, *entity),
            PanelAction::SelectInViewport { actor } => {
                director.is_actor_alive(*actor) && self.sync.select_actor_in_viewport(viewport, *actor)
            }
        };
        self.pump(director);
        changed
    }
}

fn act_name(director: &dyn StageDirector, stage: StageId, act: ActId) -> String {
    director
        .stage(stage)
        .and_then(|record| record.act(act))
        .map(|act| act.display_name.clone())
        .unwrap_or_else(|| format!("Act_{act}"))
}

fn stage_label(director: &dyn StageDirector, stage: StageId, config: &PanelConfig) -> String {
    director
        .stage(stage)
        .and_then(|record| director.actor_label(record.actor))
        .unwrap_or(config.invalid_stage_label.as_str())
        .to_string()
}
