use crate::columns::{Column, PanelAction, RowFlags, RowView};
use crate::dialog::ConfirmDialog;
use crate::director::StageDirector;
use crate::model::ActorRef;
use crate::panel::{PanelContent, StagePanel};
use crate::tree_item::{ItemHandle, TreeItemKind};
use crate::viewport::ViewportSelection;

const INDENT: f32 = 14.0;

/// Drag payload for Entity rows dragged inside the outliner.
#[derive(Debug, Clone, Copy)]
pub struct EntityRowDrag {
    pub row: ItemHandle,
}

/// Drag payload a host's world list attaches when actors are dragged into the panel.
#[derive(Debug, Clone)]
pub struct ActorDrag {
    pub actors: Vec<ActorRef>,
}

/// Interactions collected while drawing one frame, applied afterwards.
#[derive(Debug, Default)]
pub struct OutlinerUiActions {
    pub refresh: bool,
    pub clicked: Option<(ItemHandle, bool)>,
    pub double_clicked: Option<ItemHandle>,
    pub toggled: Option<ItemHandle>,
    pub drag_started: Option<ItemHandle>,
    pub actor_drag: Option<Vec<ActorRef>>,
    pub drag_entered: Option<ItemHandle>,
    pub dropped: Option<ItemHandle>,
    pub drag_released: bool,
    pub action: Option<PanelAction>,
}

pub fn show_outliner(ui: &mut egui::Ui, panel: &StagePanel, director: &dyn StageDirector) -> OutlinerUiActions {
    let mut actions = OutlinerUiActions::default();
    ui.horizontal(|ui| {
        if ui.button("Refresh").clicked() {
            actions.refresh = true;
        }
    });
    ui.separator();

    if let PanelContent::Restricted { message } = panel.content() {
        ui.colored_label(egui::Color32::YELLOW, message.as_str());
        return actions;
    }

    ui.horizontal(|ui| {
        for column in Column::ALL {
            ui.strong(column.header());
        }
    });
    let [r, g, b, a] = panel.config().drop_highlight_rgba;
    let highlight = egui::Color32::from_rgba_unmultiplied(r, g, b, a);
    egui::ScrollArea::vertical().show(ui, |ui| {
        for row in panel.rows(director) {
            draw_row(ui, panel, &row, highlight, &mut actions);
        }
    });

    let any_payload = egui::DragAndDrop::has_any_payload(ui.ctx());
    let has_active_drag = panel.outliner().is_some_and(|outliner| outliner.active_drag().is_some());
    if has_active_drag && !any_payload && actions.dropped.is_none() {
        actions.drag_released = true;
    }
    actions
}

fn draw_row(
    ui: &mut egui::Ui,
    panel: &StagePanel,
    row: &RowView,
    highlight: egui::Color32,
    actions: &mut OutlinerUiActions,
) {
    let fill = if row.flags.contains(RowFlags::DROP_TARGET) { highlight } else { egui::Color32::TRANSPARENT };
    let frame = egui::Frame::default().fill(fill).show(ui, |ui| {
        ui.horizontal(|ui| {
            ui.add_space(row.depth as f32 * INDENT);
            if row.flags.contains(RowFlags::HAS_CHILDREN) {
                let arrow = if row.flags.contains(RowFlags::EXPANDED) { "v" } else { ">" };
                if ui.small_button(arrow).clicked() {
                    actions.toggled = Some(row.handle);
                }
            }
            if let Some(mut active) = row.toggle() {
                if ui.checkbox(&mut active, "").changed() && active {
                    if let Some(stage) = row.stage {
                        actions.action = Some(PanelAction::SetActiveStage { stage });
                    }
                }
            }
            if !row.identifier.is_empty() {
                ui.weak(row.identifier.as_str());
            }
            let mut text = egui::RichText::new(row.name.as_str());
            if row.flags.contains(RowFlags::BOLD) {
                text = text.strong();
            }
            if row.flags.contains(RowFlags::INVALID) {
                text = text.color(egui::Color32::LIGHT_RED);
            }
            let name = egui::Button::new(text).frame(false).selected(row.flags.contains(RowFlags::SELECTED));
            let name_response = if row.kind == TreeItemKind::Entity {
                let drag_id = egui::Id::new(("stage_outliner_entity", row.handle));
                let inner = ui.dnd_drag_source(drag_id, EntityRowDrag { row: row.handle }, |ui| ui.add(name));
                if inner.response.drag_started() {
                    actions.drag_started = Some(row.handle);
                }
                inner.inner
            } else {
                ui.add(name)
            };
            if name_response.clicked() {
                let modifiers = ui.input(|input| input.modifiers);
                actions.clicked = Some((row.handle, modifiers.command || modifiers.shift));
            }
            if name_response.double_clicked() {
                actions.double_clicked = Some(row.handle);
            }
            name_response.context_menu(|ui| {
                if actions.clicked.is_none() && !row.flags.contains(RowFlags::SELECTED) {
                    actions.clicked = Some((row.handle, false));
                }
                for entry in panel.context_menu().unwrap_or_default() {
                    if ui.add_enabled(entry.enabled, egui::Button::new(entry.label)).clicked() {
                        actions.action = Some(entry.action.clone());
                        ui.close();
                    }
                }
            });
            for entry in &row.actions {
                if ui.add_enabled(entry.enabled, egui::Button::new(entry.label).small()).clicked() {
                    actions.action = Some(entry.action.clone());
                }
            }
        });
    });

    let response = frame.response;
    if response.dnd_hover_payload::<EntityRowDrag>().is_some() {
        actions.drag_entered = Some(row.handle);
    }
    if let Some(payload) = response.dnd_hover_payload::<ActorDrag>() {
        actions.actor_drag = Some(payload.actors.clone());
        actions.drag_entered = Some(row.handle);
    }
    let released = response.dnd_release_payload::<EntityRowDrag>().is_some()
        || response.dnd_release_payload::<ActorDrag>().is_some();
    if released {
        actions.dropped = Some(row.handle);
    }
}

/// Applies one frame's interactions to the panel.
pub fn apply_ui_actions(
    panel: &mut StagePanel,
    actions: OutlinerUiActions,
    director: &mut dyn StageDirector,
    viewport: &mut dyn ViewportSelection,
    dialog: &mut dyn ConfirmDialog,
) {
    if actions.refresh {
        panel.on_refresh_clicked(director);
    }
    if let Some(handle) = actions.toggled {
        panel.toggle_expansion(handle);
    }
    if let Some((handle, additive)) = actions.clicked {
        panel.on_row_clicked(handle, additive);
    }
    if let Some(handle) = actions.double_clicked {
        panel.on_row_double_clicked(director, viewport, handle);
    }
    if let Some(handle) = actions.drag_started {
        panel.begin_drag(handle);
    }
    if let Some(actors) = actions.actor_drag {
        let already_dragging = panel.outliner().is_some_and(|outliner| outliner.active_drag().is_some());
        if !already_dragging {
            panel.begin_actor_drag(actors);
        }
    }
    if let Some(handle) = actions.drag_entered {
        panel.on_drag_enter(handle);
    }
    if let Some(handle) = actions.dropped {
        panel.on_drop(director, handle);
    } else if actions.drag_released {
        panel.end_drag();
    }
    if let Some(action) = actions.action {
        panel.execute_action(director, viewport, dialog, &action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PanelConfig;
    use crate::dialog::AutoConfirm;
    use crate::viewport::ViewportSelectionSet;
    use crate::world::StageWorld;

    #[test]
    fn outliner_frame_draws_and_applies_without_interaction() {
        let mut world = StageWorld::new();
        world.add_stage("Harbor");
        let mut panel = StagePanel::new(PanelConfig::default(), &world);
        let ctx = egui::Context::default();
        let mut collected = None;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                collected = Some(show_outliner(ui, &panel, &world));
            });
        });
        let actions = collected.expect("frame ran");
        assert!(actions.action.is_none());
        assert!(!actions.drag_released);

        let mut viewport = ViewportSelectionSet::new();
        let mut dialog = AutoConfirm::accept();
        apply_ui_actions(&mut panel, actions, &mut world, &mut viewport, &mut dialog);
        assert_eq!(panel.rows(&world).len(), 3);
    }
}
