use stage_outliner::capability::RefreshKind;
use stage_outliner::columns::{PanelAction, RowFlags};
use stage_outliner::config::PanelConfig;
use stage_outliner::dialog::AutoConfirm;
use stage_outliner::director::{DirectorNotification, StageDirector};
use stage_outliner::drag_drop::DropOutcome;
use stage_outliner::events::PanelEvent;
use stage_outliner::model::{ActorRef, SelectionObject, StageId};
use stage_outliner::panel::StagePanel;
use stage_outliner::selection_sync::{SyncOutcome, SyncState};
use stage_outliner::tree_item::ItemHandle;
use stage_outliner::viewport::{ViewportSelection, ViewportSelectionSet};
use stage_outliner::world::StageWorld;

struct Session {
    world: StageWorld,
    viewport: ViewportSelectionSet,
    panel: StagePanel,
    harbor: StageId,
    crate_actor: ActorRef,
    barrel: ActorRef,
}

fn session() -> Session {
    let mut world = StageWorld::new();
    let harbor = world.add_stage("Harbor");
    let crate_actor = world.spawn_actor("Crate");
    let barrel = world.spawn_actor("Barrel");
    world.drain_notifications();
    let mut viewport = ViewportSelectionSet::new();
    viewport.set(vec![SelectionObject::Actor(crate_actor), SelectionObject::Actor(barrel)]);
    let mut panel = StagePanel::new(PanelConfig::default(), &world);
    panel.drain_events();
    Session { world, viewport, panel, harbor, crate_actor, barrel }
}

fn find(panel: &StagePanel, names: &[&str]) -> ItemHandle {
    let forest = panel.outliner().expect("outliner").forest();
    let mut level: Vec<ItemHandle> = forest.roots().to_vec();
    let mut found = None;
    for name in names {
        let handle = level
            .iter()
            .copied()
            .find(|handle| forest.get(*handle).is_some_and(|item| item.display_name == *name))
            .unwrap_or_else(|| panic!("no row named {name}"));
        level = forest.children(handle).to_vec();
        found = Some(handle);
    }
    found.expect("non-empty path")
}

fn notices(events: &[PanelEvent]) -> Vec<&str> {
    events.iter().filter_map(PanelEvent::as_notice).collect()
}

fn run(s: &mut Session, dialog: &mut AutoConfirm, action: PanelAction) -> bool {
    s.panel.execute_action(&mut s.world, &mut s.viewport, dialog, &action)
}

#[test]
fn registering_viewport_actors_reports_a_notice_and_rebuilds() {
    let mut s = session();
    let harbor = s.harbor;
    let mut dialog = AutoConfirm::accept();
    assert!(run(&mut s, &mut dialog, PanelAction::RegisterSelectedActors { stage: harbor }));
    let events = s.panel.drain_events();
    assert_eq!(notices(&events), vec!["Registered 2 actors to Stage 'Harbor'"]);
    assert!(events.contains(&PanelEvent::TreeRebuilt { stages: 1, items: 8 }));
    assert!(dialog.asked().is_empty());

    assert!(!run(&mut s, &mut dialog, PanelAction::RegisterSelectedActors { stage: harbor }));
    let events = s.panel.drain_events();
    assert_eq!(notices(&events), vec!["Registration Failed: No valid actors or already registered."]);
    assert_eq!(events.len(), 1, "nothing changed, so no rebuild");
}

#[test]
fn act_lifecycle_asks_before_deleting() {
    let mut s = session();
    let harbor = s.harbor;
    let mut dialog = AutoConfirm::accept();
    assert!(run(&mut s, &mut dialog, PanelAction::CreateAct { stage: harbor }));
    assert_eq!(notices(&s.panel.drain_events()), vec!["Created new Act: Act_1"]);

    let mut decline = AutoConfirm::decline();
    assert!(!run(&mut s, &mut decline, PanelAction::DeleteAct { stage: harbor, act: 1 }));
    assert_eq!(decline.asked().len(), 1);
    assert_eq!(decline.asked()[0].title, "Delete Act");
    assert!(decline.asked()[0].message.contains("Act_1"));
    assert!(s.world.stage(s.harbor).and_then(|record| record.act(1)).is_some());

    assert!(run(&mut s, &mut dialog, PanelAction::DeleteAct { stage: harbor, act: 1 }));
    assert_eq!(dialog.asked().len(), 1);
    assert!(s.world.stage(s.harbor).and_then(|record| record.act(1)).is_none());

    let acts = find(&s.panel, &["Harbor", "Acts"]);
    s.panel.toggle_expansion(acts);
    let default_act = find(&s.panel, &["Harbor", "Acts", "Default Act"]);
    let row = s.panel.row(&s.world, default_act).expect("row");
    assert_eq!(row.identifier, "A_1.0.0");
    assert_eq!(row.actions.len(), 1);
    assert!(!row.actions[0].enabled);
}

#[test]
fn rename_with_blank_name_is_rejected() {
    let mut s = session();
    let harbor = s.harbor;
    let mut dialog = AutoConfirm::accept();
    run(&mut s, &mut dialog, PanelAction::CreateAct { stage: harbor });
    s.panel.drain_events();
    assert!(!run(&mut s, &mut dialog, PanelAction::RenameAct { stage: harbor, act: 1, name: "   ".into() }));
    assert!(run(&mut s, &mut dialog, PanelAction::RenameAct { stage: harbor, act: 1, name: "Finale".into() }));
    assert!(s.panel.outliner().is_some());
    find(&s.panel, &["Harbor", "Acts", "Finale"]);
}

#[test]
fn context_menu_follows_the_first_selected_row() {
    let mut s = session();
    let stage = find(&s.panel, &["Harbor"]);
    let acts = find(&s.panel, &["Harbor", "Acts"]);
    assert!(s.panel.context_menu().is_none());

    s.panel.on_row_clicked(stage, false);
    s.panel.on_row_clicked(acts, true);
    let menu = s.panel.context_menu().expect("stage menu");
    let labels: Vec<_> = menu.iter().map(|entry| entry.label).collect();
    assert_eq!(labels, vec!["Register Selected Actors", "Unregister All Entities", "Set Active Stage"]);

    let entities = find(&s.panel, &["Harbor", "Registered Entities"]);
    s.panel.on_row_clicked(entities, false);
    assert!(s.panel.context_menu().is_none());
}

#[test]
fn double_clicks_activate_preview_and_select() {
    let mut s = session();
    let harbor = s.harbor;
    let mut dialog = AutoConfirm::accept();
    run(&mut s, &mut dialog, PanelAction::RegisterSelectedActors { stage: harbor });
    let depot = s.world.add_stage("Depot");
    s.world.create_act(depot);
    s.panel.pump(&mut s.world);
    assert_eq!(s.world.active_stage(), Some(s.harbor));

    let depot_act = find(&s.panel, &["Depot", "Acts", "Act_1"]);
    assert!(s.panel.on_row_double_clicked(&mut s.world, &mut s.viewport, depot_act));
    assert_eq!(s.world.active_stage(), Some(depot));
    assert_eq!(s.world.previewed_act(), Some((depot, 1)));
    let depot_row = s.panel.row(&s.world, find(&s.panel, &["Depot"])).expect("depot row");
    assert!(depot_row.flags.contains(RowFlags::ACTIVE_STAGE));

    s.viewport.clear();
    let barrel_row = find(&s.panel, &["Harbor", "Registered Entities", "Barrel (ID: 2)"]);
    assert!(s.panel.on_row_double_clicked(&mut s.world, &mut s.viewport, barrel_row));
    assert_eq!(s.viewport.selected_actors(), vec![s.barrel]);
    assert_eq!(s.panel.selection_state(), SyncState::Idle);
}

#[test]
fn expansion_and_selection_survive_a_data_refresh() {
    let mut s = session();
    let harbor = s.harbor;
    let mut dialog = AutoConfirm::accept();
    run(&mut s, &mut dialog, PanelAction::RegisterSelectedActors { stage: harbor });
    let acts = find(&s.panel, &["Harbor", "Acts"]);
    s.panel.toggle_expansion(acts);
    let default_act = find(&s.panel, &["Harbor", "Acts", "Default Act"]);
    s.panel.on_row_clicked(default_act, false);

    run(&mut s, &mut dialog, PanelAction::CreateAct { stage: harbor });
    let names: Vec<String> = s.panel.rows(&s.world).into_iter().map(|row| row.name).collect();
    assert_eq!(names, vec!["Harbor", "Acts", "Default Act", "Act_1", "Registered Entities"]);
    let selected = s.panel.selected_items();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0], find(&s.panel, &["Harbor", "Acts", "Default Act"]));
    assert_ne!(selected[0], default_act, "handles from the old forest are not reused");
}

#[test]
fn viewport_selection_reveals_the_registered_row() {
    let mut s = session();
    let harbor = s.harbor;
    let mut dialog = AutoConfirm::accept();
    run(&mut s, &mut dialog, PanelAction::RegisterSelectedActors { stage: harbor });
    s.viewport.select_actor(s.crate_actor);
    let changed = SelectionObject::Actor(s.crate_actor);
    let outcome = s.panel.on_viewport_selection_changed(&s.world, &s.viewport, Some(&changed));
    let SyncOutcome::Selected(row) = outcome else {
        panic!("expected the registered row, got {outcome:?}");
    };
    assert_eq!(row, find(&s.panel, &["Harbor", "Registered Entities", "Crate (ID: 1)"]));
    let names: Vec<String> = s.panel.rows(&s.world).into_iter().map(|row| row.name).collect();
    assert!(names.contains(&"Crate (ID: 1)".to_string()));
}

#[test]
fn dropping_registered_entities_on_an_act_assigns_them() {
    let mut s = session();
    let harbor = s.harbor;
    let mut dialog = AutoConfirm::accept();
    run(&mut s, &mut dialog, PanelAction::RegisterSelectedActors { stage: harbor });
    run(&mut s, &mut dialog, PanelAction::CreateAct { stage: harbor });
    s.panel.drain_events();

    let barrel_row = find(&s.panel, &["Harbor", "Registered Entities", "Barrel (ID: 2)"]);
    let act_row = find(&s.panel, &["Harbor", "Acts", "Act_1"]);
    s.panel.on_row_clicked(barrel_row, false);
    assert!(s.panel.begin_drag(barrel_row).is_some());
    assert_eq!(s.panel.on_drag_enter(act_row), Some(act_row));
    s.panel.on_drag_leave(act_row);
    let highlighted = s.panel.row(&s.world, act_row).expect("act row");
    assert!(highlighted.flags.contains(RowFlags::DROP_TARGET));

    let outcome = s.panel.on_drop(&mut s.world, act_row);
    assert_eq!(outcome, DropOutcome::Assigned { stage: harbor, act: 1, added: 1, kept: 0 });
    let events = s.panel.drain_events();
    assert_eq!(notices(&events), vec!["Assigned 1 entities to Act 'Act_1'"]);
    let state = s.world.stage(s.harbor).and_then(|record| record.act(1)).and_then(|act| act.entity_state(2));
    assert_eq!(state, Some(0));

    let fresh_act = find(&s.panel, &["Harbor", "Acts", "Act_1"]);
    assert!(s.panel.outliner().expect("outliner").drag().hovered().is_none());
    assert_eq!(s.panel.on_drop(&mut s.world, fresh_act), DropOutcome::Unhandled);
}

fn act_state(world: &StageWorld, stage: StageId, act: i32, entity: i32) -> Option<i32> {
    world.stage(stage).and_then(|record| record.act(act)).and_then(|act| act.entity_state(entity))
}

fn registered_with_act(s: &mut Session) {
    let mut dialog = AutoConfirm::accept();
    let harbor = s.harbor;
    run(s, &mut dialog, PanelAction::RegisterSelectedActors { stage: harbor });
    run(s, &mut dialog, PanelAction::CreateAct { stage: harbor });
    s.panel.drain_events();
}

#[test]
fn drag_in_flight_survives_a_notification_rebuild() {
    let mut s = session();
    let harbor = s.harbor;
    registered_with_act(&mut s);
    let crate_row = find(&s.panel, &["Harbor", "Registered Entities", "Crate (ID: 1)"]);
    assert!(s.panel.begin_drag(crate_row).is_some());

    s.world.notify(DirectorNotification::PostSaveWorld);
    assert_eq!(s.panel.pump(&mut s.world), Some(RefreshKind::DataOnly));
    assert!(s.panel.outliner().expect("outliner").active_drag().is_some());

    let act_row = find(&s.panel, &["Harbor", "Acts", "Act_1"]);
    assert_eq!(s.panel.on_drag_enter(act_row), Some(act_row));
    let highlighted = s.panel.row(&s.world, act_row).expect("act row");
    assert!(highlighted.flags.contains(RowFlags::DROP_TARGET));

    let outcome = s.panel.on_drop(&mut s.world, act_row);
    assert_eq!(outcome, DropOutcome::Assigned { stage: harbor, act: 1, added: 1, kept: 0 });
    assert_eq!(act_state(&s.world, s.harbor, 1, 1), Some(0));
}

#[test]
fn abandoned_drag_leaves_no_highlight_and_no_change() {
    let mut s = session();
    registered_with_act(&mut s);
    let barrel_row = find(&s.panel, &["Harbor", "Registered Entities", "Barrel (ID: 2)"]);
    let act_row = find(&s.panel, &["Harbor", "Acts", "Act_1"]);
    assert!(s.panel.begin_drag(barrel_row).is_some());
    assert_eq!(s.panel.on_drag_enter(act_row), Some(act_row));
    s.panel.end_drag();

    s.panel.outliner_mut().expect("outliner").expand_all();
    let rows = s.panel.rows(&s.world);
    assert!(rows.iter().any(|row| row.handle == act_row));
    assert!(rows.iter().all(|row| !row.flags.contains(RowFlags::DROP_TARGET)));
    assert!(s.panel.outliner().expect("outliner").active_drag().is_none());
    assert!(s.world.pending_notifications().is_empty());
    assert_eq!(act_state(&s.world, s.harbor, 1, 2), None);

    assert_eq!(s.panel.on_drop(&mut s.world, act_row), DropOutcome::Unhandled);
    assert_eq!(act_state(&s.world, s.harbor, 1, 2), None);
    assert!(s.panel.drain_events().is_empty());
}

#[test]
fn notices_can_be_switched_off() {
    let mut s = session();
    let harbor = s.harbor;
    s.panel = StagePanel::new(PanelConfig { show_notices: false, ..PanelConfig::default() }, &s.world);
    s.panel.drain_events();
    let mut dialog = AutoConfirm::accept();

    assert!(run(&mut s, &mut dialog, PanelAction::RegisterSelectedActors { stage: harbor }));
    assert!(run(&mut s, &mut dialog, PanelAction::CreateAct { stage: harbor }));
    let barrel_row = find(&s.panel, &["Harbor", "Registered Entities", "Barrel (ID: 2)"]);
    let act_row = find(&s.panel, &["Harbor", "Acts", "Act_1"]);
    assert!(s.panel.begin_drag(barrel_row).is_some());
    let outcome = s.panel.on_drop(&mut s.world, act_row);
    assert_eq!(outcome, DropOutcome::Assigned { stage: harbor, act: 1, added: 1, kept: 0 });

    let events = s.panel.drain_events();
    assert!(notices(&events).is_empty());
    assert!(events.iter().any(|event| matches!(event, PanelEvent::TreeRebuilt { .. })));
}
