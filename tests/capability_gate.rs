use stage_outliner::capability::RefreshKind;
use stage_outliner::config::PanelConfig;
use stage_outliner::director::{DirectorNotification, StageDirector};
use stage_outliner::events::PanelEvent;
use stage_outliner::panel::{PanelContent, StagePanel, RESTRICTED_MESSAGE};
use stage_outliner::world::StageWorld;

fn restricted_world() -> StageWorld {
    let mut world = StageWorld::new();
    world.add_stage("Harbor");
    world.set_capability_active(false);
    world
}

#[test]
fn restricted_panel_becomes_an_outliner_when_the_capability_turns_on() {
    let mut world = restricted_world();
    let mut panel = StagePanel::new(PanelConfig::default(), &world);
    match panel.content() {
        PanelContent::Restricted { message } => assert_eq!(message, RESTRICTED_MESSAGE),
        PanelContent::Outliner(_) => panic!("capability is off"),
    }
    assert!(panel.drain_events().is_empty());
    assert_eq!(panel.ui_generation(), 1);

    world.set_capability_active(true);
    assert_eq!(panel.refresh(&world), RefreshKind::FullReplace { capability_active: true });
    assert_eq!(panel.ui_generation(), 2);
    assert!(panel.capability_active());
    assert_eq!(
        panel.drain_events(),
        vec![PanelEvent::UiReplaced { capability_active: true }, PanelEvent::TreeRebuilt { stages: 1, items: 4 }]
    );
    let outliner = panel.outliner().expect("outliner after the flip");
    assert_eq!(outliner.forest().roots().len(), 1);

    assert_eq!(panel.refresh(&world), RefreshKind::DataOnly);
    assert_eq!(panel.ui_generation(), 2);
    assert_eq!(panel.drain_events(), vec![PanelEvent::TreeRebuilt { stages: 1, items: 4 }]);
}

#[test]
fn data_only_refresh_of_a_restricted_panel_does_nothing() {
    let world = restricted_world();
    let mut panel = StagePanel::new(PanelConfig::default(), &world);
    assert_eq!(panel.refresh(&world), RefreshKind::DataOnly);
    assert_eq!(panel.ui_generation(), 1);
    assert!(panel.outliner().is_none());
    assert!(panel.drain_events().is_empty());
}

#[test]
fn turning_the_capability_off_replaces_the_tree_with_the_message() {
    let mut world = StageWorld::new();
    world.add_stage("Harbor");
    let mut panel = StagePanel::new(PanelConfig::default(), &world);
    panel.drain_events();

    world.set_capability_active(false);
    assert_eq!(panel.refresh(&world), RefreshKind::FullReplace { capability_active: false });
    assert!(matches!(panel.content(), PanelContent::Restricted { .. }));
    assert_eq!(panel.drain_events(), vec![PanelEvent::UiReplaced { capability_active: false }]);
    assert_eq!(panel.ui_generation(), 2);
}

#[test]
fn full_replace_starts_from_first_load_expansion() {
    let mut world = StageWorld::new();
    world.add_stage("Harbor");
    let mut panel = StagePanel::new(PanelConfig::default(), &world);
    let acts = {
        let outliner = panel.outliner().expect("outliner");
        outliner.forest().children(outliner.forest().roots()[0])[0]
    };
    assert!(panel.toggle_expansion(acts));
    panel.on_row_clicked(acts, false);
    assert_eq!(panel.rows(&world).len(), 4);

    world.set_capability_active(false);
    panel.refresh(&world);
    world.set_capability_active(true);
    panel.refresh(&world);

    assert_eq!(panel.ui_generation(), 3);
    let names: Vec<String> = panel.rows(&world).into_iter().map(|row| row.name).collect();
    assert_eq!(names, vec!["Harbor", "Acts", "Registered Entities"]);
    assert!(panel.selected_items().is_empty());
}

#[test]
fn pumped_notifications_pick_up_a_capability_flip() {
    let mut world = restricted_world();
    let mut panel = StagePanel::new(PanelConfig::default(), &world);
    world.drain_notifications();
    assert_eq!(panel.pump(&mut world), None);

    world.set_capability_active(true);
    world.notify(DirectorNotification::MapChanged);
    assert_eq!(panel.pump(&mut world), Some(RefreshKind::FullReplace { capability_active: true }));
    assert_eq!(panel.ui_generation(), 2);
    assert!(panel.outliner().is_some());
    assert!(world.pending_notifications().is_empty());
    panel.drain_events();

    world.notify(DirectorNotification::PostSaveWorld);
    assert_eq!(panel.pump(&mut world), Some(RefreshKind::DataOnly));
    assert_eq!(panel.ui_generation(), 2);
    assert_eq!(panel.drain_events(), vec![PanelEvent::TreeRebuilt { stages: 1, items: 4 }]);
}

#[test]
fn toolbar_refresh_drops_stages_whose_actor_is_gone() {
    let mut world = StageWorld::new();
    let harbor = world.add_stage("Harbor");
    let depot = world.add_stage("Depot");
    let mut panel = StagePanel::new(PanelConfig::default(), &world);
    panel.drain_events();
    assert_eq!(world.active_stage(), Some(harbor));

    let harbor_actor = world.stage(harbor).expect("stage").actor;
    assert!(world.destroy_actor(harbor_actor));
    assert_eq!(panel.outliner().expect("outliner").forest().roots().len(), 2);

    assert_eq!(panel.on_refresh_clicked(&mut world), RefreshKind::DataOnly);
    assert_eq!(world.active_stage(), Some(depot));
    assert!(world.pending_notifications().is_empty());
    let outliner = panel.outliner().expect("outliner");
    let roots = outliner.forest().roots();
    assert_eq!(roots.len(), 1);
    assert_eq!(outliner.forest().get(roots[0]).map(|item| item.display_name.as_str()), Some("Depot"));
    assert_eq!(panel.drain_events(), vec![PanelEvent::TreeRebuilt { stages: 1, items: 4 }]);
}
