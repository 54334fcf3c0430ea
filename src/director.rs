use crate::model::{ActId, ActorRef, EntityId, StageId, StageRecord};
use std::fmt;

/// Push notifications a director queues for the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorNotification {
    MapChanged,
    PostSaveWorld,
    StageDataChanged(StageId),
    /// Broadcast after any successful mutation.
    ModelChanged,
}

impl fmt::Display for DirectorNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectorNotification::MapChanged => write!(f, "MapChanged"),
            DirectorNotification::PostSaveWorld => write!(f, "PostSaveWorld"),
            DirectorNotification::StageDataChanged(stage) => write!(f, "StageDataChanged stage={stage}"),
            DirectorNotification::ModelChanged => write!(f, "ModelChanged"),
        }
    }
}

/// The data/control collaborator that owns Stages, Acts and entity registries.
///
/// The outliner only reads through the query half and edits through the mutation half;
/// it never touches stage records directly. Mutations report whether anything changed
/// and queue [`DirectorNotification::ModelChanged`] when they did.
pub trait StageDirector {
    fn stages(&self) -> &[StageRecord];

    fn stage(&self, id: StageId) -> Option<&StageRecord> {
        self.stages().iter().find(|stage| stage.id == id)
    }

    /// Label of a live actor, `None` once the reference went stale.
    fn actor_label(&self, actor: ActorRef) -> Option<&str>;

    /// Stable path of a live actor, used as the selection lookup key.
    fn actor_path(&self, actor: ActorRef) -> Option<&str>;

    fn is_actor_alive(&self, actor: ActorRef) -> bool {
        self.actor_label(actor).is_some()
    }

    fn is_capability_active(&self) -> bool;

    fn active_stage(&self) -> Option<StageId>;

    fn set_active_stage(&mut self, stage: StageId) -> bool;

    /// Creates a new Act and returns its id.
    fn create_act(&mut self, stage: StageId) -> Option<ActId>;

    /// Never deletes the Default Act.
    fn delete_act(&mut self, stage: StageId, act: ActId) -> bool;

    fn rename_act(&mut self, stage: StageId, act: ActId, name: &str) -> bool;

    fn set_entity_state_in_act(&mut self, stage: StageId, entity: EntityId, act: ActId, state: i32) -> bool;

    fn remove_entity_from_act(&mut self, stage: StageId, entity: EntityId, act: ActId) -> bool;

    fn remove_all_entities_from_act(&mut self, stage: StageId, act: ActId) -> bool;

    /// Returns true when at least one actor was newly registered.
    fn register_entities(&mut self, stage: StageId, actors: &[ActorRef]) -> bool;

    fn unregister_entity(&mut self, stage: StageId, entity: EntityId) -> bool;

    fn unregister_all_entities(&mut self, stage: StageId) -> bool;

    fn preview_act(&mut self, stage: StageId, act: ActId) -> bool;

    /// Rescans the world for Stages.
    fn rescan(&mut self);

    fn drain_notifications(&mut self) -> Vec<DirectorNotification>;
}
