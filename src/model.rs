use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

pub type StageId = i32;
pub type ActId = i32;
pub type EntityId = i32;

/// Act id reserved for the Default Act every Stage carries.
pub const DEFAULT_ACT_ID: ActId = 0;

/// Opaque reference to an actor owned by the external world.
///
/// Holding one does not keep the actor alive; the director decides whether it still
/// resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorRef(Uuid);

impl ActorRef {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn uuid(self) -> Uuid {
        self.0
    }
}

impl Default for ActorRef {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActInitialState {
    #[default]
    Unloaded,
    Loaded,
    Activated,
}

impl ActInitialState {
    pub fn label(self) -> &'static str {
        match self {
            ActInitialState::Unloaded => "Unloaded",
            ActInitialState::Loaded => "Loaded",
            ActInitialState::Activated => "Activated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Act {
    pub id: ActId,
    pub display_name: String,
    #[serde(default)]
    pub follow_parent_state: bool,
    #[serde(default)]
    pub initial_state: ActInitialState,
    /// Entity id -> state value applied while this Act is active.
    #[serde(default)]
    pub entity_state_overrides: BTreeMap<EntityId, i32>,
}

impl Act {
    pub fn new(id: ActId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            follow_parent_state: false,
            initial_state: ActInitialState::default(),
            entity_state_overrides: BTreeMap::new(),
        }
    }

    pub fn default_act() -> Self {
        Self::new(DEFAULT_ACT_ID, "Default Act")
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_ACT_ID
    }

    pub fn entity_state(&self, entity: EntityId) -> Option<i32> {
        self.entity_state_overrides.get(&entity).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub id: StageId,
    /// The stage's own actor in the world; its label names the Stage row.
    pub actor: ActorRef,
    #[serde(default)]
    pub acts: Vec<Act>,
    #[serde(default)]
    pub entity_registry: BTreeMap<EntityId, ActorRef>,
}

impl StageRecord {
    pub fn act(&self, id: ActId) -> Option<&Act> {
        self.acts.iter().find(|act| act.id == id)
    }

    pub fn act_mut(&mut self, id: ActId) -> Option<&mut Act> {
        self.acts.iter_mut().find(|act| act.id == id)
    }

    pub fn entity_actor(&self, id: EntityId) -> Option<ActorRef> {
        self.entity_registry.get(&id).copied()
    }

    pub fn entity_id_of(&self, actor: ActorRef) -> Option<EntityId> {
        self.entity_registry.iter().find_map(|(id, registered)| (*registered == actor).then_some(*id))
    }
}

/// One entry of the viewport's selection set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionObject {
    Actor(ActorRef),
    /// Anything selectable that is not an actor (components, brushes, ...).
    Other(String),
}

impl SelectionObject {
    pub fn as_actor(&self) -> Option<ActorRef> {
        match self {
            SelectionObject::Actor(actor) => Some(*actor),
            SelectionObject::Other(_) => None,
        }
    }
}
