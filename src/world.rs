use crate::director::{DirectorNotification, StageDirector};
use crate::model::{Act, ActId, ActorRef, EntityId, StageId, StageRecord, DEFAULT_ACT_ID};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorRecord {
    pub id: ActorRef,
    pub label: String,
    #[serde(default)]
    pub path: String,
}

/// Serialized form of a [`StageWorld`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    #[serde(default = "WorldSnapshot::default_capability_active")]
    pub capability_active: bool,
    #[serde(default)]
    pub active_stage: Option<StageId>,
    #[serde(default)]
    pub actors: Vec<ActorRecord>,
    #[serde(default)]
    pub stages: Vec<StageRecord>,
}

impl WorldSnapshot {
    const fn default_capability_active() -> bool {
        true
    }
}

impl Default for WorldSnapshot {
    fn default() -> Self {
        Self {
            capability_active: Self::default_capability_active(),
            active_stage: None,
            actors: Vec::new(),
            stages: Vec::new(),
        }
    }
}

/// Data problems `audit` can find in a world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldIssue {
    DuplicateStageId { stage: StageId },
    StaleStageActor { stage: StageId },
    MissingDefaultAct { stage: StageId },
    DuplicateActId { stage: StageId, act: ActId },
    DanglingOverride { stage: StageId, act: ActId, entity: EntityId },
    StaleRegistryEntry { stage: StageId, entity: EntityId },
}

impl fmt::Display for WorldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldIssue::DuplicateStageId { stage } => write!(f, "duplicate stage id {stage}"),
            WorldIssue::StaleStageActor { stage } => write!(f, "stage {stage} references a missing actor"),
            WorldIssue::MissingDefaultAct { stage } => write!(f, "stage {stage} has no Default Act (id 0)"),
            WorldIssue::DuplicateActId { stage, act } => write!(f, "stage {stage} repeats act id {act}"),
            WorldIssue::DanglingOverride { stage, act, entity } => {
                write!(f, "stage {stage} act {act} overrides unregistered entity {entity}")
            }
            WorldIssue::StaleRegistryEntry { stage, entity } => {
                write!(f, "stage {stage} entity {entity} references a missing actor")
            }
        }
    }
}

/// In-memory [`StageDirector`]: a world of actors plus the Stages registered in it.
#[derive(Debug, Default)]
pub struct StageWorld {
    actors: BTreeMap<ActorRef, ActorRecord>,
    stages: Vec<StageRecord>,
    active_stage: Option<StageId>,
    capability_active: bool,
    previewed_act: Option<(StageId, ActId)>,
    applied_states: BTreeMap<ActorRef, i32>,
    notifications: Vec<DirectorNotification>,
}

impl StageWorld {
    pub fn new() -> Self {
        Self { capability_active: true, ..Self::default() }
    }

    pub fn from_snapshot(snapshot: WorldSnapshot) -> Self {
        let mut world = Self::new();
        world.capability_active = snapshot.capability_active;
        for mut actor in snapshot.actors {
            if actor.path.is_empty() {
                actor.path = default_actor_path(actor.id);
            }
            world.actors.insert(actor.id, actor);
        }
        world.stages = snapshot.stages;
        world.active_stage = snapshot
            .active_stage
            .filter(|id| world.stages.iter().any(|stage| stage.id == *id))
            .or_else(|| world.stages.first().map(|stage| stage.id));
        world
    }

    pub fn to_snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            capability_active: self.capability_active,
            active_stage: self.active_stage,
            actors: self.actors.values().cloned().collect(),
            stages: self.stages.clone(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("Reading world snapshot {}", path.display()))?;
        let snapshot = serde_json::from_slice::<WorldSnapshot>(&bytes)
            .with_context(|| format!("Parsing world snapshot {}", path.display()))?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating snapshot directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.to_snapshot())?;
        fs::write(path, json.as_bytes())
            .with_context(|| format!("Writing world snapshot {}", path.display()))?;
        Ok(())
    }

    pub fn spawn_actor(&mut self, label: impl Into<String>) -> ActorRef {
        let id = ActorRef::new();
        let record = ActorRecord { id, label: label.into(), path: default_actor_path(id) };
        self.actors.insert(id, record);
        id
    }

    /// Removes the actor from the world; every reference to it goes stale.
    pub fn destroy_actor(&mut self, actor: ActorRef) -> bool {
        let removed = self.actors.remove(&actor).is_some();
        self.applied_states.remove(&actor);
        removed
    }

    pub fn rename_actor(&mut self, actor: ActorRef, label: impl Into<String>) -> bool {
        match self.actors.get_mut(&actor) {
            Some(record) => {
                record.label = label.into();
                self.notify(DirectorNotification::ModelChanged);
                true
            }
            None => false,
        }
    }

    /// Spawns a stage actor and a Stage holding only the Default Act.
    pub fn add_stage(&mut self, label: impl Into<String>) -> StageId {
        let actor = self.spawn_actor(label);
        let id = self.stages.iter().map(|stage| stage.id).max().unwrap_or(0) + 1;
        self.stages.push(StageRecord {
            id,
            actor,
            acts: vec![Act::default_act()],
            entity_registry: BTreeMap::new(),
        });
        if self.active_stage.is_none() {
            self.active_stage = Some(id);
        }
        self.notify(DirectorNotification::StageDataChanged(id));
        id
    }

    /// Inserts a stage record as-is, replacing any stage with the same id.
    pub fn insert_stage(&mut self, record: StageRecord) {
        let id = record.id;
        match self.stages.iter_mut().find(|stage| stage.id == id) {
            Some(existing) => *existing = record,
            None => self.stages.push(record),
        }
        if self.active_stage.is_none() {
            self.active_stage = Some(id);
        }
        self.notify(DirectorNotification::StageDataChanged(id));
    }

    pub fn set_capability_active(&mut self, active: bool) {
        self.capability_active = active;
    }

    /// Queues an externally originated notification (map change, save, ...).
    pub fn notify(&mut self, notification: DirectorNotification) {
        self.notifications.push(notification);
    }

    pub fn pending_notifications(&self) -> &[DirectorNotification] {
        &self.notifications
    }

    pub fn previewed_act(&self) -> Option<(StageId, ActId)> {
        self.previewed_act
    }

    /// State last applied to an actor by an Act preview.
    pub fn applied_state(&self, actor: ActorRef) -> Option<i32> {
        self.applied_states.get(&actor).copied()
    }

    pub fn audit(&self) -> Vec<WorldIssue> {
        let mut issues = Vec::new();
        let mut seen_stages = HashSet::new();
        for stage in &self.stages {
            if !seen_stages.insert(stage.id) {
                issues.push(WorldIssue::DuplicateStageId { stage: stage.id });
            }
            if !self.actors.contains_key(&stage.actor) {
                issues.push(WorldIssue::StaleStageActor { stage: stage.id });
            }
            if stage.act(DEFAULT_ACT_ID).is_none() {
                issues.push(WorldIssue::MissingDefaultAct { stage: stage.id });
            }
            let mut seen_acts = HashSet::new();
            for act in &stage.acts {
                if !seen_acts.insert(act.id) {
                    issues.push(WorldIssue::DuplicateActId { stage: stage.id, act: act.id });
                }
                for entity in act.entity_state_overrides.keys() {
                    if !stage.entity_registry.contains_key(entity) {
                        issues.push(WorldIssue::DanglingOverride { stage: stage.id, act: act.id, entity: *entity });
                    }
                }
            }
            for (entity, actor) in &stage.entity_registry {
                if !self.actors.contains_key(actor) {
                    issues.push(WorldIssue::StaleRegistryEntry { stage: stage.id, entity: *entity });
                }
            }
        }
        issues
    }

    fn stage_mut(&mut self, id: StageId) -> Option<&mut StageRecord> {
        self.stages.iter_mut().find(|stage| stage.id == id)
    }

    fn model_changed(&mut self) {
        self.notify(DirectorNotification::ModelChanged);
    }
}

fn default_actor_path(id: ActorRef) -> String {
    format!("/World/PersistentLevel.{}", id.uuid().simple())
}

impl StageDirector for StageWorld {
    fn stages(&self) -> &[StageRecord] {
        &self.stages
    }

    fn actor_label(&self, actor: ActorRef) -> Option<&str> {
        self.actors.get(&actor).map(|record| record.label.as_str())
    }

    fn actor_path(&self, actor: ActorRef) -> Option<&str> {
        self.actors.get(&actor).map(|record| record.path.as_str())
    }

    fn is_capability_active(&self) -> bool {
        self.capability_active
    }

    fn active_stage(&self) -> Option<StageId> {
        self.active_stage
    }

    fn set_active_stage(&mut self, stage: StageId) -> bool {
        if self.stage(stage).is_none() {
            return false;
        }
        self.active_stage = Some(stage);
        self.model_changed();
        true
    }

    fn create_act(&mut self, stage: StageId) -> Option<ActId> {
        let record = self.stage_mut(stage)?;
        let Some(id) = record.acts.iter().map(|act| act.id).max().unwrap_or(0).max(0).checked_add(1) else {
            tracing::warn!("[stage_world] stage {stage}: no Act id left to assign");
            return None;
        };
        record.acts.push(Act::new(id, format!("Act_{id}")));
        tracing::debug!("[stage_world] stage {stage}: created Act_{id}");
        self.model_changed();
        Some(id)
    }

    fn delete_act(&mut self, stage: StageId, act: ActId) -> bool {
        if act == DEFAULT_ACT_ID {
            tracing::warn!("[stage_world] stage {stage}: refusing to delete the Default Act");
            return false;
        }
        let Some(record) = self.stage_mut(stage) else {
            return false;
        };
        let before = record.acts.len();
        record.acts.retain(|existing| existing.id != act);
        if record.acts.len() == before {
            return false;
        }
        if self.previewed_act == Some((stage, act)) {
            self.previewed_act = None;
        }
        self.model_changed();
        true
    }

    fn rename_act(&mut self, stage: StageId, act: ActId, name: &str) -> bool {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return false;
        }
        let Some(existing) = self.stage_mut(stage).and_then(|record| record.act_mut(act)) else {
            return false;
        };
        existing.display_name = trimmed.to_string();
        self.model_changed();
        true
    }

    fn set_entity_state_in_act(&mut self, stage: StageId, entity: EntityId, act: ActId, state: i32) -> bool {
        let Some(record) = self.stage_mut(stage) else {
            return false;
        };
        if !record.entity_registry.contains_key(&entity) {
            return false;
        }
        let Some(existing) = record.act_mut(act) else {
            return false;
        };
        existing.entity_state_overrides.insert(entity, state);
        self.model_changed();
        true
    }

    fn remove_entity_from_act(&mut self, stage: StageId, entity: EntityId, act: ActId) -> bool {
        let removed = self
            .stage_mut(stage)
            .and_then(|record| record.act_mut(act))
            .is_some_and(|existing| existing.entity_state_overrides.remove(&entity).is_some());
        if removed {
            self.model_changed();
        }
        removed
    }

    fn remove_all_entities_from_act(&mut self, stage: StageId, act: ActId) -> bool {
        let Some(existing) = self.stage_mut(stage).and_then(|record| record.act_mut(act)) else {
            return false;
        };
        if existing.entity_state_overrides.is_empty() {
            return false;
        }
        existing.entity_state_overrides.clear();
        self.model_changed();
        true
    }

    fn register_entities(&mut self, stage: StageId, actors: &[ActorRef]) -> bool {
        let live: Vec<ActorRef> = actors.iter().copied().filter(|actor| self.actors.contains_key(actor)).collect();
        let Some(record) = self.stage_mut(stage) else {
            return false;
        };
        let mut any_registered = false;
        for actor in live {
            if record.entity_id_of(actor).is_some() {
                continue;
            }
            let Some(id) = record.entity_registry.keys().max().map_or(Some(1), |max| max.checked_add(1)) else {
                tracing::warn!("[stage_world] stage {stage}: no entity id left to assign");
                break;
            };
            record.entity_registry.insert(id, actor);
            match record.act_mut(DEFAULT_ACT_ID) {
                Some(default_act) => {
                    default_act.entity_state_overrides.insert(id, 0);
                }
                None => {
                    let mut default_act = Act::default_act();
                    default_act.entity_state_overrides.insert(id, 0);
                    record.acts.insert(0, default_act);
                }
            }
            tracing::debug!("[stage_world] stage {stage}: registered entity {id} ({actor})");
            any_registered = true;
        }
        if any_registered {
            self.model_changed();
        }
        any_registered
    }

    fn unregister_entity(&mut self, stage: StageId, entity: EntityId) -> bool {
        let Some(record) = self.stage_mut(stage) else {
            return false;
        };
        let was_registered = record.entity_registry.remove(&entity).is_some();
        let mut was_referenced = false;
        for act in &mut record.acts {
            was_referenced |= act.entity_state_overrides.remove(&entity).is_some();
        }
        let changed = was_registered || was_referenced;
        if changed {
            self.model_changed();
        }
        changed
    }

    fn unregister_all_entities(&mut self, stage: StageId) -> bool {
        let Some(record) = self.stage_mut(stage) else {
            return false;
        };
        let had_entities = !record.entity_registry.is_empty()
            || record.acts.iter().any(|act| !act.entity_state_overrides.is_empty());
        if !had_entities {
            return false;
        }
        record.entity_registry.clear();
        for act in &mut record.acts {
            act.entity_state_overrides.clear();
        }
        self.model_changed();
        true
    }

    fn preview_act(&mut self, stage: StageId, act: ActId) -> bool {
        let Some(record) = self.stage(stage) else {
            return false;
        };
        let Some(target) = record.act(act) else {
            tracing::warn!("[stage_world] stage {stage}: failed to preview act {act}, act not found");
            return false;
        };
        let mut applied = Vec::new();
        for (entity, state) in &target.entity_state_overrides {
            match record.entity_actor(*entity).filter(|actor| self.actors.contains_key(actor)) {
                Some(actor) => applied.push((actor, *state)),
                None => {
                    tracing::warn!("[stage_world] stage {stage}: entity {entity} missing during act preview")
                }
            }
        }
        self.applied_states.extend(applied);
        self.previewed_act = Some((stage, act));
        true
    }

    fn rescan(&mut self) {
        let actors = &self.actors;
        self.stages.retain(|stage| actors.contains_key(&stage.actor));
        self.active_stage = self.stages.first().map(|stage| stage.id);
        tracing::info!("[stage_world] rescan found {} stages", self.stages.len());
        self.model_changed();
    }

    fn drain_notifications(&mut self) -> Vec<DirectorNotification> {
        self.notifications.drain(..).collect()
    }
}
