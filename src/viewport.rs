use crate::model::{ActorRef, SelectionObject};

/// The editor viewport's selection set.
pub trait ViewportSelection {
    fn selected_objects(&self) -> Vec<SelectionObject>;

    /// Replaces the selection with exactly `actor`.
    fn select_actor(&mut self, actor: ActorRef);

    fn selected_actors(&self) -> Vec<ActorRef> {
        self.selected_objects().iter().filter_map(SelectionObject::as_actor).collect()
    }
}

/// In-memory selection set. Records every change so a host can forward them to the
/// panel as selection-changed events.
#[derive(Debug, Default, Clone)]
pub struct ViewportSelectionSet {
    objects: Vec<SelectionObject>,
    changes: Vec<Option<SelectionObject>>,
}

impl ViewportSelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, objects: Vec<SelectionObject>) {
        let changed = objects.first().cloned();
        self.objects = objects;
        self.changes.push(changed);
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.changes.push(None);
    }

    pub fn drain_changes(&mut self) -> Vec<Option<SelectionObject>> {
        self.changes.drain(..).collect()
    }
}

impl ViewportSelection for ViewportSelectionSet {
    fn selected_objects(&self) -> Vec<SelectionObject> {
        self.objects.clone()
    }

    fn select_actor(&mut self, actor: ActorRef) {
        self.set(vec![SelectionObject::Actor(actor)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_actors_skips_non_actor_entries() {
        let actor = ActorRef::new();
        let mut selection = ViewportSelectionSet::new();
        selection.set(vec![SelectionObject::Other("Brush_3".into()), SelectionObject::Actor(actor)]);
        assert_eq!(selection.selected_actors(), vec![actor]);
        assert_eq!(selection.drain_changes(), vec![Some(SelectionObject::Other("Brush_3".into()))]);
    }
}
