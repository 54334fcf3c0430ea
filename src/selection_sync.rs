use crate::director::StageDirector;
use crate::model::{ActorRef, SelectionObject};
use crate::path_index::PathIndex;
use crate::tree_item::{ItemForest, ItemHandle};
use crate::viewport::ViewportSelection;
use crate::widget::TreeWidget;
use std::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    SyncingFromViewport,
    SyncingFromPanel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Reentrant(SyncState),
    NoWidget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Ignored(IgnoreReason),
    /// No actor in the viewport selection; the tree selection was cleared.
    Cleared,
    Selected(ItemHandle),
    /// The actor has no row (not registered, or its entry went stale).
    NotFound,
}

/// Holds the sync state for one synchronization call and puts it back to `Idle` on drop,
/// whichever way the call exits.
#[must_use]
pub struct SyncGuard<'a> {
    state: &'a Cell<SyncState>,
}

impl<'a> SyncGuard<'a> {
    fn acquire(state: &'a Cell<SyncState>, next: SyncState) -> Option<Self> {
        if state.get() != SyncState::Idle {
            return None;
        }
        state.set(next);
        Some(Self { state })
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.state.set(SyncState::Idle);
    }
}

/// Read-only view of everything a viewport -> tree sync consults.
pub struct SyncContext<'a> {
    pub forest: &'a ItemForest,
    pub index: &'a PathIndex,
    pub director: &'a dyn StageDirector,
    pub viewport: &'a dyn ViewportSelection,
}

/// Mirrors the viewport selection into the tree, one direction only.
///
/// All entry points take `&self`: a call that re-enters from inside a widget callback
/// sees the in-flight state and returns without touching anything.
#[derive(Debug, Default)]
pub struct SelectionSync {
    state: Cell<SyncState>,
}

impl SelectionSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SyncState {
        self.state.get()
    }

    pub fn is_idle(&self) -> bool {
        self.state.get() == SyncState::Idle
    }

    pub fn sync_from_viewport<W: TreeWidget + ?Sized>(
        &self,
        ctx: &SyncContext<'_>,
        changed: Option<&SelectionObject>,
        widget: Option<&mut W>,
    ) -> SyncOutcome {
        let Some(_guard) = SyncGuard::acquire(&self.state, SyncState::SyncingFromViewport) else {
            let current = self.state.get();
            tracing::trace!("[selection] ignoring viewport selection change while {current:?}");
            return SyncOutcome::Ignored(IgnoreReason::Reentrant(current));
        };
        let Some(widget) = widget else {
            return SyncOutcome::Ignored(IgnoreReason::NoWidget);
        };

        // Held from here on: resolving the actor reads the viewport, which may call back.
        let actor = changed
            .and_then(SelectionObject::as_actor)
            .or_else(|| ctx.viewport.selected_objects().iter().find_map(SelectionObject::as_actor));
        let Some(actor) = actor else {
            widget.clear_selection();
            return SyncOutcome::Cleared;
        };

        let Some(row) = ctx.director.actor_path(actor).and_then(|path| ctx.index.lookup(path, ctx.forest, ctx.director))
        else {
            tracing::debug!("[selection] actor {actor} has no outliner row");
            return SyncOutcome::NotFound;
        };

        for ancestor in ctx.forest.ancestors(row) {
            widget.set_expansion(ancestor, true);
        }
        widget.set_selection(&[row]);
        widget.request_scroll_into_view(row);
        SyncOutcome::Selected(row)
    }

    /// Panel -> viewport: selects `actor` in the viewport. The echoed viewport event, if
    /// the viewport raises it synchronously, is ignored by the in-flight state.
    pub fn select_actor_in_viewport(&self, viewport: &mut dyn ViewportSelection, actor: ActorRef) -> bool {
        let Some(_guard) = SyncGuard::acquire(&self.state, SyncState::SyncingFromPanel) else {
            tracing::trace!("[selection] skipping viewport select while {:?}", self.state.get());
            return false;
        };
        viewport.select_actor(actor);
        true
    }

    /// Tree row selection never mutates the viewport or the data store.
    pub fn tree_selection_changed(&self, selected: &[ItemHandle]) {
        tracing::trace!("[selection] tree selection now {} rows ({:?})", selected.len(), self.state.get());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_restores_idle_on_drop() {
        let sync = SelectionSync::new();
        {
            let guard = SyncGuard::acquire(&sync.state, SyncState::SyncingFromPanel);
            assert!(guard.is_some());
            assert_eq!(sync.state(), SyncState::SyncingFromPanel);
            assert!(SyncGuard::acquire(&sync.state, SyncState::SyncingFromViewport).is_none());
        }
        assert!(sync.is_idle());
    }

    #[test]
    fn missing_widget_releases_the_state() {
        let sync = SelectionSync::new();
        let world = crate::world::StageWorld::new();
        let forest = ItemForest::new();
        let index = PathIndex::new();
        let viewport = crate::viewport::ViewportSelectionSet::new();
        let ctx = SyncContext { forest: &forest, index: &index, director: &world, viewport: &viewport };
        let outcome = sync.sync_from_viewport::<crate::widget::TreeViewState>(&ctx, None, None);
        assert_eq!(outcome, SyncOutcome::Ignored(IgnoreReason::NoWidget));
        assert!(sync.is_idle());
    }
}
