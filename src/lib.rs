pub mod capability;
pub mod cli;
pub mod columns;
pub mod config;
pub mod dialog;
pub mod director;
pub mod drag_drop;
pub mod events;
pub mod expansion;
pub mod logging;
pub mod model;
pub mod panel;
pub mod path_index;
pub mod selection_sync;
pub mod tree_builder;
pub mod tree_item;
#[cfg(feature = "editor")]
pub mod ui;
pub mod viewport;
pub mod widget;
pub mod world;

pub use director::StageDirector;
pub use panel::{PanelContent, StagePanel};
pub use world::StageWorld;
