use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    /// User-facing notice, shown by the host as a toast or status line.
    Notice { message: String },
    TreeRebuilt { stages: usize, items: usize },
    UiReplaced { capability_active: bool },
}

impl PanelEvent {
    pub fn notice(message: impl Into<String>) -> Self {
        PanelEvent::Notice { message: message.into() }
    }

    pub fn as_notice(&self) -> Option<&str> {
        match self {
            PanelEvent::Notice { message } => Some(message.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for PanelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelEvent::Notice { message } => write!(f, "Notice {message}"),
            PanelEvent::TreeRebuilt { stages, items } => {
                write!(f, "TreeRebuilt stages={stages} items={items}")
            }
            PanelEvent::UiReplaced { capability_active } => {
                write!(f, "UiReplaced capability_active={capability_active}")
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<PanelEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: PanelEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<PanelEvent> {
        self.events.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
