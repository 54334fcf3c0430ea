/// How much of the panel a refresh has to rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    /// The capability flag flipped: discard the whole child content.
    FullReplace { capability_active: bool },
    /// Same presentation; rebuild rows and restore expansion only.
    DataOnly,
}

/// Caches the external capability flag and classifies each refresh.
#[derive(Debug, Clone)]
pub struct CapabilityGate {
    cached: bool,
    flips: u32,
}

impl CapabilityGate {
    pub fn new(initial: bool) -> Self {
        Self { cached: initial, flips: 0 }
    }

    pub fn is_active(&self) -> bool {
        self.cached
    }

    /// Number of full replaces triggered so far.
    pub fn flips(&self) -> u32 {
        self.flips
    }

    pub fn evaluate(&mut self, active: bool) -> RefreshKind {
        if active == self.cached {
            return RefreshKind::DataOnly;
        }
        tracing::debug!("[gate] capability {} -> {}", self.cached, active);
        self.cached = active;
        self.flips += 1;
        RefreshKind::FullReplace { capability_active: active }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_changes_trigger_a_full_replace() {
        let mut gate = CapabilityGate::new(false);
        assert_eq!(gate.evaluate(false), RefreshKind::DataOnly);
        assert_eq!(gate.evaluate(true), RefreshKind::FullReplace { capability_active: true });
        assert_eq!(gate.evaluate(true), RefreshKind::DataOnly);
        assert!(gate.is_active());
        assert_eq!(gate.flips(), 1);
    }
}
