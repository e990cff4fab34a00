//! Execution context pushed from a container down to its children

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering}
};

use crate::domain::{storage::Storage, variable::Variables};

/// Cooperative stop flag; clones share the flag, so another thread may set it
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn same_as(&self, other: &StopSignal) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// The stop flags an actor has to watch: its own plus those of all its ancestors
#[derive(Debug, Clone, Default)]
pub struct StopCheck {
    signals: Vec<StopSignal>
}

impl StopCheck {
    pub fn new(signals: Vec<StopSignal>) -> Self {
        Self { signals }
    }

    pub fn is_set(&self) -> bool {
        self.signals.iter().any(StopSignal::is_set)
    }
}

/// What an actor inherits from its parent
#[derive(Debug, Clone, Default)]
pub struct ActorContext {
    /// Full name of the parent, absent for a root actor
    pub parent_full_name: Option<String>,
    pub variables:        Variables,
    /// Storage of the closest storage-owning ancestor
    pub storage:          Option<Storage>,
    /// Own stop flags of every ancestor, root first
    pub ancestor_stops:   Vec<StopSignal>
}

impl ActorContext {
    pub fn is_root(&self) -> bool {
        self.parent_full_name.is_none()
    }

    /// Builds the context a container hands to its children
    pub fn for_children(
        &self,
        full_name: &str,
        own_stop: &StopSignal,
        own_storage: Option<&Storage>
    ) -> ActorContext {
        let mut ancestor_stops = self.ancestor_stops.clone();
        ancestor_stops.push(own_stop.clone());
        ActorContext {
            parent_full_name: Some(full_name.to_string()),
            variables: self.variables.clone(),
            storage: own_storage.cloned().or_else(|| self.storage.clone()),
            ancestor_stops
        }
    }
}
