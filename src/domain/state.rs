//! Actor lifecycle states and capability kinds
//!
//! The lifecycle progresses `Unconfigured → Initialized → (Configuring ⇄ Ready)
//! → Running → {Stopped | Finished} → TornDown`; a torn down actor may be set up
//! again for another run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a single actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ActorState {
    /// Constructed, options not declared yet
    #[default]
    Unconfigured,
    /// Options declared
    Initialized,
    /// Configuration changed since the last successful setup
    Configuring,
    /// Setup succeeded
    Ready,
    /// Inside `execute`
    Running,
    /// Stop was requested
    Stopped,
    /// Last `execute` returned
    Finished,
    /// Buffers and resources released
    TornDown
}

impl ActorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorState::Unconfigured => "unconfigured",
            ActorState::Initialized => "initialized",
            ActorState::Configuring => "configuring",
            ActorState::Ready => "ready",
            ActorState::Running => "running",
            ActorState::Stopped => "stopped",
            ActorState::Finished => "finished",
            ActorState::TornDown => "torn-down"
        }
    }
}

impl fmt::Display for ActorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural capability of an actor, used by the directors' wiring checks
///
/// Source = produces only, Sink = consumes only, Transformer = both,
/// Standalone = neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    Source,
    Transformer,
    Sink,
    Standalone
}

impl ActorKind {
    pub fn accepts_input(&self) -> bool {
        matches!(self, ActorKind::Transformer | ActorKind::Sink)
    }

    pub fn generates_output(&self) -> bool {
        matches!(self, ActorKind::Source | ActorKind::Transformer)
    }

    pub fn is_standalone(&self) -> bool {
        matches!(self, ActorKind::Standalone)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActorKind::Source => "source",
            ActorKind::Transformer => "transformer",
            ActorKind::Sink => "sink",
            ActorKind::Standalone => "standalone"
        }
    }
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        assert!(ActorKind::Source.generates_output() && !ActorKind::Source.accepts_input());
        assert!(ActorKind::Transformer.generates_output() && ActorKind::Transformer.accepts_input());
        assert!(!ActorKind::Sink.generates_output() && ActorKind::Sink.accepts_input());
        assert!(ActorKind::Standalone.is_standalone());
        assert!(!ActorKind::Standalone.accepts_input() && !ActorKind::Standalone.generates_output());
    }
}
