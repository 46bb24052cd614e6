use std::fmt;
use std::time::Instant;

use crate::error::{PilotError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    Launching,
    WaitingForCompletion,
    Advancing,
    Exhausted,
}

impl PhaseKind {
    pub fn allowed_transitions(&self) -> &'static [PhaseKind] {
        use PhaseKind::*;
        match self {
            Launching => &[WaitingForCompletion],
            WaitingForCompletion => &[WaitingForCompletion, Advancing],
            // Advancing -> Advancing retries a failed write of the next index.
            Advancing => &[Advancing, WaitingForCompletion, Exhausted],
            Exhausted => &[],
        }
    }

    pub fn can_transition_to(&self, target: PhaseKind) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PhaseKind::Exhausted)
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Launching => "Launching",
            Self::WaitingForCompletion => "WaitingForCompletion",
            Self::Advancing => "Advancing",
            Self::Exhausted => "Exhausted",
        };
        write!(f, "{}", s)
    }
}

/// Supervisor state. `index` always refers to the destination whose batch is
/// being launched, awaited, or advanced away from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPhase {
    Launching {
        index: usize,
    },
    WaitingForCompletion {
        index: usize,
        /// First tick of the current uninterrupted "not running" streak.
        absent_since: Option<Instant>,
    },
    Advancing {
        index: usize,
    },
    Exhausted,
}

impl RotationPhase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Self::Launching { .. } => PhaseKind::Launching,
            Self::WaitingForCompletion { .. } => PhaseKind::WaitingForCompletion,
            Self::Advancing { .. } => PhaseKind::Advancing,
            Self::Exhausted => PhaseKind::Exhausted,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Launching { index }
            | Self::WaitingForCompletion { index, .. }
            | Self::Advancing { index } => Some(*index),
            Self::Exhausted => None,
        }
    }

    pub fn waiting(index: usize) -> Self {
        Self::WaitingForCompletion {
            index,
            absent_since: None,
        }
    }

    /// Check that moving to `next` is legal and return it.
    pub fn transition(self, next: RotationPhase) -> Result<RotationPhase> {
        let (from, to) = (self.kind(), next.kind());
        if !from.can_transition_to(to) {
            let allowed = from
                .allowed_transitions()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(PilotError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
                allowed: if allowed.is_empty() {
                    "none".to_string()
                } else {
                    allowed
                },
            });
        }
        Ok(next)
    }
}

impl fmt::Display for RotationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index() {
            Some(index) => write!(f, "{}({})", self.kind(), index),
            None => write!(f, "{}", self.kind()),
        }
    }
}
