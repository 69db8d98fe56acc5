//! Non-blocking association state machine.
//!
//! ```text
//!   Idle ──start──▶ Connecting ──Connected observed──▶ Connected
//!                        │
//!                        └──timeout elapsed──────────▶ TimedOut
//! ```
//!
//! [`AssociationAttempt::step`] is the step function a cooperative
//! scheduler calls; `ConnectionSupervisor::begin` wraps it in a bounded
//! blocking loop.  Both terminal phases are sticky until the next `start`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationPhase {
    Idle,
    Connecting { started_at_ms: u64 },
    Connected { elapsed_ms: u64 },
    TimedOut { waited_ms: u64 },
}

impl AssociationPhase {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Connected { .. } | Self::TimedOut { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AssociationAttempt {
    phase: AssociationPhase,
    timeout_ms: u64,
}

impl Default for AssociationAttempt {
    fn default() -> Self {
        Self::new()
    }
}

impl AssociationAttempt {
    pub const fn new() -> Self {
        Self {
            phase: AssociationPhase::Idle,
            timeout_ms: 0,
        }
    }

    /// Arm the attempt.  Restarts any previous attempt.
    pub fn start(&mut self, now_ms: u64, timeout_ms: u32) {
        self.phase = AssociationPhase::Connecting {
            started_at_ms: now_ms,
        };
        self.timeout_ms = u64::from(timeout_ms);
    }

    pub fn phase(&self) -> AssociationPhase {
        self.phase
    }

    /// Advance with the latest observation.  `connected` wins over the
    /// deadline when both hold on the same step.
    pub fn step(&mut self, connected: bool, now_ms: u64) -> AssociationPhase {
        if let AssociationPhase::Connecting { started_at_ms } = self.phase {
            let elapsed = now_ms.saturating_sub(started_at_ms);
            if connected {
                self.phase = AssociationPhase::Connected {
                    elapsed_ms: elapsed,
                };
            } else if elapsed >= self.timeout_ms {
                self.phase = AssociationPhase::TimedOut { waited_ms: elapsed };
            }
        }
        self.phase
    }
}
