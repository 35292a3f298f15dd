//! Robot phase management.
//!
//! The match phases: `Disabled`, `Autonomous`, `Teleop`. The machine itself
//! is pure state; the cycle runner performs the side effects of a transition
//! (scheduling the selected autonomous routine, canceling it on teleop
//! handoff, canceling everything on disable).

/// Top-level operating phase of the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum RobotPhase {
    /// Outputs neutral, no commands run. Triggers keep sampling so edge
    /// history stays continuous across re-enable.
    #[default]
    Disabled = 0,
    /// The selected autonomous routine runs; operator bindings are inert.
    Autonomous = 1,
    /// Operator bindings drive the scheduler.
    Teleop = 2,
}

impl RobotPhase {
    /// Whether bindings apply and the scheduler ticks in this phase.
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// Phase-change requests, typically delivered by the field/driver station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    StartAutonomous,
    StartTeleop,
    Disable,
}

/// Result of a phase-change attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseTransition {
    /// Phase changed.
    Ok(RobotPhase),
    /// Request rejected; the phase is unchanged.
    Rejected(&'static str),
}

/// Event-driven phase machine.
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phase: RobotPhase,
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseMachine {
    /// Starts `Disabled`.
    pub const fn new() -> Self {
        Self {
            phase: RobotPhase::Disabled,
        }
    }

    #[inline]
    pub const fn phase(&self) -> RobotPhase {
        self.phase
    }

    /// Attempt a phase change.
    ///
    /// Match order is one-way: autonomous can only be entered from
    /// `Disabled`, teleop follows autonomous or `Disabled`, and `Disable`
    /// is accepted from any enabled phase.
    pub fn apply(&mut self, event: PhaseEvent) -> PhaseTransition {
        use PhaseEvent::*;
        use RobotPhase::*;

        let next = match (self.phase, event) {
            (Disabled, StartAutonomous) => Autonomous,
            (Disabled, StartTeleop) => Teleop,
            (Autonomous, StartTeleop) => Teleop,
            (Autonomous, Disable) | (Teleop, Disable) => Disabled,
            (Disabled, Disable) => return PhaseTransition::Rejected("already disabled"),
            (Autonomous, StartAutonomous) => {
                return PhaseTransition::Rejected("already in autonomous");
            }
            (Teleop, StartTeleop) => return PhaseTransition::Rejected("already in teleop"),
            (Teleop, StartAutonomous) => {
                return PhaseTransition::Rejected("autonomous requires a disabled start");
            }
        };
        self.phase = next;
        PhaseTransition::Ok(next)
    }
}
