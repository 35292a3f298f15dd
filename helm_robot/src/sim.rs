//! Scripted operator input for desktop runs.
//!
//! A script is a TOML timeline of pad events. Each event edits the held
//! pad state at its cycle; the state then persists until a later event
//! changes it, which is how a held button or a sustained trigger pull is
//! expressed:
//!
//! ```toml
//! [[event]]
//! cycle = 10
//! port = 1
//! press = ["a"]
//!
//! [[event]]
//! cycle = 60
//! port = 1
//! release = ["a"]
//! axis = [{ axis = "left_trigger", value = 0.8 }]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use helm_common::config::{ConfigError, ConfigLoader};
use helm_common::consts::MAX_PADS;
use helm_common::input::{DpadDirection, GamepadAxis, GamepadButton, InputSource, PadState};

/// A whole input timeline, sorted by [`ScriptedInput::new`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InputScript {
    #[serde(default, rename = "event")]
    pub events: Vec<ScriptEvent>,
}

/// One edit to a pad's held state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptEvent {
    /// Control cycle the edit lands on.
    pub cycle: u64,

    /// Pad port. Default: 0 (driver).
    #[serde(default)]
    pub port: u8,

    /// Buttons pushed down at this cycle.
    #[serde(default)]
    pub press: Vec<GamepadButton>,

    /// Buttons let go at this cycle.
    #[serde(default)]
    pub release: Vec<GamepadButton>,

    /// Axis values set at this cycle.
    #[serde(default)]
    pub axis: Vec<AxisEvent>,

    /// D-pad direction pressed at this cycle.
    #[serde(default)]
    pub pov: Option<DpadDirection>,

    /// Releases the D-pad at this cycle.
    #[serde(default)]
    pub clear_pov: bool,
}

/// An axis set to an absolute value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AxisEvent {
    pub axis: GamepadAxis,
    pub value: f64,
}

/// Plays an [`InputScript`] as a live input source.
pub struct ScriptedInput {
    events: Vec<ScriptEvent>,
    cursor: usize,
    pads: [PadState; MAX_PADS],
}

impl ScriptedInput {
    pub fn new(mut script: InputScript) -> Self {
        // Stable sort keeps same-cycle events in listed order.
        script.events.sort_by_key(|e| e.cycle);
        Self {
            events: script.events,
            cursor: 0,
            pads: [PadState::default(); MAX_PADS],
        }
    }

    /// Loads and sorts a script file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::new(InputScript::load(path)?))
    }

    /// Events not yet applied.
    pub fn remaining(&self) -> usize {
        self.events.len() - self.cursor
    }

    /// Cycle of the final scripted event, for sizing a run.
    pub fn last_cycle(&self) -> Option<u64> {
        self.events.last().map(|e| e.cycle)
    }

    fn apply(pads: &mut [PadState; MAX_PADS], event: &ScriptEvent) {
        let Some(pad) = pads.get_mut(event.port as usize) else {
            warn!(
                port = event.port,
                cycle = event.cycle,
                "script event on unknown port dropped"
            );
            return;
        };
        for &button in &event.press {
            pad.press(button);
        }
        for &button in &event.release {
            pad.release(button);
        }
        for axis_event in &event.axis {
            pad.set_axis(axis_event.axis, axis_event.value);
        }
        if let Some(direction) = event.pov {
            pad.pov = Some(direction);
        }
        if event.clear_pov {
            pad.pov = None;
        }
    }
}

impl InputSource for ScriptedInput {
    fn begin_cycle(&mut self, cycle: u64) {
        while let Some(event) = self.events.get(self.cursor) {
            if event.cycle > cycle {
                break;
            }
            Self::apply(&mut self.pads, event);
            self.cursor += 1;
        }
    }

    fn sample(&mut self, port: u8) -> PadState {
        if (port as usize) < MAX_PADS {
            self.pads[port as usize]
        } else {
            PadState::default()
        }
    }
}
