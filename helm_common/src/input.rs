//! Operator input model: gamepads sampled once per control cycle.
//!
//! The control core never talks to input hardware. An [`InputSource`]
//! implementation (driver-station bridge, replay script, test fixture)
//! produces one [`PadState`] per port per cycle; the cycle runner snapshots
//! them into an [`InputFrame`] so every consumer of the same cycle sees the
//! same values.
//!
//! Axis conventions follow the driver-station model: stick axes read in
//! `[-1.0, 1.0]`, trigger axes in `[0.0, 1.0]`. The directional pad is a
//! multi-valued discrete input with at most one active direction.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

use crate::consts::MAX_PADS;

// ─── Buttons ────────────────────────────────────────────────────────

bitflags! {
    /// Pressed-button mask for one gamepad.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ButtonSet: u16 {
        const A            = 1 << 0;
        const B            = 1 << 1;
        const X            = 1 << 2;
        const Y            = 1 << 3;
        const LEFT_BUMPER  = 1 << 4;
        const RIGHT_BUMPER = 1 << 5;
        const BACK         = 1 << 6;
        const START        = 1 << 7;
        const LEFT_STICK   = 1 << 8;
        const RIGHT_STICK  = 1 << 9;
    }
}

/// Digital buttons of a standard gamepad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum GamepadButton {
    A = 0,
    B = 1,
    X = 2,
    Y = 3,
    LeftBumper = 4,
    RightBumper = 5,
    Back = 6,
    Start = 7,
    LeftStick = 8,
    RightStick = 9,
}

impl GamepadButton {
    /// Number of button variants.
    pub const COUNT: usize = 10;

    /// Bit in the [`ButtonSet`] mask for this button.
    pub const fn mask(self) -> ButtonSet {
        match self {
            Self::A => ButtonSet::A,
            Self::B => ButtonSet::B,
            Self::X => ButtonSet::X,
            Self::Y => ButtonSet::Y,
            Self::LeftBumper => ButtonSet::LEFT_BUMPER,
            Self::RightBumper => ButtonSet::RIGHT_BUMPER,
            Self::Back => ButtonSet::BACK,
            Self::Start => ButtonSet::START,
            Self::LeftStick => ButtonSet::LEFT_STICK,
            Self::RightStick => ButtonSet::RIGHT_STICK,
        }
    }
}

// Every button variant must fit the u16 mask.
const_assert!(GamepadButton::COUNT <= 16);

// ─── Axes ───────────────────────────────────────────────────────────

/// Analog axes of a standard gamepad.
///
/// Stick axes read in `[-1.0, 1.0]`, trigger axes in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum GamepadAxis {
    LeftX = 0,
    LeftY = 1,
    RightX = 2,
    RightY = 3,
    LeftTrigger = 4,
    RightTrigger = 5,
}

impl GamepadAxis {
    /// Number of axis variants.
    pub const COUNT: usize = 6;

    /// Index into a [`PadState`] axis array.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Trigger axes rest at 0.0 and read in `[0.0, 1.0]`.
    pub const fn is_trigger(self) -> bool {
        matches!(self, Self::LeftTrigger | Self::RightTrigger)
    }
}

/// Directional-pad directions (at most one active at a time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DpadDirection {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

// ─── Channel identifiers ────────────────────────────────────────────

/// One digital button on one controller port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonId {
    pub port: u8,
    pub button: GamepadButton,
}

impl ButtonId {
    pub const fn new(port: u8, button: GamepadButton) -> Self {
        Self { port, button }
    }
}

/// One analog axis on one controller port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisId {
    pub port: u8,
    pub axis: GamepadAxis,
}

impl AxisId {
    pub const fn new(port: u8, axis: GamepadAxis) -> Self {
        Self { port, axis }
    }
}

// ─── Sampled state ──────────────────────────────────────────────────

/// Sampled state of one gamepad for one control cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PadState {
    /// Pressed buttons.
    pub buttons: ButtonSet,
    /// Axis values indexed by [`GamepadAxis::index`].
    pub axes: [f64; GamepadAxis::COUNT],
    /// Active D-pad direction, if any.
    pub pov: Option<DpadDirection>,
}

impl Default for PadState {
    fn default() -> Self {
        Self {
            buttons: ButtonSet::empty(),
            axes: [0.0; GamepadAxis::COUNT],
            pov: None,
        }
    }
}

impl PadState {
    /// Whether the given button is pressed.
    #[inline]
    pub fn pressed(&self, button: GamepadButton) -> bool {
        self.buttons.contains(button.mask())
    }

    /// Value of the given axis.
    #[inline]
    pub fn axis(&self, axis: GamepadAxis) -> f64 {
        self.axes[axis.index()]
    }

    /// Mark a button as pressed.
    pub fn press(&mut self, button: GamepadButton) {
        self.buttons.insert(button.mask());
    }

    /// Mark a button as released.
    pub fn release(&mut self, button: GamepadButton) {
        self.buttons.remove(button.mask());
    }

    /// Set an axis value (unclamped; sources are expected to respect ranges).
    pub fn set_axis(&mut self, axis: GamepadAxis, value: f64) {
        self.axes[axis.index()] = value;
    }
}

/// All pads sampled for one control cycle.
///
/// Out-of-range ports read as an all-inactive pad, so stale port numbers in
/// a binding degrade to "never pressed" rather than a crash.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputFrame {
    pads: [PadState; MAX_PADS],
}

impl InputFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// State of the pad on `port` (default state when out of range).
    #[inline]
    pub fn pad(&self, port: u8) -> PadState {
        if (port as usize) < MAX_PADS {
            self.pads[port as usize]
        } else {
            PadState::default()
        }
    }

    /// Replace the state of the pad on `port`; out-of-range ports are ignored.
    pub fn set_pad(&mut self, port: u8, state: PadState) {
        if (port as usize) < MAX_PADS {
            self.pads[port as usize] = state;
        }
    }

    /// Digital read of one button.
    #[inline]
    pub fn digital(&self, id: ButtonId) -> bool {
        self.pad(id.port).pressed(id.button)
    }

    /// Analog read of one axis.
    #[inline]
    pub fn analog(&self, id: AxisId) -> f64 {
        self.pad(id.port).axis(id.axis)
    }

    /// Active D-pad direction on `port`, if any.
    #[inline]
    pub fn dpad(&self, port: u8) -> Option<DpadDirection> {
        self.pad(port).pov
    }
}

// ─── Sources ────────────────────────────────────────────────────────

/// Produces pad states, one sample per port per control cycle.
pub trait InputSource {
    /// Called once at the start of every control cycle, before sampling.
    fn begin_cycle(&mut self, _cycle: u64) {}

    /// Sample the pad on `port`. Disconnected ports return the default state.
    fn sample(&mut self, port: u8) -> PadState;

    /// Snapshot all ports into a frame.
    fn frame(&mut self) -> InputFrame {
        let mut frame = InputFrame::new();
        for port in 0..MAX_PADS as u8 {
            frame.set_pad(port, self.sample(port));
        }
        frame
    }
}

/// Null source: every pad reads as inactive.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleInput;

impl InputSource for IdleInput {
    fn sample(&mut self, _port: u8) -> PadState {
        PadState::default()
    }
}
