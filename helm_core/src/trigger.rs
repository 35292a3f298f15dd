//! Edge-classified input conditions.
//!
//! A [`Trigger`] wraps a boolean condition over the input frame (a button, an
//! axis threshold, or a D-pad direction) and classifies it each cycle against
//! the previous cycle's value into one of four [`Edge`] states. The
//! classification is memoized per cycle, so any number of bindings referencing
//! the same trigger observe one consistent edge.

use helm_common::input::{AxisId, ButtonId, DpadDirection, InputFrame};

// ─── Edge Classification ────────────────────────────────────────────

/// Relation between a trigger's previous and current boolean value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Edge {
    /// Low last cycle, high this cycle.
    RisingEdge = 0,
    /// High last cycle, low this cycle.
    FallingEdge = 1,
    /// High both cycles.
    SteadyHigh = 2,
    /// Low both cycles.
    SteadyLow = 3,
}

impl Edge {
    pub const fn classify(previous: bool, current: bool) -> Self {
        match (previous, current) {
            (false, true) => Edge::RisingEdge,
            (true, false) => Edge::FallingEdge,
            (true, true) => Edge::SteadyHigh,
            (false, false) => Edge::SteadyLow,
        }
    }

    /// The condition is currently true (rising or steady high).
    pub const fn is_high(self) -> bool {
        matches!(self, Edge::RisingEdge | Edge::SteadyHigh)
    }

    pub const fn is_rising(self) -> bool {
        matches!(self, Edge::RisingEdge)
    }

    pub const fn is_falling(self) -> bool {
        matches!(self, Edge::FallingEdge)
    }
}

// ─── Trigger Sources ────────────────────────────────────────────────

/// The raw boolean condition a trigger samples from the input frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerSource {
    /// High while the button is pressed.
    Button(ButtonId),
    /// High while the axis reads strictly above the threshold.
    AxisAbove { axis: AxisId, threshold: f64 },
    /// High while the D-pad points in the given direction.
    Dpad { port: u8, direction: DpadDirection },
}

// ─── Trigger ────────────────────────────────────────────────────────

/// A named, edge-classified condition refreshed once per cycle.
#[derive(Debug)]
pub struct Trigger {
    name: String,
    source: TriggerSource,
    previous: bool,
    memo: Option<(u64, Edge)>,
}

impl Trigger {
    pub fn button(name: impl Into<String>, id: ButtonId) -> Self {
        Self::new(name, TriggerSource::Button(id))
    }

    pub fn axis_above(name: impl Into<String>, axis: AxisId, threshold: f64) -> Self {
        Self::new(name, TriggerSource::AxisAbove { axis, threshold })
    }

    pub fn dpad(name: impl Into<String>, port: u8, direction: DpadDirection) -> Self {
        Self::new(name, TriggerSource::Dpad { port, direction })
    }

    fn new(name: impl Into<String>, source: TriggerSource) -> Self {
        Self {
            name: name.into(),
            source,
            previous: false,
            memo: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> TriggerSource {
        self.source
    }

    /// Classify this cycle's edge, sampling the frame at most once per cycle.
    ///
    /// A repeat call with the same cycle number returns the memoized edge
    /// without touching the frame or the previous-value state.
    pub fn refresh(&mut self, cycle: u64, frame: &InputFrame) -> Edge {
        if let Some((memo_cycle, edge)) = self.memo {
            if memo_cycle == cycle {
                return edge;
            }
        }
        let current = self.sample(frame);
        let edge = Edge::classify(self.previous, current);
        self.previous = current;
        self.memo = Some((cycle, edge));
        edge
    }

    /// The edge produced by the most recent [`refresh`](Self::refresh).
    pub fn edge(&self) -> Option<Edge> {
        self.memo.map(|(_, edge)| edge)
    }

    fn sample(&self, frame: &InputFrame) -> bool {
        match self.source {
            TriggerSource::Button(id) => frame.digital(id),
            TriggerSource::AxisAbove { axis, threshold } => frame.analog(axis) > threshold,
            TriggerSource::Dpad { port, direction } => frame.dpad(port) == Some(direction),
        }
    }
}
