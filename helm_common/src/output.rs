//! Actuator output bank: the only path from commands to hardware.
//!
//! Commands never drive motors or valves directly. Each cycle they write
//! demanded outputs into the [`ActuatorBank`]; an external hardware layer
//! mirrors the bank after the cycle completes. Outputs are latched: a motor
//! power or solenoid state holds until some command writes it again, which
//! is what lets toggle-style commands read-modify-write a solenoid.

use crate::consts::{MAX_RESOURCES, MOTOR_CHANNELS, SOLENOID_CHANNELS};

/// Demanded outputs for one resource (actuator group).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorOutputs {
    /// Motor power per channel, clamped to `[-1.0, 1.0]`.
    pub motor: [f64; MOTOR_CHANNELS],
    /// Solenoid state per channel (latched).
    pub solenoid: [bool; SOLENOID_CHANNELS],
}

impl Default for ActuatorOutputs {
    fn default() -> Self {
        Self {
            motor: [0.0; MOTOR_CHANNELS],
            solenoid: [false; SOLENOID_CHANNELS],
        }
    }
}

impl ActuatorOutputs {
    /// Demand motor power on `channel`, clamped to `[-1.0, 1.0]`.
    #[inline]
    pub fn set_motor(&mut self, channel: usize, power: f64) {
        self.motor[channel] = power.clamp(-1.0, 1.0);
    }

    /// Current demanded power on `channel`.
    #[inline]
    pub fn motor(&self, channel: usize) -> f64 {
        self.motor[channel]
    }

    /// Latch a solenoid state.
    #[inline]
    pub fn set_solenoid(&mut self, channel: usize, on: bool) {
        self.solenoid[channel] = on;
    }

    /// Invert a solenoid state, returning the new state.
    #[inline]
    pub fn toggle_solenoid(&mut self, channel: usize) -> bool {
        self.solenoid[channel] = !self.solenoid[channel];
        self.solenoid[channel]
    }

    /// Current solenoid state.
    #[inline]
    pub fn solenoid(&self, channel: usize) -> bool {
        self.solenoid[channel]
    }

    /// Zero all motor channels (solenoids stay latched).
    pub fn stop_motors(&mut self) {
        self.motor = [0.0; MOTOR_CHANNELS];
    }
}

/// Preallocated outputs for every possible resource id.
///
/// Indexed by the dense resource id the scheduler's table mints; ids are
/// always below [`MAX_RESOURCES`], so unregistered slots simply stay zeroed.
#[derive(Debug, Clone, Copy)]
pub struct ActuatorBank {
    units: [ActuatorOutputs; MAX_RESOURCES],
}

impl Default for ActuatorBank {
    fn default() -> Self {
        Self {
            units: [ActuatorOutputs::default(); MAX_RESOURCES],
        }
    }
}

impl ActuatorBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outputs of one resource.
    #[inline]
    pub fn unit(&self, resource: u8) -> &ActuatorOutputs {
        &self.units[resource as usize]
    }

    /// Mutable outputs of one resource.
    #[inline]
    pub fn unit_mut(&mut self, resource: u8) -> &mut ActuatorOutputs {
        &mut self.units[resource as usize]
    }

    /// Zero every motor channel on every resource (disable path).
    ///
    /// Solenoids stay latched; dropping power must not cycle valves.
    pub fn stop_all_motors(&mut self) {
        for unit in self.units.iter_mut() {
            unit.stop_motors();
        }
    }
}
