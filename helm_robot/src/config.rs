//! Robot configuration loaded from TOML at startup.
//!
//! Every field has a sane default so an empty file yields a drivable
//! robot. Validation failures are fatal: a bad power constant is a
//! wiring-sheet error, not something to limp along with.

use helm_common::config::LogLevel;
use helm_common::consts::MAX_PADS;
use serde::{Deserialize, Serialize};

/// Top-level robot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Gamepad port assignments.
    #[serde(default)]
    pub controllers: ControllerConfig,

    /// Open-loop power constants per mechanism.
    #[serde(default)]
    pub powers: PowerConfig,

    /// Shooter setpoints and sequence timing.
    #[serde(default)]
    pub shooter: ShooterConfig,

    /// Autonomous routine selected at boot. Default: "cross_line".
    #[serde(default = "default_autonomous")]
    pub autonomous: String,

    /// Log verbosity. Default: info.
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            controllers: ControllerConfig::default(),
            powers: PowerConfig::default(),
            shooter: ShooterConfig::default(),
            autonomous: default_autonomous(),
            log_level: LogLevel::default(),
        }
    }
}

/// Gamepad port assignments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Driver gamepad port. Default: 0.
    #[serde(default = "default_driver_port")]
    pub driver_port: u8,

    /// Operator gamepad port. Default: 1.
    #[serde(default = "default_operator_port")]
    pub operator_port: u8,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            driver_port: default_driver_port(),
            operator_port: default_operator_port(),
        }
    }
}

/// Open-loop duty-cycle magnitudes, all in (0.0, 1.0].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PowerConfig {
    /// Intake roller power. Default: 0.8.
    #[serde(default = "default_intake_power")]
    pub intake: f64,

    /// Magazine belt power. Default: 0.75.
    #[serde(default = "default_magazine_power")]
    pub magazine: f64,

    /// Mast extension power. Default: 0.5.
    #[serde(default = "default_mast_power")]
    pub mast: f64,

    /// Winch retract power. Default: 0.9.
    #[serde(default = "default_winch_power")]
    pub winch: f64,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            intake: default_intake_power(),
            magazine: default_magazine_power(),
            mast: default_mast_power(),
            winch: default_winch_power(),
        }
    }
}

/// Shooter setpoints. Speeds are in flywheel revolutions per second;
/// the motor demand sent out is `speed / max_speed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ShooterConfig {
    /// Bench-test flywheel speed. Default: 25.0.
    #[serde(default = "default_test_speed")]
    pub test_speed: f64,

    /// Flywheel speed at full demand. Default: 28.0.
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,

    /// Cycles to spin the flywheel up before feeding. Default: 50 (1 s).
    #[serde(default = "default_spin_up_cycles")]
    pub spin_up_cycles: u64,

    /// Cycles to run the feed while holding speed. Default: 150 (3 s).
    #[serde(default = "default_feed_cycles")]
    pub feed_cycles: u64,
}

impl Default for ShooterConfig {
    fn default() -> Self {
        Self {
            test_speed: default_test_speed(),
            max_speed: default_max_speed(),
            spin_up_cycles: default_spin_up_cycles(),
            feed_cycles: default_feed_cycles(),
        }
    }
}

fn default_autonomous() -> String {
    "cross_line".to_string()
}

fn default_driver_port() -> u8 {
    0
}

fn default_operator_port() -> u8 {
    1
}

fn default_intake_power() -> f64 {
    0.8
}

fn default_magazine_power() -> f64 {
    0.75
}

fn default_mast_power() -> f64 {
    0.5
}

fn default_winch_power() -> f64 {
    0.9
}

fn default_test_speed() -> f64 {
    25.0
}

fn default_max_speed() -> f64 {
    28.0
}

fn default_spin_up_cycles() -> u64 {
    50
}

fn default_feed_cycles() -> u64 {
    150
}

impl RobotConfig {
    /// Validates semantic constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        let c = &self.controllers;
        if c.driver_port as usize >= MAX_PADS {
            return Err(format!(
                "driver_port {} out of range (max {})",
                c.driver_port,
                MAX_PADS - 1
            ));
        }
        if c.operator_port as usize >= MAX_PADS {
            return Err(format!(
                "operator_port {} out of range (max {})",
                c.operator_port,
                MAX_PADS - 1
            ));
        }
        if c.driver_port == c.operator_port {
            return Err(format!(
                "driver and operator share port {}",
                c.driver_port
            ));
        }

        for (name, power) in [
            ("intake", self.powers.intake),
            ("magazine", self.powers.magazine),
            ("mast", self.powers.mast),
            ("winch", self.powers.winch),
        ] {
            if !(power > 0.0 && power <= 1.0) {
                return Err(format!(
                    "{name} power {power} outside (0.0, 1.0]"
                ));
            }
        }

        let s = &self.shooter;
        if s.max_speed <= 0.0 {
            return Err(format!("shooter max_speed {} must be positive", s.max_speed));
        }
        if !(s.test_speed > 0.0 && s.test_speed <= s.max_speed) {
            return Err(format!(
                "shooter test_speed {} outside (0.0, {}]",
                s.test_speed, s.max_speed
            ));
        }
        if s.spin_up_cycles == 0 {
            return Err("shooter spin_up_cycles must be at least 1".to_string());
        }
        if s.feed_cycles == 0 {
            return Err("shooter feed_cycles must be at least 1".to_string());
        }

        Ok(())
    }
}
