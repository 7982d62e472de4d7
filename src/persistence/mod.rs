//! # Persistence Module
//!
//! Static configuration of the simulator, read once at startup from a TOML
//! file. Every section has defaults so a missing or partial file still
//! yields a usable setup; values are validated after loading.
//!
//! ```toml
//! log_level = "info"
//!
//! [simulator]
//! tick_interval_ms = 11
//! hand_separation = 0.3
//! origin = [0.0, 0.0, 0.0]
//! rotation_space = "local"
//! reset_restores_position = false
//!
//! [sensitivity]
//! head_x = 1.0
//! head_y = 1.0
//! hand_x = 1.0
//! hand_y = 1.0
//! invert_head_y = false
//! invert_hand_y = false
//!
//! [input]
//! reset_key = "v"
//! guide_button_resets = false
//! ```

pub mod config_store;

use color_eyre::eyre::{eyre, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::controller::controller_handle::ControllerSettings;
use crate::simulator::updater::{RotationSpace, Sensitivity, UpdaterSettings};

/// Whole configuration file
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SimulatorConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`
    pub log_level: String,
    pub simulator: RigConfig,
    pub sensitivity: SensitivityConfig,
    pub input: InputConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            simulator: RigConfig::default(),
            sensitivity: SensitivityConfig::default(),
            input: InputConfig::default(),
        }
    }
}

/// Placement of the devices and tick pacing
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct RigConfig {
    pub tick_interval_ms: u64,
    /// Distance between the two controllers, in meters
    pub hand_separation: f32,
    /// Used when no reference pose is available at startup
    pub origin: [f32; 3],
    pub rotation_space: RotationSpace,
    pub reset_restores_position: bool,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 11,
            hand_separation: 0.3,
            origin: [0.0, 0.0, 0.0],
            rotation_space: RotationSpace::Local,
            reset_restores_position: false,
        }
    }
}

/// Degrees per tick at full stick deflection
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SensitivityConfig {
    pub head_x: f32,
    pub head_y: f32,
    pub hand_x: f32,
    pub hand_y: f32,
    pub invert_head_y: bool,
    pub invert_hand_y: bool,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            head_x: 1.0,
            head_y: 1.0,
            hand_x: 1.0,
            hand_y: 1.0,
            invert_head_y: false,
            invert_hand_y: false,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Console line that triggers a reset
    pub reset_key: String,
    /// Index of the gamepad to use when several are connected
    pub preferred_gamepad: Option<usize>,
    /// Let the gamepad's guide button request a reset as well
    pub guide_button_resets: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            reset_key: "v".to_string(),
            preferred_gamepad: None,
            guide_button_resets: false,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<()> {
        let sensitivities = [
            ("head_x", self.sensitivity.head_x),
            ("head_y", self.sensitivity.head_y),
            ("hand_x", self.sensitivity.hand_x),
            ("hand_y", self.sensitivity.hand_y),
        ];
        for (name, value) in sensitivities {
            if !value.is_finite() {
                return Err(eyre!("Sensitivity {} must be finite, got {}", name, value));
            }
        }

        let separation = self.simulator.hand_separation;
        if !separation.is_finite() || separation < 0.0 {
            return Err(eyre!(
                "hand_separation must be a non-negative finite number, got {}",
                separation
            ));
        }

        if self.simulator.origin.iter().any(|c| !c.is_finite()) {
            return Err(eyre!("origin must be finite, got {:?}", self.simulator.origin));
        }

        if self.simulator.tick_interval_ms == 0 {
            return Err(eyre!("tick_interval_ms must be greater than zero"));
        }

        if self.input.reset_key.trim().is_empty() {
            return Err(eyre!("reset_key must not be empty"));
        }

        self.log_level()?;
        Ok(())
    }

    pub fn log_level(&self) -> Result<Level> {
        self.log_level
            .parse::<Level>()
            .map_err(|e| eyre!("Invalid log_level {:?}: {}", self.log_level, e))
    }

    pub fn updater_settings(&self) -> UpdaterSettings {
        UpdaterSettings {
            head: Sensitivity {
                x: self.sensitivity.head_x,
                y: self.sensitivity.head_y,
                invert_y: self.sensitivity.invert_head_y,
            },
            hand: Sensitivity {
                x: self.sensitivity.hand_x,
                y: self.sensitivity.hand_y,
                invert_y: self.sensitivity.invert_hand_y,
            },
            hand_separation: self.simulator.hand_separation,
            origin: Vec3::from_array(self.simulator.origin),
            rotation_space: self.simulator.rotation_space,
            reset_restores_position: self.simulator.reset_restores_position,
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            preferred_gamepad: self.input.preferred_gamepad,
            reset_key: self.input.reset_key.clone(),
            guide_button_resets: self.input.guide_button_resets,
            tick_interval_ms: self.simulator.tick_interval_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SimulatorConfig::default().validate().unwrap();
    }

    #[test]
    fn toml_round_trip_keeps_values() {
        let mut config = SimulatorConfig::default();
        config.sensitivity.hand_x = 0.5;
        config.sensitivity.invert_head_y = true;
        config.simulator.rotation_space = RotationSpace::Reference;
        config.input.preferred_gamepad = Some(1);

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: SimulatorConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let parsed: SimulatorConfig = toml::from_str(
            r#"
            [sensitivity]
            head_x = 2.5

            [simulator]
            rotation_space = "reference"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.sensitivity.head_x, 2.5);
        assert_eq!(parsed.sensitivity.hand_x, 1.0);
        assert_eq!(parsed.simulator.rotation_space, RotationSpace::Reference);
        assert_eq!(parsed.simulator.tick_interval_ms, 11);
        assert_eq!(parsed.input.reset_key, "v");
    }

    #[test]
    fn unknown_rotation_space_is_rejected() {
        let parsed = toml::from_str::<SimulatorConfig>(
            r#"
            [simulator]
            rotation_space = "world"
            "#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut config = SimulatorConfig::default();
        config.sensitivity.hand_y = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = SimulatorConfig::default();
        config.simulator.hand_separation = -0.1;
        assert!(config.validate().is_err());

        let mut config = SimulatorConfig::default();
        config.simulator.tick_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = SimulatorConfig::default();
        config.input.reset_key = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = SimulatorConfig::default();
        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn settings_carry_configured_values() {
        let mut config = SimulatorConfig::default();
        config.sensitivity.head_y = 3.0;
        config.sensitivity.invert_hand_y = true;
        config.simulator.origin = [0.0, 1.6, 0.0];
        config.simulator.tick_interval_ms = 20;
        config.input.guide_button_resets = true;

        let updater = config.updater_settings();
        assert_eq!(updater.head.y, 3.0);
        assert!(updater.hand.invert_y);
        assert!(!updater.head.invert_y);
        assert_eq!(updater.origin, Vec3::new(0.0, 1.6, 0.0));

        let controller = config.controller_settings();
        assert_eq!(controller.tick_interval_ms, 20);
        assert_eq!(controller.reset_key, "v");
        assert!(controller.guide_button_resets);
    }
}
