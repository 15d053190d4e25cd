//! Configuration types for the spiking lattice simulation.

use serde::{Deserialize, Serialize};

/// Default activity floor for the activation gate.
fn default_activity_floor() -> f32 {
    0.008
}

/// Default Bernoulli probability for the activation gate.
fn default_trigger_probability() -> f32 {
    0.07
}

/// Default Gaussian falloff width of the influence kernel.
fn default_kernel_sigma() -> f32 {
    5.0
}

/// Top-level simulation configuration.
///
/// Immutable once handed to a [`Simulator`](crate::compute::Simulator);
/// `validate` is called at simulator construction and refuses invalid
/// parameter sets instead of clamping them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Lattice width in cells (X dimension).
    pub width: usize,
    /// Lattice height in cells (Y dimension).
    pub height: usize,
    /// Lattice depth in cells (Z dimension).
    pub depth: usize,
    /// Neighbor reach per axis, in cells.
    pub sens_radius: usize,
    /// Value at/above which a cell counts as spiking; also the value a cell
    /// receives when the activation gate fires.
    pub threshold: f32,
    /// Per-step value decay while a cell is active.
    pub spiking_speed: f32,
    /// Per-step value decay while a cell is relaxing.
    pub relaxation_speed: f32,
    /// Value at/below which a relaxing cell returns to idle.
    pub relaxation_threshold: f32,
    /// Minimum summed active-neighbor influence for the activation gate.
    #[serde(default = "default_activity_floor")]
    pub activity_floor: f32,
    /// Probability that an idle cell above the activity floor actually fires.
    #[serde(default = "default_trigger_probability")]
    pub trigger_probability: f32,
    /// Gaussian falloff width of the influence kernel.
    #[serde(default = "default_kernel_sigma")]
    pub kernel_sigma: f32,
    /// RNG seed for reproducible runs. `None` draws entropy at startup.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 50,
            height: 50,
            depth: 50,
            sens_radius: 2,
            threshold: 1.0,
            spiking_speed: 0.5,
            relaxation_speed: 0.1,
            relaxation_threshold: 0.1,
            activity_floor: default_activity_floor(),
            trigger_probability: default_trigger_probability(),
            kernel_sigma: default_kernel_sigma(),
            random_seed: None,
        }
    }
}

impl SimulationConfig {
    /// Total cell count (width * height * depth).
    ///
    /// A zero-volume lattice is legal; stepping it is a no-op.
    #[inline]
    pub fn volume(&self) -> usize {
        self.width * self.height * self.depth
    }

    /// Kernel edge length (2 * sens_radius + 1).
    #[inline]
    pub fn kernel_diameter(&self) -> usize {
        2 * self.sens_radius + 1
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("threshold", self.threshold),
            ("spiking_speed", self.spiking_speed),
            ("relaxation_speed", self.relaxation_speed),
            ("relaxation_threshold", self.relaxation_threshold),
            ("activity_floor", self.activity_floor),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name, value });
            }
        }
        if self.relaxation_threshold > self.threshold {
            return Err(ConfigError::RelaxationAboveThreshold {
                relaxation_threshold: self.relaxation_threshold,
                threshold: self.threshold,
            });
        }
        if !self.trigger_probability.is_finite()
            || !(0.0..=1.0).contains(&self.trigger_probability)
        {
            return Err(ConfigError::InvalidProbability(self.trigger_probability));
        }
        if !self.kernel_sigma.is_finite() || self.kernel_sigma <= 0.0 {
            return Err(ConfigError::InvalidKernelSigma(self.kernel_sigma));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f32 },
    #[error(
        "relaxation threshold {relaxation_threshold} exceeds activation threshold {threshold}"
    )]
    RelaxationAboveThreshold {
        relaxation_threshold: f32,
        threshold: f32,
    },
    #[error("probability must lie in [0, 1], got {0}")]
    InvalidProbability(f32),
    #[error("kernel sigma must be positive and finite, got {0}")]
    InvalidKernelSigma(f32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_finite_threshold() {
        let config = SimulationConfig {
            threshold: f32::NAN,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite {
                name: "threshold",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_relaxation_above_threshold() {
        let config = SimulationConfig {
            threshold: 0.5,
            relaxation_threshold: 0.6,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RelaxationAboveThreshold { .. })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_trigger_probability() {
        let config = SimulationConfig {
            trigger_probability: 1.5,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProbability(_))
        ));
    }

    #[test]
    fn test_rejects_non_positive_kernel_sigma() {
        let config = SimulationConfig {
            kernel_sigma: 0.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidKernelSigma(_))
        ));
    }

    #[test]
    fn test_gate_constants_default_from_json() {
        // Config files written before the gate constants were exposed still load.
        let json = r#"{
            "width": 10, "height": 10, "depth": 10,
            "sens_radius": 1,
            "threshold": 1.0,
            "spiking_speed": 0.5,
            "relaxation_speed": 0.1,
            "relaxation_threshold": 0.1
        }"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.activity_floor, 0.008);
        assert_eq!(config.trigger_probability, 0.07);
        assert_eq!(config.kernel_sigma, 5.0);
        assert_eq!(config.random_seed, None);
    }

    #[test]
    fn test_zero_volume_is_legal() {
        let config = SimulationConfig {
            width: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(config.volume(), 0);
        assert!(config.validate().is_ok());
    }
}
