//! Solver settings, loadable from JSON.

use serde::{Deserialize, Serialize};

use crate::cluster::Strategy;
use crate::errors::ConfigurationError;

/// Settings of a relaxation run.
///
/// Missing fields take their default value when deserializing.
///
/// # Examples
/// ```
/// use rodrelax::{SolverConfig, Strategy};
///
/// let config = SolverConfig::from_json(r#"{ "max_iterations": 500, "strategy": "parallel" }"#)
///     .expect("valid settings");
/// assert_eq!(config.max_iterations, 500);
/// assert_eq!(config.strategy, Strategy::Parallel);
/// assert_eq!(config.time_step, 1.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Iteration budget.
    pub max_iterations: usize,
    /// Translational kinetic energy below which the positions are converged.
    pub x_tolerance: f64,
    /// Rotational kinetic energy below which the twist is converged.
    pub theta_tolerance: f64,
    /// Fictitious time step.
    pub time_step: f64,
    /// How element stages are dispatched.
    pub strategy: Strategy,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100_000,
            x_tolerance: 1.0e-12,
            theta_tolerance: 1.0e-12,
            time_step: 1.0,
            strategy: Strategy::Sequential,
        }
    }
}

impl SolverConfig {
    /// Parse settings from JSON.
    ///
    /// # Errors
    ///
    /// Returns the [`serde_json::Error`] raised by malformed input.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize settings to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the [`serde_json::Error`] raised by the serializer.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check that every setting is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidSetting`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let checks = [
            ("time_step", self.time_step, self.time_step > 0.0),
            ("x_tolerance", self.x_tolerance, self.x_tolerance >= 0.0),
            ("theta_tolerance", self.theta_tolerance, self.theta_tolerance >= 0.0),
        ];
        for (what, value, valid) in checks {
            if !valid || !value.is_finite() {
                return Err(ConfigurationError::InvalidSetting { what, value });
            }
        }
        Ok(())
    }
}
