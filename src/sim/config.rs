use std::path::Path;

use serde::{Deserialize, Serialize};

use super::integrator::{SolverOptions, Tolerances};
use crate::error::{FlightError, Result};

/// End of the flight integration grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndTime {
    /// Estimated from the total impulse.
    Auto,
    /// Seconds.
    Fixed(f64),
}

impl EndTime {
    /// Scales the impulse to its three leading digits, times 1.5: 5000 N·s
    /// gives 750 s, 1234 N·s gives 185.1 s.
    pub fn resolve(&self, total_impulse: f64) -> f64 {
        match *self {
            EndTime::Fixed(t) => t,
            EndTime::Auto => {
                let digits = integer_digits(total_impulse);
                total_impulse / 10f64.powi(digits - 3) * 1.5
            }
        }
    }
}

fn integer_digits(x: f64) -> i32 {
    let whole = x.abs().trunc();
    if whole < 1.0 {
        1
    } else {
        whole.log10().floor() as i32 + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub timestep: f64,         // s, flight output grid
    pub end_time: EndTime,
    pub descent_timestep: f64, // s, parachute output grid
    pub tolerances: Tolerances,
    pub max_steps: usize,      // per integration
    pub initial_step: f64,     // s
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            timestep: 0.01,
            end_time: EndTime::Auto,
            descent_timestep: 0.1,
            tolerances: Tolerances::default(),
            max_steps: 2_000_000,
            initial_step: 1e-4,
        }
    }
}

impl SimConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("timestep", self.timestep),
            ("descent_timestep", self.descent_timestep),
            ("tolerances.rtol", self.tolerances.rtol),
            ("tolerances.atol", self.tolerances.atol),
            ("initial_step", self.initial_step),
        ];
        for (name, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                return Err(FlightError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if let EndTime::Fixed(t) = self.end_time {
            if t <= 0.0 || !t.is_finite() {
                return Err(FlightError::InvalidConfig(format!(
                    "end_time must be positive, got {t}"
                )));
            }
        }
        if self.max_steps == 0 {
            return Err(FlightError::InvalidConfig("max_steps must be non-zero".into()));
        }
        Ok(())
    }

    pub fn solver_options(&self) -> SolverOptions {
        SolverOptions {
            tolerances: self.tolerances,
            initial_step: self.initial_step,
            max_steps: self.max_steps,
            ..SolverOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn auto_end_time_uses_three_leading_digits() {
        assert_relative_eq!(EndTime::Auto.resolve(5000.0), 750.0, epsilon = 1e-9);
        assert_relative_eq!(EndTime::Auto.resolve(1234.0), 185.1, epsilon = 1e-9);
        assert_relative_eq!(EndTime::Auto.resolve(456.0), 684.0, epsilon = 1e-9);
        assert_relative_eq!(EndTime::Auto.resolve(45.6), 684.0, epsilon = 1e-9);
        assert_eq!(EndTime::Fixed(42.0).resolve(5000.0), 42.0);
    }

    #[test]
    fn partial_config_file_falls_back_to_defaults() {
        let cfg: SimConfig =
            serde_json::from_str(r#"{ "timestep": 0.05, "end_time": { "fixed": 120.0 } }"#).unwrap();
        assert_eq!(cfg.timestep, 0.05);
        assert_eq!(cfg.end_time, EndTime::Fixed(120.0));
        assert_eq!(cfg.descent_timestep, 0.1);
        assert_eq!(cfg.max_steps, 2_000_000);
        cfg.validate().unwrap();
    }

    #[test]
    fn non_positive_timestep_is_rejected() {
        let cfg = SimConfig { timestep: 0.0, ..SimConfig::default() };
        assert!(matches!(cfg.validate(), Err(FlightError::InvalidConfig(_))));
    }
}
