use std::path::Path;

use serde::{Deserialize, Serialize};

use super::table::{Table, ThrustCurve};
use crate::dynamics::mass::MassProperties;
use crate::error::{FlightError, Result};

// ---------------------------------------------------------------------------
// Rocket definition (read-only for the duration of a run)
// ---------------------------------------------------------------------------

/// Lengths are measured from the nose tip unless the field says otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    pub length: f64,           // m, nose to nozzle exit
    pub diameter: f64,         // m
    pub reference_area: f64,   // m^2
    pub nozzle_exit_area: f64, // m^2
    pub motor_length: f64,     // m, from the aft end; oxidizer CG when the tank is dry
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    pub dry_mass: f64,      // kg, everything except fuel and oxidizer
    pub cg: f64,            // m
    pub pitch_inertia: f64, // kg·m^2 about the dry CG
    pub roll_inertia: f64,  // kg·m^2
}

/// Solid fuel grain of a hybrid motor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelGrain {
    pub initial_mass: f64,   // kg
    pub residual_mass: f64,  // kg left after burnout
    pub cg: f64,             // m
    pub length: f64,         // m
    pub port_diameter: f64,  // m
    pub outer_diameter: f64, // m
    pub mass_flow: f64,      // kg/s while burning
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OxidizerTank {
    pub initial_mass: f64,     // kg
    pub cg_full_from_aft: f64, // m, oxidizer CG with a full tank, from the aft end
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aerodynamics {
    pub drag: Table,               // Cd(Mach)
    pub normal_slope: Table,       // CNa(Mach), 1/rad
    pub center_of_pressure: Table, // Lcp(Mach), m
    pub roll_damping: f64,         // Clp
    pub pitch_damping: f64,        // Cmq
    pub yaw_damping: f64,          // Cnr
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    pub thrust: ThrustCurve, // sea-level thrust, N
    pub isp: f64,            // s
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Launch {
    pub rail_length: f64,             // m
    pub azimuth: f64,                 // deg, counter-clockwise from East
    pub elevation: f64,               // deg
    pub roll: f64,                    // deg
    pub wind_reference_altitude: f64, // m
    pub wind_power_exponent: f64,
}

/// Two-stage parachute recovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recovery {
    pub first_drag_area: f64,        // CdS of the stage-1 canopy, m^2
    pub second_drag_area: f64,       // CdS added at the second deployment, m^2
    pub second_deploy_altitude: f64, // m
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rocket {
    pub name: String,
    pub geometry: Geometry,
    pub structure: Structure,
    pub fuel: FuelGrain,
    pub oxidizer: OxidizerTank,
    pub aero: Aerodynamics,
    pub engine: Engine,
    pub launch: Launch,
    pub recovery: Recovery,
}

impl Rocket {
    /// Load and validate a rocket definition from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let rocket: Rocket = serde_json::from_str(&text)?;
        rocket.validate()?;
        Ok(rocket)
    }

    pub fn thrust(&self, t: f64) -> f64 {
        self.engine.thrust.thrust(t)
    }

    pub fn thrust_series(&self, times: &[f64]) -> Vec<f64> {
        times.iter().map(|&t| self.thrust(t)).collect()
    }

    pub fn total_impulse(&self) -> f64 {
        self.engine.thrust.total_impulse()
    }

    pub fn burn_time(&self) -> f64 {
        self.engine.thrust.burn_time()
    }

    pub fn drag_coefficient(&self, mach: f64) -> f64 {
        self.aero.drag.eval(mach)
    }

    pub fn normal_force_slope(&self, mach: f64) -> f64 {
        self.aero.normal_slope.eval(mach)
    }

    pub fn center_of_pressure(&self, mach: f64) -> f64 {
        self.aero.center_of_pressure.eval(mach)
    }

    /// Wet mass at ignition.
    pub fn initial_mass(&self) -> f64 {
        self.structure.dry_mass + self.fuel.initial_mass + self.oxidizer.initial_mass
    }

    /// CG with full fuel and oxidizer, from the nose.
    pub fn initial_center_of_gravity(&self) -> f64 {
        MassProperties::new(self, self.fuel.initial_mass, self.oxidizer.initial_mass).cg
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("geometry.length", self.geometry.length),
            ("geometry.diameter", self.geometry.diameter),
            ("geometry.reference_area", self.geometry.reference_area),
            ("structure.dry_mass", self.structure.dry_mass),
            ("structure.pitch_inertia", self.structure.pitch_inertia),
            ("structure.roll_inertia", self.structure.roll_inertia),
            ("engine.isp", self.engine.isp),
            ("launch.wind_reference_altitude", self.launch.wind_reference_altitude),
            ("launch.wind_power_exponent", self.launch.wind_power_exponent),
        ];
        for (name, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                return Err(FlightError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        let non_negative = [
            ("geometry.nozzle_exit_area", self.geometry.nozzle_exit_area),
            ("fuel.initial_mass", self.fuel.initial_mass),
            ("fuel.residual_mass", self.fuel.residual_mass),
            ("fuel.mass_flow", self.fuel.mass_flow),
            ("oxidizer.initial_mass", self.oxidizer.initial_mass),
            ("launch.rail_length", self.launch.rail_length),
            ("recovery.first_drag_area", self.recovery.first_drag_area),
            ("recovery.second_drag_area", self.recovery.second_drag_area),
            ("recovery.second_deploy_altitude", self.recovery.second_deploy_altitude),
        ];
        for (name, value) in non_negative {
            if value < 0.0 || !value.is_finite() {
                return Err(FlightError::InvalidConfig(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }

        let elevation = self.launch.elevation;
        if !(elevation > 0.0 && elevation <= 90.0) {
            return Err(FlightError::InvalidConfig(format!(
                "launch.elevation must be in (0, 90] deg, got {elevation}"
            )));
        }
        if self.fuel.residual_mass > self.fuel.initial_mass {
            return Err(FlightError::InvalidConfig(format!(
                "fuel.residual_mass ({}) exceeds fuel.initial_mass ({})",
                self.fuel.residual_mass, self.fuel.initial_mass
            )));
        }
        if self.recovery.first_drag_area + self.recovery.second_drag_area <= 0.0 {
            return Err(FlightError::InvalidConfig(
                "recovery needs a non-zero total drag area".into(),
            ));
        }

        self.engine.thrust.validate()?;
        self.aero.drag.validate("aero.drag")?;
        self.aero.normal_slope.validate("aero.normal_slope")?;
        self.aero.center_of_pressure.validate("aero.center_of_pressure")?;
        Ok(())
    }
}
