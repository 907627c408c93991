use nalgebra::SVector;

use super::state::WindCondition;
use crate::error::Result;
use crate::physics::Environment;
use crate::sim::integrator::OdeSystem;
use crate::vehicle::Rocket;

// ---------------------------------------------------------------------------
// Parachute descent: [x, y, z, vz]
// ---------------------------------------------------------------------------

pub const DESCENT_DIM: usize = 4;
pub type DescentVector = SVector<f64, DESCENT_DIM>;

/// Horizontal motion follows the wind; only the vertical rate has inertia.
#[derive(Clone, Copy)]
pub struct DescentContext<'a> {
    pub rocket: &'a Rocket,
    pub env: &'a dyn Environment,
    pub wind: WindCondition,
    pub mass: f64, // kg, mass at apogee
}

impl DescentContext<'_> {
    /// Effective CdS: both canopies at or below the second deployment
    /// altitude, the first one alone above it.
    pub fn drag_area(&self, altitude: f64) -> f64 {
        let r = &self.rocket.recovery;
        if altitude <= r.second_deploy_altitude {
            r.first_drag_area + r.second_drag_area
        } else {
            r.first_drag_area
        }
    }

    /// Descent rate at which drag with both canopies balances weight at
    /// sea level.
    pub fn terminal_velocity(&self) -> f64 {
        let r = &self.rocket.recovery;
        let rho0 = self.env.atmosphere(0.0).density;
        (2.0 * self.mass * self.env.gravity(0.0) / (rho0 * (r.first_drag_area + r.second_drag_area)))
            .sqrt()
    }

    pub fn derivative(&self, y: &DescentVector) -> DescentVector {
        let alt = y[2];
        let vz = y[3];
        let launch = &self.rocket.launch;
        let wind = self.env.wind(
            self.wind.speed,
            self.wind.direction,
            alt,
            launch.wind_reference_altitude,
            launch.wind_power_exponent,
        );
        let rho = self.env.atmosphere(alt).density;
        let accel = 0.5 * rho * self.drag_area(alt) * vz * vz / self.mass - self.env.gravity(alt);
        DescentVector::new(wind.x, wind.y, vz, accel)
    }
}

impl OdeSystem<DESCENT_DIM> for DescentContext<'_> {
    fn rhs(&self, _t: f64, y: &DescentVector) -> Result<DescentVector> {
        Ok(self.derivative(y))
    }
}
