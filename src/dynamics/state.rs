use nalgebra::{Quaternion, SVector, Vector3};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

pub const G0: f64 = 9.80665;
pub const EARTH_RADIUS: f64 = 6_371_000.0;

// ---------------------------------------------------------------------------
// 6DOF flight state: 18 scalars
// ---------------------------------------------------------------------------

pub const STATE_DIM: usize = 18;
pub type StateVector = SVector<f64, STATE_DIM>;

/// Vector layout: pos 0..3, vel 3..6, vel_body 6..9, omega 9..12,
/// quat 12..16 as `[w, x, y, z]`, fuel 16, oxidizer 17.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightState {
    pub pos: Vector3<f64>,      // m, ENU
    pub vel: Vector3<f64>,      // m/s, ENU
    pub vel_body: Vector3<f64>, // m/s, body
    pub omega: Vector3<f64>,    // rad/s, body [roll, pitch, yaw]
    pub quat: Quaternion<f64>,  // body→ENU; only unit up to integration drift
    pub fuel_mass: f64,         // kg
    pub oxidizer_mass: f64,     // kg
}

impl FlightState {
    pub fn from_vector(x: &StateVector) -> Self {
        Self {
            pos: x.fixed_rows::<3>(0).into_owned(),
            vel: x.fixed_rows::<3>(3).into_owned(),
            vel_body: x.fixed_rows::<3>(6).into_owned(),
            omega: x.fixed_rows::<3>(9).into_owned(),
            quat: Quaternion::new(x[12], x[13], x[14], x[15]),
            fuel_mass: x[16],
            oxidizer_mass: x[17],
        }
    }

    pub fn to_vector(&self) -> StateVector {
        let mut x = StateVector::zeros();
        x.fixed_rows_mut::<3>(0).copy_from(&self.pos);
        x.fixed_rows_mut::<3>(3).copy_from(&self.vel);
        x.fixed_rows_mut::<3>(6).copy_from(&self.vel_body);
        x.fixed_rows_mut::<3>(9).copy_from(&self.omega);
        x[12] = self.quat.w;
        x[13] = self.quat.i;
        x[14] = self.quat.j;
        x[15] = self.quat.k;
        x[16] = self.fuel_mass;
        x[17] = self.oxidizer_mass;
        x
    }

    pub fn altitude(&self) -> f64 {
        self.pos.z
    }

    /// Horizontal distance from the launch point.
    pub fn downrange(&self) -> f64 {
        self.pos.xy().norm()
    }
}

/// Time derivative of [`FlightState`].
#[derive(Debug, Clone)]
pub struct Deriv {
    pub dpos: Vector3<f64>,
    pub dvel: Vector3<f64>,
    pub dvel_body: Vector3<f64>,
    pub domega: Vector3<f64>,
    pub dquat: Quaternion<f64>, // raw, not unit
    pub dfuel: f64,
    pub doxidizer: f64,
}

impl Deriv {
    pub fn to_vector(&self) -> StateVector {
        FlightState {
            pos: self.dpos,
            vel: self.dvel,
            vel_body: self.dvel_body,
            omega: self.domega,
            quat: self.dquat,
            fuel_mass: self.dfuel,
            oxidizer_mass: self.doxidizer,
        }
        .to_vector()
    }
}

// ---------------------------------------------------------------------------
// Wind condition of one run
// ---------------------------------------------------------------------------

/// Reference wind speed (m/s) and the direction it blows from (deg,
/// clockwise from North).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindCondition {
    pub speed: f64,
    pub direction: f64,
}

impl WindCondition {
    pub fn new(speed: f64, direction: f64) -> Self {
        Self { speed, direction }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_layout_round_trips() {
        let s = FlightState {
            pos: Vector3::new(1.0, 2.0, 3.0),
            vel: Vector3::new(4.0, 5.0, 6.0),
            vel_body: Vector3::new(7.0, 8.0, 9.0),
            omega: Vector3::new(10.0, 11.0, 12.0),
            quat: Quaternion::new(13.0, 14.0, 15.0, 16.0),
            fuel_mass: 17.0,
            oxidizer_mass: 18.0,
        };
        let x = s.to_vector();
        for i in 0..STATE_DIM {
            assert_eq!(x[i], (i + 1) as f64);
        }
        assert_eq!(FlightState::from_vector(&x), s);
    }

    #[test]
    fn downrange_ignores_altitude() {
        let mut x = StateVector::zeros();
        x[0] = 3.0;
        x[1] = 4.0;
        x[2] = 1000.0;
        assert_eq!(FlightState::from_vector(&x).downrange(), 5.0);
    }
}
