use crate::dynamics::state::{EARTH_RADIUS, G0};

/// Inverse-square gravitational acceleration magnitude at `altitude` (m/s^2).
pub fn gravity(altitude: f64) -> f64 {
    let alt = altitude.max(0.0);
    G0 * (EARTH_RADIUS / (EARTH_RADIUS + alt)).powi(2)
}
