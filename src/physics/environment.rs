use nalgebra::Vector3;

use super::atmosphere::{self, Atmo};
use super::gravity;
use super::wind;

/// Atmosphere, gravity and wind provider used by the flight and descent
/// equations. Implementations must be deterministic in altitude.
pub trait Environment: Send + Sync {
    /// Gravitational acceleration magnitude (m/s^2).
    fn gravity(&self, altitude: f64) -> f64;

    fn atmosphere(&self, altitude: f64) -> Atmo;

    /// Wind vector in ENU (m/s).
    fn wind(
        &self,
        speed: f64,
        direction: f64,
        altitude: f64,
        reference_altitude: f64,
        power_exponent: f64,
    ) -> Vector3<f64>;

    fn gravity_series(&self, altitudes: &[f64]) -> Vec<f64> {
        altitudes.iter().map(|&h| self.gravity(h)).collect()
    }

    fn atmosphere_series(&self, altitudes: &[f64]) -> Vec<Atmo> {
        altitudes.iter().map(|&h| self.atmosphere(h)).collect()
    }

    fn wind_series(
        &self,
        speed: f64,
        direction: f64,
        altitudes: &[f64],
        reference_altitude: f64,
        power_exponent: f64,
    ) -> Vec<Vector3<f64>> {
        altitudes
            .iter()
            .map(|&h| self.wind(speed, direction, h, reference_altitude, power_exponent))
            .collect()
    }
}

/// ISA 1976 atmosphere, inverse-square gravity, power-law wind.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEnvironment;

impl Environment for StandardEnvironment {
    fn gravity(&self, altitude: f64) -> f64 {
        gravity::gravity(altitude)
    }

    fn atmosphere(&self, altitude: f64) -> Atmo {
        atmosphere::isa(altitude)
    }

    fn wind(
        &self,
        speed: f64,
        direction: f64,
        altitude: f64,
        reference_altitude: f64,
        power_exponent: f64,
    ) -> Vector3<f64> {
        wind::power_law_wind(speed, direction, altitude, reference_altitude, power_exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_match_scalar_queries() {
        let env = StandardEnvironment;
        let alts = [0.0, 150.0, 3_000.0];
        let g = env.gravity_series(&alts);
        let atm = env.atmosphere_series(&alts);
        let w = env.wind_series(4.0, 270.0, &alts, 2.0, 6.0);
        for (i, &h) in alts.iter().enumerate() {
            assert_eq!(g[i], env.gravity(h));
            assert_eq!(atm[i], env.atmosphere(h));
            assert_eq!(w[i], env.wind(4.0, 270.0, h, 2.0, 6.0));
        }
    }
}
