use crate::dynamics::state::G0;

// ---------------------------------------------------------------------------
// ISA 1976 standard atmosphere, sea level to 86 km
// ---------------------------------------------------------------------------

const R_AIR: f64 = 287.052_87; // J/(kg·K)
const GAMMA: f64 = 1.4;

/// Ceiling of the layered model; above it pressure decays exponentially.
const TOP_ALTITUDE: f64 = 86_000.0;
const TOP_TEMPERATURE: f64 = 186.87;
const TOP_PRESSURE: f64 = 0.3734;

/// Atmospheric state at one altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atmo {
    pub temperature: f64, // K
    pub pressure: f64,    // Pa
    pub density: f64,     // kg/m^3
    pub sound_speed: f64, // m/s
}

struct Layer {
    base: f64,        // m
    temperature: f64, // K at base
    lapse: f64,       // K/m, zero for isothermal layers
    pressure: f64,    // Pa at base
}

const LAYERS: [Layer; 7] = [
    Layer { base: 0.0, temperature: 288.15, lapse: -0.0065, pressure: 101_325.0 },
    Layer { base: 11_000.0, temperature: 216.65, lapse: 0.0, pressure: 22_632.1 },
    Layer { base: 20_000.0, temperature: 216.65, lapse: 0.001, pressure: 5_474.89 },
    Layer { base: 32_000.0, temperature: 228.65, lapse: 0.0028, pressure: 868.019 },
    Layer { base: 47_000.0, temperature: 270.65, lapse: 0.0, pressure: 110.906 },
    Layer { base: 51_000.0, temperature: 270.65, lapse: -0.0028, pressure: 66.9389 },
    Layer { base: 71_000.0, temperature: 214.65, lapse: -0.002, pressure: 3.956_42 },
];

impl Layer {
    fn state_at(&self, h: f64) -> (f64, f64) {
        let dh = h - self.base;
        if self.lapse == 0.0 {
            let p = self.pressure * (-G0 * dh / (R_AIR * self.temperature)).exp();
            (self.temperature, p)
        } else {
            let t = self.temperature + self.lapse * dh;
            let p = self.pressure * (t / self.temperature).powf(-G0 / (self.lapse * R_AIR));
            (t, p)
        }
    }
}

/// Standard atmosphere at geometric altitude `altitude_m`.
///
/// Negative altitudes are treated as sea level.
pub fn isa(altitude_m: f64) -> Atmo {
    let h = altitude_m.max(0.0);

    let (temperature, pressure) = if h >= TOP_ALTITUDE {
        let p = TOP_PRESSURE * (-0.000_15 * (h - TOP_ALTITUDE)).exp();
        (TOP_TEMPERATURE, p.max(0.0))
    } else {
        let layer = LAYERS
            .iter()
            .rev()
            .find(|l| h >= l.base)
            .unwrap_or(&LAYERS[0]);
        layer.state_at(h)
    };

    Atmo {
        temperature,
        pressure,
        density: pressure / (R_AIR * temperature),
        sound_speed: (GAMMA * R_AIR * temperature).sqrt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sea_level_standard_values() {
        let a = isa(0.0);
        assert!((a.temperature - 288.15).abs() < 0.01);
        assert!((a.pressure - 101_325.0).abs() < 1.0);
        assert!((a.density - 1.225).abs() < 0.001);
        assert!((a.sound_speed - 340.29).abs() < 0.1);
    }

    #[test]
    fn layers_are_continuous() {
        for layer in LAYERS.iter().skip(1) {
            let below = isa(layer.base - 1e-6);
            let above = isa(layer.base + 1e-6);
            assert!(
                (below.pressure - above.pressure).abs() / above.pressure < 1e-3,
                "pressure jump at {} m",
                layer.base
            );
            assert!((below.temperature - above.temperature).abs() < 0.01);
        }
    }

    #[test]
    fn density_decreases_with_altitude() {
        let rho: Vec<f64> = [0.0, 5_000.0, 20_000.0, 60_000.0, 100_000.0]
            .iter()
            .map(|&h| isa(h).density)
            .collect();
        assert!(rho.windows(2).all(|w| w[0] > w[1]));
        assert!(rho[4] > 0.0 && rho[4] < 1e-5);
    }

    #[test]
    fn below_ground_is_sea_level() {
        assert_eq!(isa(-300.0), isa(0.0));
    }
}
