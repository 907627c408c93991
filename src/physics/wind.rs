use nalgebra::Vector3;

/// Power-law wind profile at `altitude`.
///
/// `speed` is the wind speed at `reference_altitude`; the magnitude scales as
/// `(altitude / reference_altitude)^(1 / power_exponent)` and is zero at or
/// below ground. `direction` is where the wind blows FROM, in degrees
/// clockwise from North, so the returned ENU vector points the other way.
pub fn power_law_wind(
    speed: f64,
    direction: f64,
    altitude: f64,
    reference_altitude: f64,
    power_exponent: f64,
) -> Vector3<f64> {
    if altitude <= 0.0 {
        return Vector3::zeros();
    }
    let magnitude = speed * (altitude / reference_altitude).powf(1.0 / power_exponent);
    let dir = direction.to_radians();
    Vector3::new(-magnitude * dir.sin(), -magnitude * dir.cos(), 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn reference_altitude_gives_reference_speed() {
        let w = power_law_wind(5.0, 30.0, 2.0, 2.0, 6.0);
        assert_relative_eq!(w.norm(), 5.0, epsilon = 1e-12);
        assert_eq!(w.z, 0.0);
    }

    #[test]
    fn north_wind_blows_south() {
        let w = power_law_wind(4.0, 0.0, 10.0, 10.0, 6.0);
        assert_relative_eq!(w.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(w.y, -4.0, epsilon = 1e-12);
    }

    #[test]
    fn east_wind_blows_west() {
        let w = power_law_wind(4.0, 90.0, 10.0, 10.0, 6.0);
        assert_relative_eq!(w.x, -4.0, epsilon = 1e-12);
        assert_relative_eq!(w.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn wind_grows_with_altitude_and_vanishes_at_ground() {
        let low = power_law_wind(3.0, 45.0, 10.0, 2.0, 6.0).norm();
        let high = power_law_wind(3.0, 45.0, 500.0, 2.0, 6.0).norm();
        assert!(high > low);
        assert_eq!(power_law_wind(3.0, 45.0, 0.0, 2.0, 6.0), Vector3::zeros());
        assert_eq!(power_law_wind(3.0, 45.0, -5.0, 2.0, 6.0), Vector3::zeros());
    }
}
