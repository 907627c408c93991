use nalgebra::Vector3;

use crate::vehicle::Rocket;

/// Mass, centers of gravity and principal inertia for given propellant
/// masses. Positions are measured from the nose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassProperties {
    pub mass: f64,
    pub propellant_mass: f64,
    pub cg_oxidizer: f64,
    pub cg_propellant: f64,
    pub cg: f64,
    /// [roll, pitch, yaw] about the current CG, kg·m^2.
    pub inertia: Vector3<f64>,
}

impl MassProperties {
    /// `fuel_mass` and `oxidizer_mass` are expected already floored at their
    /// empty values.
    pub fn new(rocket: &Rocket, fuel_mass: f64, oxidizer_mass: f64) -> Self {
        let s = &rocket.structure;
        let f = &rocket.fuel;
        let length = rocket.geometry.length;
        let motor = rocket.geometry.motor_length;

        // Oxidizer CG slides from its full-tank point toward the motor end as
        // the tank drains.
        let fill = if rocket.oxidizer.initial_mass > 0.0 {
            oxidizer_mass / rocket.oxidizer.initial_mass
        } else {
            0.0
        };
        let cg_ox_from_aft = motor + fill * (rocket.oxidizer.cg_full_from_aft - motor);
        let cg_oxidizer = length - cg_ox_from_aft;

        let propellant_mass = fuel_mass + oxidizer_mass;
        let cg_propellant = if propellant_mass > 0.0 {
            (fuel_mass * f.cg + oxidizer_mass * cg_oxidizer) / propellant_mass
        } else {
            f.cg
        };
        let mass = s.dry_mass + propellant_mass;
        let cg = (propellant_mass * cg_propellant + s.dry_mass * s.cg) / mass;

        // Annular grain. The axial term is linear in the grain length.
        let radial = (f.port_diameter.powi(2) + f.outer_diameter.powi(2)) / 16.0;
        let fuel_pitch = fuel_mass * (radial + f.length / 12.0)
            + fuel_mass * (cg - f.cg).powi(2);
        let fuel_roll = fuel_mass * 2.0 * radial;
        let dry_pitch = s.pitch_inertia + s.dry_mass * (cg - s.cg).powi(2);

        let pitch = dry_pitch + fuel_pitch;
        let roll = s.roll_inertia + fuel_roll;

        Self {
            mass,
            propellant_mass,
            cg_oxidizer,
            cg_propellant,
            cg,
            inertia: Vector3::new(roll, pitch, pitch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::presets;
    use approx::assert_relative_eq;

    #[test]
    fn mass_is_dry_plus_propellant() {
        let r = presets::hybrid_sounding_rocket();
        let mp = MassProperties::new(&r, 0.5, 0.3);
        assert_relative_eq!(mp.mass, r.structure.dry_mass + 0.8, epsilon = 1e-12);
        assert_relative_eq!(mp.propellant_mass, 0.8, epsilon = 1e-12);
    }

    #[test]
    fn oxidizer_cg_moves_aft_as_tank_drains() {
        let r = presets::hybrid_sounding_rocket();
        let full = MassProperties::new(&r, 0.6, r.oxidizer.initial_mass);
        let empty = MassProperties::new(&r, 0.6, 0.0);
        let length = r.geometry.length;
        assert_relative_eq!(full.cg_oxidizer, length - r.oxidizer.cg_full_from_aft, epsilon = 1e-12);
        assert_relative_eq!(empty.cg_oxidizer, length - r.geometry.motor_length, epsilon = 1e-12);
        assert!(empty.cg_oxidizer > full.cg_oxidizer);
    }

    #[test]
    fn dry_airframe_reduces_to_structure() {
        let r = presets::constant_thrust_test_article();
        let mp = MassProperties::new(&r, 0.0, 0.0);
        assert_relative_eq!(mp.mass, 10.0);
        assert_relative_eq!(mp.cg, r.structure.cg);
        assert_relative_eq!(mp.inertia.x, r.structure.roll_inertia);
        assert_relative_eq!(mp.inertia.y, r.structure.pitch_inertia);
        assert_eq!(mp.inertia.y, mp.inertia.z);
    }

    #[test]
    fn full_tank_inertia_of_hybrid_preset() {
        let r = presets::hybrid_sounding_rocket();
        let mp = MassProperties::new(&r, r.fuel.initial_mass, r.oxidizer.initial_mass);
        assert_relative_eq!(mp.inertia.y, 4.416291276479182, max_relative = 1e-9);
        assert_eq!(mp.inertia.y, mp.inertia.z);

        let f = &r.fuel;
        let grain = f.initial_mass
            * ((f.port_diameter.powi(2) + f.outer_diameter.powi(2)) / 4.0 + f.length / 3.0)
            / 4.0;
        let offsets = f.initial_mass * (mp.cg - f.cg).powi(2)
            + r.structure.dry_mass * (mp.cg - r.structure.cg).powi(2);
        assert_relative_eq!(
            mp.inertia.y,
            r.structure.pitch_inertia + grain + offsets,
            max_relative = 1e-12
        );
    }

    #[test]
    fn pitch_inertia_includes_cg_offsets() {
        let r = presets::hybrid_sounding_rocket();
        let mp = MassProperties::new(&r, 0.6, 0.65);
        assert!(mp.inertia.y > r.structure.pitch_inertia);
        assert!(mp.inertia.x > r.structure.roll_inertia);
    }
}
