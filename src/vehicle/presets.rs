use super::rocket::{
    Aerodynamics, Engine, FuelGrain, Geometry, Launch, OxidizerTank, Recovery, Rocket, Structure,
};
use super::table::{Table, ThrustCurve};

/// Single-stage hybrid sounding rocket (~700 m apogee) with a two-stage
/// parachute system.
pub fn hybrid_sounding_rocket() -> Rocket {
    let diameter: f64 = 0.115;
    Rocket {
        name: "Hybrid-115".into(),
        geometry: Geometry {
            length: 2.5,
            diameter,
            reference_area: std::f64::consts::PI * diameter * diameter / 4.0,
            nozzle_exit_area: std::f64::consts::PI * 0.03 * 0.03 / 4.0,
            motor_length: 0.9,
        },
        structure: Structure {
            dry_mass: 8.0,
            cg: 1.3,
            pitch_inertia: 4.2,
            roll_inertia: 0.02,
        },
        fuel: FuelGrain {
            initial_mass: 0.6,
            residual_mass: 0.4,
            cg: 1.9,
            length: 0.3,
            port_diameter: 0.03,
            outer_diameter: 0.07,
            mass_flow: 0.05,
        },
        oxidizer: OxidizerTank {
            initial_mass: 0.65,
            cg_full_from_aft: 1.1,
        },
        aero: Aerodynamics {
            drag: Table::new(vec![(0.0, 0.45), (0.5, 0.47), (0.9, 0.55), (1.1, 0.65), (2.0, 0.5)]),
            normal_slope: Table::new(vec![(0.0, 10.0), (1.0, 11.0), (2.0, 9.0)]),
            center_of_pressure: Table::new(vec![(0.0, 1.75), (1.0, 1.78), (2.0, 1.7)]),
            roll_damping: -0.1,
            pitch_damping: -2.0,
            yaw_damping: -2.0,
        },
        engine: Engine {
            thrust: ThrustCurve::new(vec![
                (0.0, 0.0),
                (0.1, 420.0),
                (1.5, 410.0),
                (3.2, 380.0),
                (3.6, 0.0),
            ]),
            isp: 180.0,
        },
        launch: Launch {
            rail_length: 5.0,
            azimuth: 90.0,
            elevation: 85.0,
            roll: 0.0,
            wind_reference_altitude: 2.0,
            wind_power_exponent: 6.0,
        },
        recovery: Recovery {
            first_drag_area: 0.5,
            second_drag_area: 1.5,
            second_deploy_altitude: 200.0,
        },
    }
}

/// Constant 1000 N for 5 s on a 10 kg airframe with no propellant mass and
/// no aerodynamics, launched vertically. Burnout speed is close to 500 m/s
/// less gravity loss.
pub fn constant_thrust_test_article() -> Rocket {
    Rocket {
        name: "Ballistic-Test".into(),
        geometry: Geometry {
            length: 2.0,
            diameter: 0.1,
            reference_area: 0.007_854,
            nozzle_exit_area: 0.0,
            motor_length: 0.5,
        },
        structure: Structure {
            dry_mass: 10.0,
            cg: 1.0,
            pitch_inertia: 3.0,
            roll_inertia: 0.05,
        },
        fuel: FuelGrain {
            initial_mass: 0.0,
            residual_mass: 0.0,
            cg: 1.5,
            length: 0.3,
            port_diameter: 0.02,
            outer_diameter: 0.08,
            mass_flow: 0.0,
        },
        oxidizer: OxidizerTank {
            initial_mass: 0.0,
            cg_full_from_aft: 0.8,
        },
        aero: Aerodynamics {
            drag: Table::constant(0.0),
            normal_slope: Table::constant(0.0),
            center_of_pressure: Table::constant(1.4),
            roll_damping: 0.0,
            pitch_damping: 0.0,
            yaw_damping: 0.0,
        },
        engine: Engine {
            thrust: ThrustCurve::new(vec![(0.0, 1000.0), (5.0, 1000.0)]),
            isp: 200.0,
        },
        launch: Launch {
            rail_length: 3.0,
            azimuth: 0.0,
            elevation: 90.0,
            roll: 0.0,
            wind_reference_altitude: 2.0,
            wind_power_exponent: 6.0,
        },
        recovery: Recovery {
            first_drag_area: 1.0,
            second_drag_area: 2.0,
            second_deploy_altitude: 300.0,
        },
    }
}
