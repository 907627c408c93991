use nalgebra::{Quaternion, Vector3};

use super::mass::MassProperties;
use super::state::{Deriv, FlightState, StateVector, WindCondition, G0, STATE_DIM};
use crate::attitude;
use crate::error::{FlightError, Result};
use crate::physics::{aerodynamics, Environment};
use crate::sim::integrator::OdeSystem;
use crate::vehicle::Rocket;

/// The rail hold is released after this time even if the rocket is still
/// inside the rail length.
pub const RAIL_HOLD_TIME: f64 = 0.5;

/// Everything the equations of motion read besides the state itself.
#[derive(Clone, Copy)]
pub struct FlightContext<'a> {
    pub rocket: &'a Rocket,
    pub env: &'a dyn Environment,
    pub wind: WindCondition,
}

/// Launch-rail status of one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RailContact {
    pub on_rail: bool,
    pub body_velocity: f64,     // m/s along body X
    pub body_acceleration: f64, // m/s^2 along body X
}

/// Every derived quantity of one evaluation, used for the flight log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnostics {
    pub gravity: f64,               // m/s^2
    pub pressure: f64,              // Pa
    pub density: f64,               // kg/m^3
    pub wind: Vector3<f64>,         // m/s, ENU
    pub air_velocity: Vector3<f64>, // m/s, body
    pub airspeed: f64,              // m/s
    pub alpha: f64,                 // deg
    pub beta: f64,                  // deg
    pub mach: f64,
    pub dynamic_pressure: f64,      // Pa
    pub euler: Vector3<f64>,        // deg [azimuth, elevation, roll]
    pub mdot_fuel: f64,             // kg/s
    pub mdot_oxidizer: f64,         // kg/s
    pub mdot_propellant: f64,       // kg/s
    pub thrust: f64,                // N, pressure corrected
    pub isp: f64,                   // s, effective
    pub fuel_mass: f64,             // kg, floored
    pub oxidizer_mass: f64,         // kg, floored
    pub propellant_mass: f64,       // kg
    pub mass: f64,                  // kg
    pub drag: f64,                  // N
    pub normal: f64,                // N per rad
    pub force_body: Vector3<f64>,   // N
    pub accel_body: Vector3<f64>,   // m/s^2
    pub accel_enu: Vector3<f64>,    // m/s^2
    pub cg_oxidizer: f64,           // m from nose
    pub cg_propellant: f64,         // m from nose
    pub cg: f64,                    // m from nose
    pub cp: f64,                    // m from nose
    pub stability_margin: f64,      // % of length
    pub inertia: Vector3<f64>,      // kg·m^2
    pub moment: Vector3<f64>,       // N·m, body
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub deriv: Deriv,
    pub rail: RailContact,
    pub diagnostics: Diagnostics,
}

/// True while the rocket is held by the launch rail.
pub fn on_launch_rail(rocket: &Rocket, t: f64, altitude: f64) -> bool {
    let along_rail = altitude / rocket.launch.elevation.abs().to_radians().sin();
    along_rail < rocket.launch.rail_length && t < RAIL_HOLD_TIME
}

// ---------------------------------------------------------------------------
// 6DOF Equations of motion
// ---------------------------------------------------------------------------

/// Evaluate the flight equations of motion at `(t, state)`.
///
/// Forces and moments:
///   1. Thrust along body X, corrected for ambient pressure
///   2. Drag and normal force from Mach tables
///   3. Gravity (inverse-square, ENU)
///   4. Aerodynamic restoring moment (CP-CG offset)
///   5. Aerodynamic damping and jet damping
pub fn evaluate(t: f64, state: &FlightState, ctx: &FlightContext<'_>) -> Result<Evaluation> {
    let rocket = ctx.rocket;
    let env = ctx.env;
    let launch = &rocket.launch;

    let quat = attitude::normalize(&state.quat)?;
    let dcm = attitude::dcm_enu_to_body(&quat);
    let alt = state.altitude();
    let on_rail = on_launch_rail(rocket, t, alt);

    // --- Air-relative velocity ---
    let wind = env.wind(
        ctx.wind.speed,
        ctx.wind.direction,
        alt,
        launch.wind_reference_altitude,
        launch.wind_power_exponent,
    );
    let air_velocity = dcm * (state.vel - wind);
    let airspeed = air_velocity.norm();
    let (alpha, beta) = if airspeed > 0.0 {
        (
            air_velocity.z.atan2(air_velocity.x),
            (-air_velocity.y / airspeed).asin(),
        )
    } else if on_rail {
        (0.0, 0.0)
    } else {
        return Err(FlightError::ZeroAirspeed { time: t });
    };

    let g = env.gravity(alt);
    let gravity_enu = Vector3::new(0.0, 0.0, -g);
    let sea_level = env.atmosphere(0.0);
    let atm = env.atmosphere(alt);
    let mach = airspeed / atm.sound_speed;
    let dynamic_pressure = 0.5 * atm.density * airspeed * airspeed;

    // --- Propulsion ---
    let sea_level_thrust = rocket.thrust(t);
    let (thrust, isp, mdot_propellant, mut mdot_fuel, mut mdot_oxidizer) =
        if sea_level_thrust <= 0.0 {
            (0.0, 0.0, 0.0, 0.0, 0.0)
        } else {
            let mdot_p = sea_level_thrust / (rocket.engine.isp * G0);
            let mdot_f = rocket.fuel.mass_flow;
            let pressure_thrust =
                (sea_level.pressure - atm.pressure) * rocket.geometry.nozzle_exit_area;
            (
                sea_level_thrust + pressure_thrust,
                rocket.engine.isp + pressure_thrust / (mdot_p * G0),
                mdot_p,
                mdot_f,
                (mdot_p - mdot_f).max(0.0),
            )
        };

    let mut fuel_mass = state.fuel_mass;
    if fuel_mass <= rocket.fuel.residual_mass {
        mdot_fuel = 0.0;
        fuel_mass = rocket.fuel.residual_mass;
    }
    let mut oxidizer_mass = state.oxidizer_mass;
    if oxidizer_mass <= 0.0 {
        mdot_oxidizer = 0.0;
        oxidizer_mass = 0.0;
    }

    let mp = MassProperties::new(rocket, fuel_mass, oxidizer_mass);

    // --- Forces (body) ---
    let area = rocket.geometry.reference_area;
    let normal_slope = rocket.normal_force_slope(mach);
    let aero_force = aerodynamics::body_force(
        dynamic_pressure,
        rocket.drag_coefficient(mach),
        normal_slope,
        area,
        alpha,
        beta,
    );
    let force_body = Vector3::new(thrust, 0.0, 0.0) + aero_force;

    let accel_body = force_body / mp.mass + dcm * gravity_enu;
    let accel_enu = dcm.transpose() * force_body / mp.mass + gravity_enu;

    // --- Moments (body) ---
    let cp = rocket.center_of_pressure(mach);
    let arm = cp - mp.cg;
    let omega = state.omega;
    let length = rocket.geometry.length;
    let aero = &rocket.aero;

    let aero_moment = aerodynamics::restoring_moment(&aero_force, arm);
    let damping_moment = aerodynamics::damping_moment(
        &omega,
        dynamic_pressure,
        airspeed,
        area,
        rocket.geometry.diameter,
        length,
        [aero.roll_damping, aero.pitch_damping, aero.yaw_damping],
    );
    let jet_damping = aerodynamics::jet_damping_moment(
        &omega,
        mdot_propellant,
        mp.cg,
        mp.cg_propellant,
        length,
    );

    let moment = aero_moment + damping_moment + jet_damping;

    // --- Euler's rotation equations ---
    let i = mp.inertia;
    let mut domega = Vector3::new(
        ((i.y - i.z) * omega.y * omega.z + moment.x) / i.x,
        ((i.z - i.x) * omega.x * omega.z + moment.y) / i.y,
        ((i.x - i.y) * omega.x * omega.y + moment.z) / i.z,
    );
    let mut dquat = attitude::quaternion_rate(quat.quaternion(), &omega);

    let rail = if on_rail {
        domega = Vector3::zeros();
        dquat = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        RailContact {
            on_rail: true,
            body_velocity: state.vel_body.x,
            body_acceleration: accel_body.x,
        }
    } else {
        RailContact::default()
    };

    let diagnostics = Diagnostics {
        gravity: g,
        pressure: atm.pressure,
        density: atm.density,
        wind,
        air_velocity,
        airspeed,
        alpha: alpha.to_degrees(),
        beta: beta.to_degrees(),
        mach,
        dynamic_pressure,
        euler: attitude::dcm_to_euler(&dcm),
        mdot_fuel,
        mdot_oxidizer,
        mdot_propellant,
        thrust,
        isp,
        fuel_mass,
        oxidizer_mass,
        propellant_mass: mp.propellant_mass,
        mass: mp.mass,
        drag: -aero_force.x,
        normal: dynamic_pressure * normal_slope * area,
        force_body,
        accel_body,
        accel_enu,
        cg_oxidizer: mp.cg_oxidizer,
        cg_propellant: mp.cg_propellant,
        cg: mp.cg,
        cp,
        stability_margin: arm / length * 100.0,
        inertia: i,
        moment,
    };

    Ok(Evaluation {
        deriv: Deriv {
            dpos: state.vel,
            dvel: accel_enu,
            dvel_body: accel_body,
            domega,
            dquat,
            dfuel: -mdot_fuel,
            doxidizer: -mdot_oxidizer,
        },
        rail,
        diagnostics,
    })
}

impl OdeSystem<STATE_DIM> for FlightContext<'_> {
    fn rhs(&self, t: f64, y: &StateVector) -> Result<StateVector> {
        let state = FlightState::from_vector(y);
        Ok(evaluate(t, &state, self)?.deriv.to_vector())
    }

    fn project(&self, y: &mut StateVector) {
        y[16] = y[16].max(self.rocket.fuel.residual_mass);
        y[17] = y[17].max(0.0);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
