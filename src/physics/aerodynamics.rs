use nalgebra::Vector3;

/// Body-frame aerodynamic force: drag along -X, normal force split between Y
/// (sideslip) and Z (angle of attack). Angles in radians.
pub fn body_force(
    dynamic_pressure: f64,
    drag_coefficient: f64,
    normal_slope: f64,
    area: f64,
    alpha: f64,
    beta: f64,
) -> Vector3<f64> {
    let drag = dynamic_pressure * drag_coefficient * area;
    let normal = dynamic_pressure * normal_slope * area;
    Vector3::new(-drag, normal * beta, -normal * alpha)
}

/// Pitch/yaw moment of the side forces acting at the CP, `arm = cp - cg`
/// (positive when the CP lies aft of the CG).
pub fn restoring_moment(force: &Vector3<f64>, arm: f64) -> Vector3<f64> {
    Vector3::new(0.0, force.z * arm, -force.y * arm)
}

/// Rate damping about each body axis. Roll scales with diameter, pitch and
/// yaw with length. Zero at zero airspeed.
pub fn damping_moment(
    omega: &Vector3<f64>,
    dynamic_pressure: f64,
    airspeed: f64,
    area: f64,
    diameter: f64,
    length: f64,
    coefficients: [f64; 3], // [Clp, Cmq, Cnr]
) -> Vector3<f64> {
    if airspeed <= 0.0 {
        return Vector3::zeros();
    }
    let scale = dynamic_pressure * area * 0.5 / airspeed;
    let [clp, cmq, cnr] = coefficients;
    Vector3::new(
        scale * clp * diameter.powi(2) * omega.x,
        scale * cmq * length.powi(2) * omega.y,
        scale * cnr * length.powi(2) * omega.z,
    )
}

/// Jet damping from propellant leaving through the nozzle. Pitch and yaw
/// only; the roll term is not modelled.
pub fn jet_damping_moment(
    omega: &Vector3<f64>,
    mdot_propellant: f64,
    cg: f64,
    cg_propellant: f64,
    length: f64,
) -> Vector3<f64> {
    let lever = (cg - cg_propellant).powi(2) - (length - cg_propellant).powi(2);
    Vector3::new(
        0.0,
        -mdot_propellant * lever * omega.y,
        -mdot_propellant * lever * omega.z,
    )
}
