//! Quaternion and direction-cosine helpers.
//!
//! Conventions: the attitude quaternion rotates body vectors into ENU. Body X
//! is the nose, so a rocket at azimuth `az` (counter-clockwise from East) and
//! elevation `el` points along `(cos el cos az, cos el sin az, sin el)`.

use nalgebra::{Matrix3, Matrix4, Quaternion, Rotation3, UnitQuaternion, Vector3, Vector4};

use crate::error::{FlightError, Result};

/// Rescale `q` to unit norm.
pub fn normalize(q: &Quaternion<f64>) -> Result<UnitQuaternion<f64>> {
    let norm = q.norm();
    if norm == 0.0 || !norm.is_finite() {
        return Err(FlightError::DegenerateOrientation);
    }
    Ok(UnitQuaternion::new_unchecked(*q / norm))
}

/// Attitude quaternion from launch azimuth, elevation and roll (degrees),
/// applied yaw-pitch-roll (3-2-1).
pub fn euler_to_quat(azimuth: f64, elevation: f64, roll: f64) -> UnitQuaternion<f64> {
    // Positive elevation raises the nose, i.e. a negative rotation about body Y.
    UnitQuaternion::from_euler_angles(
        roll.to_radians(),
        -elevation.to_radians(),
        azimuth.to_radians(),
    )
}

/// Direction-cosine matrix taking ENU vectors into the body frame.
pub fn dcm_enu_to_body(q: &UnitQuaternion<f64>) -> Matrix3<f64> {
    let (w, x, y, z) = (q.w, q.i, q.j, q.k);
    // Transpose of the body-to-ENU rotation.
    Matrix3::new(
        1.0 - 2.0 * (y * y + z * z),
        2.0 * (x * y + w * z),
        2.0 * (x * z - w * y),
        2.0 * (x * y - w * z),
        1.0 - 2.0 * (x * x + z * z),
        2.0 * (y * z + w * x),
        2.0 * (x * z + w * y),
        2.0 * (y * z - w * x),
        1.0 - 2.0 * (x * x + y * y),
    )
}

/// Azimuth, elevation and roll (degrees) from an ENU-to-body DCM.
///
/// Only used for logging; the integrated state never goes through Euler
/// angles.
pub fn dcm_to_euler(dcm_enu_to_body: &Matrix3<f64>) -> Vector3<f64> {
    let body_to_enu = Rotation3::from_matrix_unchecked(dcm_enu_to_body.transpose());
    let (roll, pitch, yaw) = body_to_enu.euler_angles();
    Vector3::new(yaw.to_degrees(), -pitch.to_degrees(), roll.to_degrees())
}

/// Quaternion time derivative for body angular rate `omega`.
///
/// `0.5 * Omega(omega) * q` with `q` ordered `[w, x, y, z]`.
pub fn quaternion_rate(q: &Quaternion<f64>, omega: &Vector3<f64>) -> Quaternion<f64> {
    let (p, r_q, r) = (omega.x, omega.y, omega.z);
    #[rustfmt::skip]
    let kinematic = Matrix4::new(
        0.0, -p,   -r_q, -r,
        p,    0.0,  r,   -r_q,
        r_q, -r,    0.0,  p,
        r,    r_q, -p,    0.0,
    );
    let qv = Vector4::new(q.w, q.i, q.j, q.k);
    let dq = kinematic * qv * 0.5;
    Quaternion::new(dq[0], dq[1], dq[2], dq[3])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normalize_is_idempotent() {
        let q = Quaternion::new(0.3, -1.2, 0.7, 2.0);
        let once = normalize(&q).unwrap();
        let twice = normalize(once.quaternion()).unwrap();
        assert_relative_eq!(once.quaternion().norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(once.quaternion().coords, twice.quaternion().coords, epsilon = 1e-12);
    }

    #[test]
    fn zero_quaternion_is_degenerate() {
        let q = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        assert!(matches!(normalize(&q), Err(FlightError::DegenerateOrientation)));
    }

    #[test]
    fn nose_points_along_launch_direction() {
        let (az, el) = (30.0_f64, 70.0_f64);
        let q = euler_to_quat(az, el, 12.0);
        let nose = q * Vector3::x();
        let (a, e) = (az.to_radians(), el.to_radians());
        let expected = Vector3::new(e.cos() * a.cos(), e.cos() * a.sin(), e.sin());
        assert_relative_eq!(nose, expected, epsilon = 1e-12);
    }

    #[test]
    fn dcm_matches_inverse_rotation() {
        let q = euler_to_quat(120.0, 45.0, -20.0);
        let v = Vector3::new(1.0, -2.0, 0.5);
        let via_dcm = dcm_enu_to_body(&q) * v;
        let via_quat = q.inverse() * v;
        assert_relative_eq!(via_dcm, via_quat, epsilon = 1e-12);
    }

    #[test]
    fn euler_round_trip_away_from_vertical() {
        let q = euler_to_quat(60.0, 35.0, 10.0);
        let euler = dcm_to_euler(&dcm_enu_to_body(&q));
        assert_relative_eq!(euler, Vector3::new(60.0, 35.0, 10.0), epsilon = 1e-9);
    }

    #[test]
    fn kinematic_matrix_matches_quaternion_product() {
        let q = euler_to_quat(10.0, 80.0, 5.0);
        let omega = Vector3::new(0.4, -1.1, 2.3);
        let expected = q.quaternion() * Quaternion::from_imag(omega) * 0.5;
        let dq = quaternion_rate(q.quaternion(), &omega);
        assert_relative_eq!(dq.coords, expected.coords, epsilon = 1e-12);
    }

    #[test]
    fn no_rotation_means_no_quaternion_change() {
        let q = euler_to_quat(0.0, 90.0, 0.0);
        let dq = quaternion_rate(q.quaternion(), &Vector3::zeros());
        assert_relative_eq!(dq.norm(), 0.0);
    }
}
