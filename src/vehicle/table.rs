use serde::{Deserialize, Serialize};

use crate::error::{FlightError, Result};

/// Piecewise-linear lookup `y(x)` clamped at both ends.
///
/// Used for the Mach-dependent aerodynamic coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    points: Vec<(f64, f64)>,
}

impl Table {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn constant(value: f64) -> Self {
        Self { points: vec![(0.0, value)] }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn eval(&self, x: f64) -> f64 {
        let pts = &self.points;
        match pts.len() {
            0 => 0.0,
            1 => pts[0].1,
            _ => {
                if x <= pts[0].0 {
                    return pts[0].1;
                }
                let last = pts[pts.len() - 1];
                if x >= last.0 {
                    return last.1;
                }
                interpolate(pts, x)
            }
        }
    }

    pub fn validate(&self, what: &str) -> Result<()> {
        if self.points.is_empty() {
            return Err(FlightError::InvalidConfig(format!("{what}: table is empty")));
        }
        check_sorted(&self.points, what)
    }
}

/// Thrust (N) versus burn time (s).
///
/// Linear between samples; zero before the first sample and from the last
/// sample's time onward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThrustCurve {
    points: Vec<(f64, f64)>,
}

impl ThrustCurve {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn thrust(&self, t: f64) -> f64 {
        let pts = &self.points;
        if pts.len() < 2 || t < pts[0].0 || t >= pts[pts.len() - 1].0 {
            return 0.0;
        }
        interpolate(pts, t)
    }

    /// Time of the last thrust sample.
    pub fn burn_time(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.0)
    }

    /// Trapezoidal integral of the curve (N·s).
    pub fn total_impulse(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| 0.5 * (w[0].1 + w[1].1) * (w[1].0 - w[0].0))
            .sum()
    }

    pub fn validate(&self) -> Result<()> {
        if self.points.len() < 2 {
            return Err(FlightError::InvalidConfig(
                "thrust curve needs at least two samples".into(),
            ));
        }
        check_sorted(&self.points, "thrust curve")
    }
}

fn interpolate(pts: &[(f64, f64)], x: f64) -> f64 {
    // First sample strictly past x; callers guarantee pts[0].0 <= x < last.
    let i = pts.partition_point(|p| p.0 <= x).clamp(1, pts.len() - 1);
    let (x0, y0) = pts[i - 1];
    let (x1, y1) = pts[i];
    if x1 == x0 {
        return y1;
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

fn check_sorted(points: &[(f64, f64)], what: &str) -> Result<()> {
    if points.windows(2).any(|w| w[1].0 <= w[0].0) {
        return Err(FlightError::InvalidConfig(format!(
            "{what}: sample abscissae must be strictly increasing"
        )));
    }
    if points.iter().any(|p| !p.0.is_finite() || !p.1.is_finite()) {
        return Err(FlightError::InvalidConfig(format!("{what}: non-finite sample")));
    }
    Ok(())
}
