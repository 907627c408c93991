use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::dynamics::state::FlightState;
use crate::dynamics::{Diagnostics, RailContact};

// ---------------------------------------------------------------------------
// Flight events, extracted from the trimmed and derived series
// ---------------------------------------------------------------------------

/// Body-axis speed and acceleration at the last sample still held by the
/// rail. Zero when no sample is on the rail. Read from the output grid, so
/// the value is quantised to `timestep` rather than taken at the exact
/// rail exit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RailClear {
    pub index: Option<usize>,
    pub velocity: f64,     // m/s
    pub acceleration: f64, // m/s^2
}

/// Sample at which a derived quantity peaks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakEvent {
    pub index: usize,
    pub time: f64,
    pub altitude: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Apogee {
    pub index: usize,
    pub time: f64,
    pub altitude: f64,
    pub position: Vector3<f64>, // m, ENU
    pub velocity: Vector3<f64>, // m/s, ENU
    pub airspeed: f64,
    pub mass: f64,
    pub downrange: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Landing {
    pub index: usize,
    pub time: f64,
    pub point: [f64; 2], // m, ENU x/y
    pub downrange: f64,
}

impl Landing {
    fn at(index: usize, time: f64, position: &Vector3<f64>) -> Self {
        Self {
            index,
            time,
            point: [position.x, position.y],
            downrange: position.xy().norm(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlightEvents {
    pub rail_clear: RailClear,
    pub max_airspeed: PeakEvent,
    pub max_mach: PeakEvent,
    pub max_dynamic_pressure: PeakEvent,
    pub apogee: Apogee,
    pub hard_landing: Landing,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeploymentEvent {
    pub index: usize,
    pub time: f64,
    pub altitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DescentEvents {
    pub second_deployment: DeploymentEvent,
    pub soft_landing: Landing,
}

/// Ballistic (no parachute) and parachute landing points. They come from two
/// different scenarios, not two samples of one trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandingPoints {
    pub hard: [f64; 2],
    pub soft: [f64; 2],
}

// ---------------------------------------------------------------------------
// Index helpers
// ---------------------------------------------------------------------------

/// First sample at or below `threshold`.
pub fn first_at_or_below<I>(altitudes: I, threshold: f64) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    altitudes.into_iter().position(|h| h <= threshold)
}

/// First sample at or below ground.
pub fn ground_impact_index<I>(altitudes: I) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    first_at_or_below(altitudes, 0.0)
}

/// Index of the first maximum; 0 for an empty series.
pub fn argmax<I>(values: I) -> usize
where
    I: IntoIterator<Item = f64>,
{
    let mut best = (0, f64::NEG_INFINITY);
    for (i, v) in values.into_iter().enumerate() {
        if v > best.1 {
            best = (i, v);
        }
    }
    best.0
}

/// Latch the rail-clear metrics on the last on-rail sample.
pub fn latch_rail_clear(rail: &[RailContact]) -> RailClear {
    rail.iter()
        .enumerate()
        .rev()
        .find(|(_, r)| r.on_rail)
        .map(|(i, r)| RailClear {
            index: Some(i),
            velocity: r.body_velocity,
            acceleration: r.body_acceleration,
        })
        .unwrap_or_default()
}

impl FlightEvents {
    /// All slices must be non-empty and of equal length.
    pub fn extract(
        time: &[f64],
        states: &[FlightState],
        diagnostics: &[Diagnostics],
        rail: &[RailContact],
    ) -> Self {
        let apogee_idx = argmax(states.iter().map(|s| s.altitude()));
        // Maxima strictly before apogee; sample 0 alone when apogee is first.
        let ascent = &diagnostics[..apogee_idx.max(1)];
        let peak = |value: fn(&Diagnostics) -> f64| {
            let index = argmax(ascent.iter().map(value));
            PeakEvent {
                index,
                time: time[index],
                altitude: states[index].altitude(),
                value: value(&diagnostics[index]),
            }
        };

        let top = &states[apogee_idx];
        let last = states.len() - 1;

        Self {
            rail_clear: latch_rail_clear(rail),
            max_airspeed: peak(|d| d.airspeed),
            max_mach: peak(|d| d.mach),
            max_dynamic_pressure: peak(|d| d.dynamic_pressure),
            apogee: Apogee {
                index: apogee_idx,
                time: time[apogee_idx],
                altitude: top.altitude(),
                position: top.pos,
                velocity: top.vel,
                airspeed: diagnostics[apogee_idx].airspeed,
                mass: diagnostics[apogee_idx].mass,
                downrange: top.downrange(),
            },
            hard_landing: Landing::at(last, time[last], &states[last].pos),
        }
    }
}

impl DescentEvents {
    /// `positions` must be non-empty and end at or below ground.
    pub fn extract(time: &[f64], positions: &[Vector3<f64>], second_deploy_altitude: f64) -> Self {
        let last = positions.len() - 1;
        let deploy = first_at_or_below(positions.iter().map(|p| p.z), second_deploy_altitude)
            .unwrap_or(last);
        Self {
            second_deployment: DeploymentEvent {
                index: deploy,
                time: time[deploy],
                altitude: positions[deploy].z,
            },
            soft_landing: Landing::at(last, time[last], &positions[last]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(on_rail: bool, v: f64) -> RailContact {
        RailContact {
            on_rail,
            body_velocity: v,
            body_acceleration: 10.0 * v,
        }
    }

    #[test]
    fn ground_impact_is_first_non_positive_sample() {
        let alts = [1.0, 5.0, 3.0, 0.0, -1.0];
        assert_eq!(ground_impact_index(alts), Some(3));
        assert_eq!(ground_impact_index([2.0, -0.5, 1.0]), Some(1));
        assert_eq!(ground_impact_index([2.0, 1.0]), None);
    }

    #[test]
    fn argmax_picks_first_maximum() {
        assert_eq!(argmax([1.0, 3.0, 3.0, 2.0]), 1);
        assert_eq!(argmax(std::iter::empty()), 0);
    }

    #[test]
    fn rail_clear_latches_last_on_rail_sample() {
        let rail = [contact(true, 0.0), contact(true, 4.0), contact(true, 9.0), contact(false, 0.0)];
        let rc = latch_rail_clear(&rail);
        assert_eq!(rc.index, Some(2));
        assert_eq!(rc.velocity, 9.0);
        assert_eq!(rc.acceleration, 90.0);
    }

    #[test]
    fn no_rail_sample_gives_zero_rail_clear() {
        let rc = latch_rail_clear(&[contact(false, 3.0)]);
        assert_eq!(rc, RailClear::default());
    }

    #[test]
    fn descent_events_find_deployment_and_landing() {
        let time = [10.0, 11.0, 12.0, 13.0];
        let positions = [
            Vector3::new(0.0, 0.0, 400.0),
            Vector3::new(1.0, 0.0, 250.0),
            Vector3::new(2.0, 0.0, 150.0),
            Vector3::new(3.0, 4.0, -0.5),
        ];
        let ev = DescentEvents::extract(&time, &positions, 200.0);
        assert_eq!(ev.second_deployment.index, 2);
        assert_eq!(ev.second_deployment.time, 12.0);
        assert_eq!(ev.soft_landing.time, 13.0);
        assert_eq!(ev.soft_landing.point, [3.0, 4.0]);
        assert_eq!(ev.soft_landing.downrange, 5.0);
    }
}
