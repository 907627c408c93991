use std::path::{Path, PathBuf};
use std::sync::Arc;

use nalgebra::Vector3;
use tracing::{debug, info};

use super::config::SimConfig;
use super::event::{self, DescentEvents, FlightEvents, LandingPoints};
use super::integrator::{self, time_grid};
use crate::attitude;
use crate::dynamics::parachute::{DescentContext, DescentVector};
use crate::dynamics::sixdof::{self, Diagnostics, FlightContext, RailContact};
use crate::dynamics::state::{FlightState, WindCondition};
use crate::error::{FlightError, Phase, Result};
use crate::io;
use crate::physics::{Environment, StandardEnvironment};
use crate::vehicle::Rocket;

/// Grid extensions tried when the parachute descent has not reached the
/// ground inside the estimated descent time.
pub const MAX_DESCENT_EXTENSIONS: usize = 10;

/// A simulation that can be run against a rocket definition.
pub trait Runnable {
    type Output;

    fn run(&self, rocket: &Rocket) -> Result<Self::Output>;
}

// ---------------------------------------------------------------------------
// Single flight
// ---------------------------------------------------------------------------

/// One flight under one wind condition: integration, trimming, derived
/// series, events and parachute descent.
#[derive(Clone)]
pub struct FlightRun {
    pub wind: WindCondition,
    pub config: SimConfig,
    pub env: Arc<dyn Environment>,
    /// Directory for `log.csv` and `summary.json`.
    pub result_dir: Option<PathBuf>,
    /// Suppress file output.
    pub quiet: bool,
}

impl FlightRun {
    pub fn new(wind: WindCondition) -> Self {
        Self {
            wind,
            config: SimConfig::default(),
            env: Arc::new(StandardEnvironment),
            result_dir: None,
            quiet: false,
        }
    }

    pub fn with_config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_environment(mut self, env: Arc<dyn Environment>) -> Self {
        self.env = env;
        self
    }

    pub fn with_output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.result_dir = Some(dir.into());
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

#[derive(Debug, Clone)]
pub struct DescentResult {
    pub time: Vec<f64>,
    pub positions: Vec<Vector3<f64>>, // m, ENU
    pub descent_rate: Vec<f64>,       // m/s, negative downwards
    pub events: DescentEvents,
}

#[derive(Debug, Clone)]
pub struct FlightResult {
    pub wind: WindCondition,
    pub time: Vec<f64>,
    /// Trimmed at the hard landing, quaternions normalized.
    pub states: Vec<FlightState>,
    pub diagnostics: Vec<Diagnostics>,
    pub events: FlightEvents,
    pub descent: DescentResult,
}

impl FlightResult {
    pub fn landing_points(&self) -> LandingPoints {
        LandingPoints {
            hard: self.events.hard_landing.point,
            soft: self.descent.events.soft_landing.point,
        }
    }
}

/// Rail-exit position, launch attitude, zero rates and full tanks.
pub fn initial_state(rocket: &Rocket) -> FlightState {
    let launch = &rocket.launch;
    let az = launch.azimuth.to_radians();
    let el = launch.elevation.to_radians();
    let cg_to_tail = rocket.geometry.length - rocket.initial_center_of_gravity();
    let horizontal = cg_to_tail * el.cos();
    FlightState {
        pos: Vector3::new(horizontal * az.cos(), horizontal * az.sin(), cg_to_tail * el.abs().sin()),
        vel: Vector3::zeros(),
        vel_body: Vector3::zeros(),
        omega: Vector3::zeros(),
        quat: *attitude::euler_to_quat(launch.azimuth, launch.elevation, launch.roll).quaternion(),
        fuel_mass: rocket.fuel.initial_mass,
        oxidizer_mass: rocket.oxidizer.initial_mass,
    }
}

impl Runnable for FlightRun {
    type Output = FlightResult;

    fn run(&self, rocket: &Rocket) -> Result<FlightResult> {
        rocket.validate()?;
        self.config.validate()?;
        info!(
            rocket = %rocket.name,
            wind_speed = self.wind.speed,
            wind_direction = self.wind.direction,
            "starting flight"
        );

        let ctx = FlightContext {
            rocket,
            env: self.env.as_ref(),
            wind: self.wind,
        };

        let (time, mut states) = self.integrate_flight(&ctx)?;
        let (diagnostics, rail) = derive_series(&ctx, &time, &mut states)?;
        let events = FlightEvents::extract(&time, &states, &diagnostics, &rail);
        debug!(
            time = events.apogee.time,
            altitude = events.apogee.altitude,
            rail_clear_velocity = events.rail_clear.velocity,
            "apogee"
        );

        let descent = self.descend(&ctx, &events)?;
        let result = FlightResult {
            wind: self.wind,
            time,
            states,
            diagnostics,
            events,
            descent,
        };

        if !self.quiet {
            if let Some(dir) = &self.result_dir {
                write_outputs(dir, rocket, &result)?;
            }
        }

        let landing = result.landing_points();
        info!(
            apogee = result.events.apogee.altitude,
            hard_x = landing.hard[0],
            hard_y = landing.hard[1],
            soft_x = landing.soft[0],
            soft_y = landing.soft[1],
            "flight complete"
        );
        Ok(result)
    }
}

impl FlightRun {
    /// Integrate from the rail to the first sample at or below ground and
    /// trim there.
    fn integrate_flight(&self, ctx: &FlightContext<'_>) -> Result<(Vec<f64>, Vec<FlightState>)> {
        let end = self.config.end_time.resolve(ctx.rocket.total_impulse());
        let grid = time_grid(0.0, end, self.config.timestep);
        let y0 = initial_state(ctx.rocket).to_vector();
        debug!(end_time = end, samples = grid.len(), "integrating flight");

        let mut solution = integrator::solve(
            ctx,
            y0,
            &grid,
            &self.config.solver_options(),
            |y| y[2] <= 0.0,
        )?;

        let altitudes = solution.states.iter().map(|y| y[2]);
        let Some(impact) = event::ground_impact_index(altitudes) else {
            return Err(FlightError::NoGroundImpactFound {
                phase: Phase::Flight,
                end_time: end,
                altitude: solution.states.last().map_or(f64::NAN, |y| y[2]),
            });
        };
        solution.time.truncate(impact + 1);
        solution.states.truncate(impact + 1);
        debug!(
            time = solution.time[impact],
            steps = solution.steps,
            "hard landing, trajectory trimmed"
        );

        let states = solution.states.iter().map(FlightState::from_vector).collect();
        Ok((solution.time, states))
    }

    /// Parachute descent from apogee, on a time axis starting at the hard
    /// landing.
    fn descend(&self, ctx: &FlightContext<'_>, events: &FlightEvents) -> Result<DescentResult> {
        let apogee = &events.apogee;
        let descent = DescentContext {
            rocket: ctx.rocket,
            env: ctx.env,
            wind: ctx.wind,
            mass: apogee.mass,
        };
        let start = events.hard_landing.time;
        let window = apogee.altitude.max(0.0) / descent.terminal_velocity();
        let dt = self.config.descent_timestep;
        let options = self.config.solver_options();
        debug!(start, window, "parachute descent");

        let mut y = DescentVector::new(
            apogee.position.x,
            apogee.position.y,
            apogee.position.z,
            apogee.velocity.z,
        );
        let mut t = start;
        let mut time: Vec<f64> = Vec::new();
        let mut states: Vec<DescentVector> = Vec::new();

        for k in 1..=MAX_DESCENT_EXTENSIONS + 1 {
            // Each window adds at least one sample.
            let end = (start + k as f64 * window).max(t + 1.5 * dt);
            let grid = time_grid(t, end, dt);
            let solution = integrator::solve(&descent, y, &grid, &options, |y| y[2] <= 0.0)?;
            let skip = usize::from(!time.is_empty());
            time.extend_from_slice(&solution.time[skip..]);
            states.extend_from_slice(&solution.states[skip..]);

            if solution.stopped {
                let positions: Vec<Vector3<f64>> =
                    states.iter().map(|s| s.fixed_rows::<3>(0).into_owned()).collect();
                let events = DescentEvents::extract(
                    &time,
                    &positions,
                    ctx.rocket.recovery.second_deploy_altitude,
                );
                debug!(
                    second_deployment = events.second_deployment.time,
                    soft_landing = events.soft_landing.time,
                    "parachute landing"
                );
                return Ok(DescentResult {
                    time,
                    descent_rate: states.iter().map(|s| s[3]).collect(),
                    positions,
                    events,
                });
            }
            if let Some((t_last, y_last)) = solution.last() {
                t = t_last;
                y = *y_last;
            }
        }

        Err(FlightError::NoGroundImpactFound {
            phase: Phase::Descent,
            end_time: t,
            altitude: y[2],
        })
    }
}

/// Re-evaluate the equations of motion at every retained sample.
fn derive_series(
    ctx: &FlightContext<'_>,
    time: &[f64],
    states: &mut [FlightState],
) -> Result<(Vec<Diagnostics>, Vec<RailContact>)> {
    let mut diagnostics = Vec::with_capacity(states.len());
    let mut rail = Vec::with_capacity(states.len());
    for (&t, state) in time.iter().zip(states.iter_mut()) {
        let eval = sixdof::evaluate(t, state, ctx)?;
        state.quat = *attitude::normalize(&state.quat)?.quaternion();
        diagnostics.push(eval.diagnostics);
        rail.push(eval.rail);
    }
    Ok((diagnostics, rail))
}

fn write_outputs(dir: &Path, rocket: &Rocket, result: &FlightResult) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    io::csv::write_flight_log_file(dir.join("log.csv"), result)?;
    io::json::write_summary_file(dir.join("summary.json"), rocket, result)?;
    debug!(dir = %dir.display(), "flight results written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::atmosphere::Atmo;
    use crate::sim::config::EndTime;
    use crate::vehicle::presets;
    use approx::assert_relative_eq;

    fn ballistic_run() -> (Rocket, FlightResult) {
        let rocket = presets::constant_thrust_test_article();
        let config = SimConfig {
            timestep: 0.05,
            end_time: EndTime::Fixed(150.0),
            ..SimConfig::default()
        };
        let result = FlightRun::new(WindCondition::default())
            .with_config(config)
            .run(&rocket)
            .unwrap();
        (rocket, result)
    }

    fn burnout_index(result: &FlightResult) -> usize {
        result.time.iter().position(|&t| t >= 5.0 - 1e-9).unwrap()
    }

    #[test]
    fn initial_state_sits_on_the_rail() {
        let rocket = presets::hybrid_sounding_rocket();
        let s = initial_state(&rocket);
        let offset = rocket.geometry.length - rocket.initial_center_of_gravity();
        assert_relative_eq!(s.pos.norm(), offset, epsilon = 1e-12);
        // Azimuth 90 is North.
        assert_relative_eq!(s.pos.x, 0.0, epsilon = 1e-12);
        assert!(s.pos.y > 0.0 && s.pos.z > 0.0);
        assert_eq!(s.vel, Vector3::zeros());
        assert_eq!(s.fuel_mass, rocket.fuel.initial_mass);
    }

    #[test]
    fn constant_thrust_reaches_expected_burnout_speed() {
        let (_, result) = ballistic_run();
        let bo = burnout_index(&result);
        let v = result.states[bo].vel.norm();
        // 100 m/s^2 thrust less gravity for 5 s.
        assert!(v > 440.0 && v < 510.0, "burnout speed {v}");
        assert_relative_eq!(v, 451.0, max_relative = 0.01);
        for w in result.states[..=bo].windows(2) {
            assert!(w[1].pos.z > w[0].pos.z);
        }
    }

    #[test]
    fn constant_thrust_apogee_follows_burnout() {
        let (_, result) = ballistic_run();
        let ap = &result.events.apogee;
        assert!(ap.time > 5.0);
        assert_relative_eq!(ap.altitude, 11_500.0, max_relative = 0.03);
        let hard = &result.events.hard_landing;
        assert!(hard.time > 90.0 && hard.time < 110.0, "hard landing at {}", hard.time);
    }

    #[test]
    fn vertical_symmetric_flight_does_not_drift() {
        let mut rocket = presets::hybrid_sounding_rocket();
        rocket.launch.elevation = 90.0;
        let config = SimConfig {
            end_time: EndTime::Fixed(60.0),
            ..SimConfig::default()
        };
        let result = FlightRun::new(WindCondition::default())
            .with_config(config)
            .run(&rocket)
            .unwrap();
        let bo = result.time.iter().position(|&t| t >= rocket.burn_time()).unwrap();
        assert!(result.states[bo].pos.xy().norm() < 1e-6);
    }

    #[test]
    fn trimmed_trajectory_ends_at_first_ground_contact() {
        let (_, result) = ballistic_run();
        let n = result.states.len();
        assert!(result.states[n - 1].pos.z <= 0.0);
        assert!(result.states[..n - 1].iter().all(|s| s.pos.z > 0.0));
        assert_eq!(result.events.hard_landing.index, n - 1);
        assert_eq!(result.diagnostics.len(), n);
    }

    #[test]
    fn mass_never_increases_and_respects_floors() {
        let rocket = presets::hybrid_sounding_rocket();
        let result = FlightRun::new(WindCondition::new(3.0, 45.0)).run(&rocket).unwrap();
        for w in result.diagnostics.windows(2) {
            assert!(w[1].mass <= w[0].mass + 1e-12);
        }
        for s in &result.states {
            assert!(s.fuel_mass >= rocket.fuel.residual_mass - 1e-12);
            assert!(s.oxidizer_mass >= 0.0);
        }
        let after = result.time.iter().position(|&t| t >= rocket.burn_time()).unwrap();
        let final_mass = result.diagnostics[after].mass;
        assert!(result.diagnostics[after..].iter().all(|d| d.mass == final_mass));
    }

    #[test]
    fn apogee_is_a_local_maximum() {
        let rocket = presets::hybrid_sounding_rocket();
        let result = FlightRun::new(WindCondition::new(4.0, 270.0)).run(&rocket).unwrap();
        let i = result.events.apogee.index;
        let h = result.states[i].pos.z;
        assert!(i > 0 && i + 1 < result.states.len());
        assert!(result.states[i - 1].pos.z <= h);
        assert!(result.states[i + 1].pos.z <= h);
        assert!(result.events.max_airspeed.index < i);
        assert!(result.events.max_dynamic_pressure.time < result.events.apogee.time);
    }

    #[test]
    fn rail_clear_is_latched_before_free_flight() {
        let rocket = presets::hybrid_sounding_rocket();
        let result = FlightRun::new(WindCondition::default()).run(&rocket).unwrap();
        let rc = result.events.rail_clear;
        let i = rc.index.unwrap();
        assert!(result.time[i] < sixdof::RAIL_HOLD_TIME);
        assert!(rc.velocity > 0.0);
        assert!(rc.acceleration > 0.0);
    }

    #[test]
    fn parachute_lands_after_hard_landing() {
        let rocket = presets::hybrid_sounding_rocket();
        let result = FlightRun::new(WindCondition::new(5.0, 0.0)).run(&rocket).unwrap();
        let d = &result.descent;
        assert!(d.events.soft_landing.time > result.events.hard_landing.time);
        assert!(d.positions.last().unwrap().z <= 0.0);
        assert_relative_eq!(d.time[0], result.events.hard_landing.time);
        // Wind from the North drifts the canopy South of apogee.
        assert!(d.positions.last().unwrap().y < result.events.apogee.position.y);
        let second = &d.events.second_deployment;
        assert!(second.altitude <= rocket.recovery.second_deploy_altitude);
        assert!(second.index <= d.events.soft_landing.index);
    }

    #[test]
    fn landing_points_pair_both_scenarios() {
        let rocket = presets::hybrid_sounding_rocket();
        let result = FlightRun::new(WindCondition::new(2.0, 90.0)).run(&rocket).unwrap();
        let lp = result.landing_points();
        assert_eq!(lp.hard, result.events.hard_landing.point);
        assert_eq!(lp.soft, result.descent.events.soft_landing.point);
        assert_ne!(lp.hard, lp.soft);
    }

    #[test]
    fn short_end_time_reports_missing_ground_impact() {
        let rocket = presets::hybrid_sounding_rocket();
        let config = SimConfig {
            end_time: EndTime::Fixed(2.0),
            ..SimConfig::default()
        };
        let err = FlightRun::new(WindCondition::default())
            .with_config(config)
            .run(&rocket)
            .unwrap_err();
        assert!(matches!(
            err,
            FlightError::NoGroundImpactFound { phase: Phase::Flight, .. }
        ));
    }

    /// Standard environment with thinner air at and below ground level. The
    /// descent aloft is unchanged while the estimated descent window shrinks.
    struct ThinGround {
        density_scale: f64,
    }

    impl Environment for ThinGround {
        fn gravity(&self, altitude: f64) -> f64 {
            StandardEnvironment.gravity(altitude)
        }

        fn atmosphere(&self, altitude: f64) -> Atmo {
            let mut atmo = StandardEnvironment.atmosphere(altitude);
            if altitude <= 0.0 {
                atmo.density *= self.density_scale;
            }
            atmo
        }

        fn wind(
            &self,
            speed: f64,
            direction: f64,
            altitude: f64,
            reference_altitude: f64,
            power_exponent: f64,
        ) -> Vector3<f64> {
            StandardEnvironment.wind(speed, direction, altitude, reference_altitude, power_exponent)
        }
    }

    /// Flight events from the standard environment, then the parachute
    /// descent under `ThinGround`. Returns the events, the first descent
    /// window and the descent outcome.
    fn descend_through(density_scale: f64) -> (FlightEvents, f64, Result<DescentResult>) {
        let mut rocket = presets::hybrid_sounding_rocket();
        // Both canopies open from apogee.
        rocket.recovery.second_deploy_altitude = 1.0e5;
        let run = FlightRun::new(WindCondition::new(2.0, 45.0)).quiet(true);
        let events = run.run(&rocket).unwrap().events;

        let env = ThinGround { density_scale };
        let descent = DescentContext {
            rocket: &rocket,
            env: &env,
            wind: run.wind,
            mass: events.apogee.mass,
        };
        let window = events.apogee.altitude / descent.terminal_velocity();
        let ctx = FlightContext {
            rocket: &rocket,
            env: &env,
            wind: run.wind,
        };
        (events, window, run.descend(&ctx, &events))
    }

    #[test]
    fn descent_grid_is_extended_until_touchdown() {
        let (events, window, descent) = descend_through(0.04);
        let descent = descent.unwrap();
        let start = events.hard_landing.time;
        let dt = SimConfig::default().descent_timestep;

        // Landing lies beyond the first window, so at least one extension ran.
        assert!(descent.events.soft_landing.time - start > window);
        assert!(descent.positions.last().unwrap().z <= 0.0);
        assert_eq!(descent.time.len(), descent.positions.len());
        assert_eq!(descent.time[0], start);
        // No duplicated or missing samples at the window seams.
        for pair in descent.time.windows(2) {
            assert_relative_eq!(pair[1] - pair[0], dt, epsilon = 1e-9);
        }
    }

    #[test]
    fn descent_gives_up_after_extension_budget() {
        let (events, window, descent) = descend_through(1e-10);
        let dt = SimConfig::default().descent_timestep;
        assert!(window < dt);

        let FlightError::NoGroundImpactFound { phase, end_time, altitude } = descent.unwrap_err()
        else {
            panic!("expected NoGroundImpactFound");
        };
        assert!(matches!(phase, Phase::Descent));
        assert!(altitude > 0.0);
        // Windows shorter than a step add one sample each.
        assert_relative_eq!(
            end_time - events.hard_landing.time,
            (MAX_DESCENT_EXTENSIONS + 1) as f64 * dt,
            epsilon = 1e-9
        );
    }

    #[test]
    fn results_are_written_unless_quiet() {
        let rocket = presets::hybrid_sounding_rocket();
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("results");

        FlightRun::new(WindCondition::new(1.0, 0.0))
            .with_output(dir.clone())
            .quiet(true)
            .run(&rocket)
            .unwrap();
        assert!(!dir.join("log.csv").exists());

        FlightRun::new(WindCondition::new(1.0, 0.0))
            .with_output(dir.clone())
            .run(&rocket)
            .unwrap();
        assert!(dir.join("log.csv").exists());
        assert!(dir.join("summary.json").exists());
    }
}
