use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::config::SimConfig;
use super::event::LandingPoints;
use super::runner::{FlightRun, Runnable};
use crate::dynamics::state::WindCondition;
use crate::error::{FlightError, Result};
use crate::io;
use crate::physics::{Environment, StandardEnvironment};
use crate::vehicle::Rocket;

/// Wind speeds are swept inclusively, directions exclude the upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub speed_min: f64,       // m/s
    pub speed_max: f64,       // m/s
    pub speed_step: f64,      // m/s
    pub direction_min: f64,   // deg
    pub direction_max: f64,   // deg
    pub direction_step: f64,  // deg
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            speed_min: 1.0,
            speed_max: 7.0,
            speed_step: 1.0,
            direction_min: 0.0,
            direction_max: 360.0,
            direction_step: 45.0,
        }
    }
}

impl SweepConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let sweep: SweepConfig = serde_json::from_str(&text)?;
        sweep.validate()?;
        Ok(sweep)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, step) in [("speed_step", self.speed_step), ("direction_step", self.direction_step)] {
            if step <= 0.0 || !step.is_finite() {
                return Err(FlightError::InvalidConfig(format!(
                    "{name} must be positive, got {step}"
                )));
            }
        }
        if self.speed_max < self.speed_min || self.direction_max < self.direction_min {
            return Err(FlightError::InvalidConfig(
                "sweep ranges must not be reversed".into(),
            ));
        }
        Ok(())
    }

    pub fn speeds(&self) -> Vec<f64> {
        let n = ((self.speed_max - self.speed_min) / self.speed_step + 1e-9).floor() as usize + 1;
        (0..n).map(|i| self.speed_min + i as f64 * self.speed_step).collect()
    }

    pub fn directions(&self) -> Vec<f64> {
        let n = ((self.direction_max - self.direction_min) / self.direction_step - 1e-9)
            .ceil()
            .max(0.0) as usize;
        (0..n)
            .map(|i| self.direction_min + i as f64 * self.direction_step)
            .collect()
    }
}

/// Outcome of one wind condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepCell {
    Landed(LandingPoints),
    Failed { reason: String },
}

impl SweepCell {
    pub fn landing(&self) -> Option<&LandingPoints> {
        match self {
            SweepCell::Landed(points) => Some(points),
            SweepCell::Failed { .. } => None,
        }
    }
}

/// Landing points per wind speed (rows) and direction (columns). The last
/// column repeats the first direction to close each ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispersionGrid {
    pub speeds: Vec<f64>,
    pub directions: Vec<f64>,
    pub cells: Vec<Vec<SweepCell>>,
}

impl DispersionGrid {
    /// Run `cell` for every speed/direction pair in parallel and assemble the
    /// grid. A failing cell is recorded, not propagated.
    pub fn sweep_with<F>(speeds: &[f64], directions: &[f64], cell: F) -> Self
    where
        F: Fn(WindCondition) -> Result<LandingPoints> + Sync,
    {
        let width = directions.len();
        let flat: Vec<SweepCell> = (0..speeds.len() * width)
            .into_par_iter()
            .map(|i| {
                let wind = WindCondition::new(speeds[i / width], directions[i % width]);
                match cell(wind) {
                    Ok(points) => SweepCell::Landed(points),
                    Err(e) => {
                        warn!(speed = wind.speed, direction = wind.direction, error = %e, "sweep cell failed");
                        SweepCell::Failed { reason: e.to_string() }
                    }
                }
            })
            .collect();

        let cells = if width == 0 {
            vec![Vec::new(); speeds.len()]
        } else {
            flat.chunks(width)
                .map(|row| {
                    let mut row = row.to_vec();
                    row.push(row[0].clone());
                    row
                })
                .collect()
        };

        let mut closed = directions.to_vec();
        if let Some(&first) = directions.first() {
            closed.push(first);
        }

        Self {
            speeds: speeds.to_vec(),
            directions: closed,
            cells,
        }
    }

    pub fn failed_cells(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|c| matches!(c, SweepCell::Failed { .. }))
            .count()
    }

    /// Successful cells as `(speed, direction, points)`, closing column
    /// included.
    pub fn landings(&self) -> impl Iterator<Item = (f64, f64, &LandingPoints)> + '_ {
        self.speeds.iter().zip(&self.cells).flat_map(move |(&speed, row)| {
            self.directions
                .iter()
                .zip(row)
                .filter_map(move |(&dir, cell)| cell.landing().map(|p| (speed, dir, p)))
        })
    }
}

// ---------------------------------------------------------------------------
// Wind dispersion
// ---------------------------------------------------------------------------

/// One quiet [`FlightRun`] per wind condition of the sweep.
#[derive(Clone)]
pub struct WindDispersion {
    pub sweep: SweepConfig,
    pub config: SimConfig,
    pub env: Arc<dyn Environment>,
    /// Directory for `dispersion.json`.
    pub result_dir: Option<PathBuf>,
}

impl WindDispersion {
    pub fn new(sweep: SweepConfig) -> Self {
        Self {
            sweep,
            config: SimConfig::default(),
            env: Arc::new(StandardEnvironment),
            result_dir: None,
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
}

impl Runnable for WindDispersion {
    type Output = DispersionGrid;

    fn run(&self, rocket: &Rocket) -> Result<DispersionGrid> {
        rocket.validate()?;
        self.config.validate()?;
        self.sweep.validate()?;

        let speeds = self.sweep.speeds();
        let directions = self.sweep.directions();
        info!(
            rocket = %rocket.name,
            speeds = speeds.len(),
            directions = directions.len(),
            "starting wind dispersion"
        );

        let grid = DispersionGrid::sweep_with(&speeds, &directions, |wind| {
            let run = FlightRun {
                wind,
                config: self.config,
                env: Arc::clone(&self.env),
                result_dir: None,
                quiet: true,
            };
            let points = run.run(rocket)?.landing_points();
            debug!(speed = wind.speed, direction = wind.direction, ?points, "sweep cell done");
            Ok(points)
        });

        if let Some(dir) = &self.result_dir {
            std::fs::create_dir_all(dir)?;
            io::json::write_dispersion_file(dir.join("dispersion.json"), &grid)?;
        }
        info!(failed = grid.failed_cells(), "wind dispersion complete");
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::config::EndTime;
    use crate::vehicle::presets;

    fn fake_points(wind: WindCondition) -> LandingPoints {
        LandingPoints {
            hard: [wind.speed, wind.direction],
            soft: [-wind.speed, -wind.direction],
        }
    }

    #[test]
    fn default_ranges() {
        let s = SweepConfig::default();
        assert_eq!(s.speeds(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(
            s.directions(),
            vec![0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0]
        );
    }

    #[test]
    fn default_sweep_has_seven_by_nine_cells() {
        let s = SweepConfig::default();
        let grid = DispersionGrid::sweep_with(&s.speeds(), &s.directions(), |w| Ok(fake_points(w)));
        assert_eq!(grid.cells.len(), 7);
        assert!(grid.cells.iter().all(|row| row.len() == 9));
        assert_eq!(grid.directions.len(), 9);
        assert_eq!(grid.directions[8], 0.0);
        for (i, row) in grid.cells.iter().enumerate() {
            assert_eq!(row[8], row[0]);
            assert_eq!(row[3].landing().unwrap().hard, [grid.speeds[i], 135.0]);
        }
        assert_eq!(grid.landings().count(), 63);
    }

    #[test]
    fn failing_cell_does_not_abort_the_sweep() {
        let grid = DispersionGrid::sweep_with(&[1.0, 2.0], &[0.0, 90.0, 180.0], |w| {
            if w.speed == 2.0 && w.direction == 90.0 {
                Err(FlightError::ZeroAirspeed { time: 1.0 })
            } else {
                Ok(fake_points(w))
            }
        });
        assert_eq!(grid.failed_cells(), 1);
        assert!(matches!(&grid.cells[1][1], SweepCell::Failed { reason } if reason.contains("zero airspeed")));
        assert!(grid.cells[1][0].landing().is_some());
        assert_eq!(grid.landings().count(), 7);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let s = SweepConfig { speed_min: 5.0, speed_max: 1.0, ..SweepConfig::default() };
        assert!(matches!(s.validate(), Err(FlightError::InvalidConfig(_))));
    }

    #[test]
    fn real_sweep_spreads_landing_points_downwind() {
        let rocket = presets::hybrid_sounding_rocket();
        let sweep = SweepConfig {
            speed_min: 2.0,
            speed_max: 4.0,
            speed_step: 2.0,
            direction_min: 0.0,
            direction_max: 360.0,
            direction_step: 180.0,
        };
        let config = SimConfig { end_time: EndTime::Fixed(120.0), ..SimConfig::default() };
        let grid = WindDispersion::new(sweep).with_config(config).run(&rocket).unwrap();
        assert_eq!(grid.failed_cells(), 0);
        assert_eq!(grid.cells.len(), 2);
        assert!(grid.cells.iter().all(|row| row.len() == 3));
        // Wind from the North pushes the canopy further South than wind from
        // the South does.
        let row = &grid.cells[1];
        let north = row[0].landing().unwrap();
        let south = row[1].landing().unwrap();
        assert!(north.soft[1] < south.soft[1]);
    }
}
