use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::dynamics::WindCondition;
use crate::error::Result;
use crate::sim::event::{DescentEvents, FlightEvents, LandingPoints};
use crate::sim::{DispersionGrid, FlightResult};
use crate::vehicle::Rocket;

/// Contents of `summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct FlightSummary<'a> {
    pub rocket: &'a str,
    pub wind: WindCondition,
    pub samples: usize,
    pub flight: &'a FlightEvents,
    pub descent: &'a DescentEvents,
    pub landing_points: LandingPoints,
}

impl<'a> FlightSummary<'a> {
    pub fn new(rocket: &'a Rocket, result: &'a FlightResult) -> Self {
        Self {
            rocket: &rocket.name,
            wind: result.wind,
            samples: result.time.len(),
            flight: &result.events,
            descent: &result.descent.events,
            landing_points: result.landing_points(),
        }
    }
}

pub fn write_summary<W: Write>(writer: W, rocket: &Rocket, result: &FlightResult) -> Result<()> {
    serde_json::to_writer_pretty(writer, &FlightSummary::new(rocket, result))?;
    Ok(())
}

pub fn write_summary_file(
    path: impl AsRef<Path>,
    rocket: &Rocket,
    result: &FlightResult,
) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_summary(std::io::BufWriter::new(file), rocket, result)
}

pub fn write_dispersion<W: Write>(writer: W, grid: &DispersionGrid) -> Result<()> {
    serde_json::to_writer_pretty(writer, grid)?;
    Ok(())
}

pub fn write_dispersion_file(path: impl AsRef<Path>, grid: &DispersionGrid) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_dispersion(std::io::BufWriter::new(file), grid)
}
