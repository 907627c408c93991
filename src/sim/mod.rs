pub mod config;
pub mod event;
pub mod integrator;
pub mod runner;
pub mod sweep;

pub use config::{EndTime, SimConfig};
pub use event::{FlightEvents, LandingPoints};
pub use runner::{initial_state, FlightResult, FlightRun, Runnable};
pub use sweep::{DispersionGrid, SweepCell, SweepConfig, WindDispersion};
