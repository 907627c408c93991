pub mod attitude;
pub mod dynamics;
pub mod error;
pub mod io;
pub mod physics;
pub mod sim;
pub mod vehicle;

pub use dynamics::state::WindCondition;
pub use error::{FlightError, Result};
pub use sim::{
    DispersionGrid, EndTime, FlightResult, FlightRun, LandingPoints, Runnable, SimConfig,
    SweepCell, SweepConfig, WindDispersion,
};
pub use vehicle::Rocket;
