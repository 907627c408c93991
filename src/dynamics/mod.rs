pub mod mass;
pub mod parachute;
pub mod sixdof;
pub mod state;

pub use mass::MassProperties;
pub use parachute::DescentContext;
pub use sixdof::{evaluate, Diagnostics, Evaluation, FlightContext, RailContact};
pub use state::{Deriv, FlightState, WindCondition};
