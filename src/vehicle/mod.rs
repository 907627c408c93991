pub mod presets;
pub mod rocket;
pub mod table;

pub use rocket::{
    Aerodynamics, Engine, FuelGrain, Geometry, Launch, OxidizerTank, Recovery, Rocket, Structure,
};
pub use table::{Table, ThrustCurve};
