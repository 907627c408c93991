pub mod aerodynamics;
pub mod atmosphere;
pub mod environment;
pub mod gravity;
pub mod wind;

pub use atmosphere::{isa, Atmo};
pub use environment::{Environment, StandardEnvironment};
