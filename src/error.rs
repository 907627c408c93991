use thiserror::Error;

/// Flight phase an error or event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Flight,
    Descent,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Flight => f.write_str("flight"),
            Phase::Descent => f.write_str("parachute descent"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FlightError {
    /// Zero-norm or non-finite attitude quaternion. Never expected from a
    /// valid initial condition.
    #[error("degenerate orientation: attitude quaternion has zero or non-finite norm")]
    DegenerateOrientation,

    #[error("zero airspeed off the launch rail at t={time:.4}s")]
    ZeroAirspeed { time: f64 },

    #[error("integration diverged at t={time:.4}s: {reason}")]
    IntegrationDivergence { time: f64, reason: String },

    #[error("no ground impact during {phase} before t={end_time:.2}s (last altitude {altitude:.1}m)")]
    NoGroundImpactFound {
        phase: Phase,
        end_time: f64,
        altitude: f64,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FlightError>;
