use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rocket_dispersion::sim::{FlightResult, Runnable, SimConfig};
use rocket_dispersion::vehicle::{presets, Rocket};
use rocket_dispersion::{DispersionGrid, FlightRun, SweepCell, SweepConfig, WindCondition, WindDispersion};

#[derive(Parser)]
#[command(name = "rocket-dispersion")]
#[command(about = "6DOF rocket flight, parachute descent and wind-dispersion footprints")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Common {
    /// Rocket definition (JSON); the built-in hybrid sounding rocket otherwise
    #[arg(long)]
    rocket: Option<PathBuf>,

    /// Simulation settings (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Result directory
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Single flight under one wind condition
    Run {
        #[command(flatten)]
        common: Common,

        /// Wind speed at the reference altitude (m/s)
        #[arg(long, default_value_t = 0.0)]
        wind_speed: f64,

        /// Direction the wind blows from (deg, clockwise from North)
        #[arg(long, default_value_t = 0.0)]
        wind_direction: f64,

        /// Skip writing result files
        #[arg(short, long)]
        quiet: bool,
    },
    /// Landing footprint over a grid of wind speeds and directions
    Sweep {
        #[command(flatten)]
        common: Common,

        /// Sweep ranges (JSON)
        #[arg(long)]
        sweep: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            common,
            wind_speed,
            wind_direction,
            quiet,
        } => {
            let (rocket, config) = load(&common)?;
            let mut run = FlightRun::new(WindCondition::new(wind_speed, wind_direction))
                .with_config(config)
                .quiet(quiet);
            if let Some(dir) = &common.output {
                run = run.with_output(dir);
            }
            let result = run.run(&rocket).context("flight simulation failed")?;
            print_flight(&rocket, &result);
        }
        Commands::Sweep { common, sweep } => {
            let (rocket, config) = load(&common)?;
            let sweep = match &sweep {
                Some(path) => SweepConfig::from_json_file(path)
                    .with_context(|| format!("reading sweep config {}", path.display()))?,
                None => SweepConfig::default(),
            };
            let mut dispersion = WindDispersion::new(sweep).with_config(config);
            if let Some(dir) = &common.output {
                dispersion = dispersion.with_output(dir);
            }
            let grid = dispersion.run(&rocket).context("wind dispersion failed")?;
            print_dispersion(&rocket, &grid);
        }
    }
    Ok(())
}

fn load(common: &Common) -> anyhow::Result<(Rocket, SimConfig)> {
    let rocket = match &common.rocket {
        Some(path) => Rocket::from_json_file(path)
            .with_context(|| format!("reading rocket definition {}", path.display()))?,
        None => presets::hybrid_sounding_rocket(),
    };
    let config = match &common.config {
        Some(path) => SimConfig::from_json_file(path)
            .with_context(|| format!("reading simulation config {}", path.display()))?,
        None => SimConfig::default(),
    };
    Ok((rocket, config))
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

fn print_flight(rocket: &Rocket, result: &FlightResult) {
    let ev = &result.events;
    let descent = &result.descent.events;

    println!();
    println!("====================================================================");
    println!("  ROCKET FLIGHT SIMULATION — {}", rocket.name);
    println!("====================================================================");
    println!();
    println!("  Vehicle Parameters");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Dry mass:      {:>8.2} kg    Wet mass:     {:>8.2} kg",
        rocket.structure.dry_mass,
        rocket.initial_mass()
    );
    println!(
        "  Impulse:       {:>8.0} N·s   Burn time:    {:>8.2} s",
        rocket.total_impulse(),
        rocket.burn_time()
    );
    println!(
        "  Length:        {:>8.3} m     Initial CG:   {:>8.3} m",
        rocket.geometry.length,
        rocket.initial_center_of_gravity()
    );
    println!(
        "  Wind:          {:>8.1} m/s   from          {:>8.1} deg",
        result.wind.speed, result.wind.direction
    );
    println!();

    println!("  Flight Events");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  RAIL CLEAR               vel={:>7.1}m/s   acc={:>7.1}m/s^2",
        ev.rail_clear.velocity, ev.rail_clear.acceleration
    );
    println!(
        "  MAX Q     t={:>6.2}s   alt={:>8.0}m   q={:>9.0}Pa",
        ev.max_dynamic_pressure.time, ev.max_dynamic_pressure.altitude, ev.max_dynamic_pressure.value
    );
    println!(
        "  MAX SPEED t={:>6.2}s   alt={:>8.0}m   vel={:>7.1}m/s   Mach {:.2}",
        ev.max_airspeed.time, ev.max_airspeed.altitude, ev.max_airspeed.value, ev.max_mach.value
    );
    println!(
        "  APOGEE    t={:>6.2}s   alt={:>8.0}m   downrange={:>7.0}m",
        ev.apogee.time, ev.apogee.altitude, ev.apogee.downrange
    );
    println!(
        "  HARD LAND t={:>6.2}s   x={:>8.0}m   y={:>8.0}m",
        ev.hard_landing.time, ev.hard_landing.point[0], ev.hard_landing.point[1]
    );
    println!(
        "  2ND CHUTE t={:>6.2}s   alt={:>8.0}m",
        descent.second_deployment.time, descent.second_deployment.altitude
    );
    println!(
        "  SOFT LAND t={:>6.2}s   x={:>8.0}m   y={:>8.0}m",
        descent.soft_landing.time, descent.soft_landing.point[0], descent.soft_landing.point[1]
    );
    println!();
    println!("  Samples: {} flight, {} descent", result.time.len(), result.descent.time.len());
    println!("====================================================================");
    println!();
}

fn print_dispersion(rocket: &Rocket, grid: &DispersionGrid) {
    println!();
    println!("====================================================================");
    println!("  WIND DISPERSION — {}", rocket.name);
    println!("====================================================================");
    println!(
        "  {:>6}  {:>7}  {:>9}  {:>9}  {:>9}  {:>9}",
        "wind", "from", "hard x", "hard y", "soft x", "soft y"
    );
    println!("  {}", "─".repeat(60));
    for (speed, row) in grid.speeds.iter().zip(&grid.cells) {
        // The closing column repeats the first direction.
        for (dir, cell) in grid.directions.iter().zip(row).take(row.len().saturating_sub(1)) {
            match cell {
                SweepCell::Landed(p) => println!(
                    "  {:>6.1}  {:>7.1}  {:>9.1}  {:>9.1}  {:>9.1}  {:>9.1}",
                    speed, dir, p.hard[0], p.hard[1], p.soft[0], p.soft[1]
                ),
                SweepCell::Failed { reason } => {
                    println!("  {:>6.1}  {:>7.1}  FAILED: {}", speed, dir, reason)
                }
            }
        }
    }
    println!();
    println!("  Failed cells: {}", grid.failed_cells());
    println!("====================================================================");
    println!();
}
