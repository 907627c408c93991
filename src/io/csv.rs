use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::dynamics::{Diagnostics, FlightState};
use crate::error::Result;
use crate::sim::FlightResult;

/// One row of `log.csv`.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub time_s: f64,
    pub pos_east_m: f64,
    pub pos_north_m: f64,
    pub altitude_m: f64,
    pub vel_east_mps: f64,
    pub vel_north_mps: f64,
    pub vel_up_mps: f64,
    pub vel_body_x_mps: f64,
    pub vel_body_y_mps: f64,
    pub vel_body_z_mps: f64,
    pub roll_rate_rps: f64,
    pub pitch_rate_rps: f64,
    pub yaw_rate_rps: f64,
    pub quat_w: f64,
    pub quat_x: f64,
    pub quat_y: f64,
    pub quat_z: f64,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub roll_deg: f64,

    pub gravity_mps2: f64,
    pub pressure_pa: f64,
    pub density_kgpm3: f64,
    pub wind_east_mps: f64,
    pub wind_north_mps: f64,
    pub air_body_x_mps: f64,
    pub air_body_y_mps: f64,
    pub air_body_z_mps: f64,
    pub airspeed_mps: f64,
    pub alpha_deg: f64,
    pub beta_deg: f64,
    pub mach: f64,
    pub dynamic_pressure_pa: f64,

    pub mdot_fuel_kgps: f64,
    pub mdot_oxidizer_kgps: f64,
    pub mdot_propellant_kgps: f64,
    pub thrust_n: f64,
    pub isp_s: f64,
    pub fuel_mass_kg: f64,
    pub oxidizer_mass_kg: f64,
    pub propellant_mass_kg: f64,
    pub mass_kg: f64,

    pub drag_n: f64,
    pub normal_n: f64,
    pub force_body_x_n: f64,
    pub force_body_y_n: f64,
    pub force_body_z_n: f64,
    pub accel_body_x_mps2: f64,
    pub accel_body_y_mps2: f64,
    pub accel_body_z_mps2: f64,
    pub accel_east_mps2: f64,
    pub accel_north_mps2: f64,
    pub accel_up_mps2: f64,

    pub cg_oxidizer_m: f64,
    pub cg_propellant_m: f64,
    pub cg_m: f64,
    pub cp_m: f64,
    pub stability_margin_pct: f64,
    pub inertia_roll_kgm2: f64,
    pub inertia_pitch_kgm2: f64,
    pub moment_roll_nm: f64,
    pub moment_pitch_nm: f64,
    pub moment_yaw_nm: f64,
}

impl LogRecord {
    pub fn new(time: f64, s: &FlightState, d: &Diagnostics) -> Self {
        Self {
            time_s: time,
            pos_east_m: s.pos.x,
            pos_north_m: s.pos.y,
            altitude_m: s.pos.z,
            vel_east_mps: s.vel.x,
            vel_north_mps: s.vel.y,
            vel_up_mps: s.vel.z,
            vel_body_x_mps: s.vel_body.x,
            vel_body_y_mps: s.vel_body.y,
            vel_body_z_mps: s.vel_body.z,
            roll_rate_rps: s.omega.x,
            pitch_rate_rps: s.omega.y,
            yaw_rate_rps: s.omega.z,
            quat_w: s.quat.w,
            quat_x: s.quat.i,
            quat_y: s.quat.j,
            quat_z: s.quat.k,
            azimuth_deg: d.euler.x,
            elevation_deg: d.euler.y,
            roll_deg: d.euler.z,
            gravity_mps2: d.gravity,
            pressure_pa: d.pressure,
            density_kgpm3: d.density,
            wind_east_mps: d.wind.x,
            wind_north_mps: d.wind.y,
            air_body_x_mps: d.air_velocity.x,
            air_body_y_mps: d.air_velocity.y,
            air_body_z_mps: d.air_velocity.z,
            airspeed_mps: d.airspeed,
            alpha_deg: d.alpha,
            beta_deg: d.beta,
            mach: d.mach,
            dynamic_pressure_pa: d.dynamic_pressure,
            mdot_fuel_kgps: d.mdot_fuel,
            mdot_oxidizer_kgps: d.mdot_oxidizer,
            mdot_propellant_kgps: d.mdot_propellant,
            thrust_n: d.thrust,
            isp_s: d.isp,
            fuel_mass_kg: d.fuel_mass,
            oxidizer_mass_kg: d.oxidizer_mass,
            propellant_mass_kg: d.propellant_mass,
            mass_kg: d.mass,
            drag_n: d.drag,
            normal_n: d.normal,
            force_body_x_n: d.force_body.x,
            force_body_y_n: d.force_body.y,
            force_body_z_n: d.force_body.z,
            accel_body_x_mps2: d.accel_body.x,
            accel_body_y_mps2: d.accel_body.y,
            accel_body_z_mps2: d.accel_body.z,
            accel_east_mps2: d.accel_enu.x,
            accel_north_mps2: d.accel_enu.y,
            accel_up_mps2: d.accel_enu.z,
            cg_oxidizer_m: d.cg_oxidizer,
            cg_propellant_m: d.cg_propellant,
            cg_m: d.cg,
            cp_m: d.cp,
            stability_margin_pct: d.stability_margin,
            inertia_roll_kgm2: d.inertia.x,
            inertia_pitch_kgm2: d.inertia.y,
            moment_roll_nm: d.moment.x,
            moment_pitch_nm: d.moment.y,
            moment_yaw_nm: d.moment.z,
        }
    }
}

/// Write one row per retained flight sample, header first.
pub fn write_flight_log<W: Write>(writer: W, result: &FlightResult) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for ((&t, s), d) in result.time.iter().zip(&result.states).zip(&result.diagnostics) {
        wtr.serialize(LogRecord::new(t, s, d))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_flight_log_file(path: impl AsRef<Path>, result: &FlightResult) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_flight_log(std::io::BufWriter::new(file), result)
}
