use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

use rocket_dispersion::sim::{DispersionGrid, FlightResult, Runnable};
use rocket_dispersion::vehicle::{presets, Rocket};
use rocket_dispersion::{FlightRun, SweepConfig, WindCondition, WindDispersion};

fn main() -> eframe::Result {
    let rocket = presets::hybrid_sounding_rocket();
    let flight = FlightRun::new(WindCondition::new(3.0, 0.0))
        .quiet(true)
        .run(&rocket)
        .ok();
    let grid = WindDispersion::new(SweepConfig::default()).run(&rocket).ok();

    let app = DispersionViz { rocket, flight, grid };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native("Rocket Wind Dispersion", options, Box::new(|_| Ok(Box::new(app))))
}

struct DispersionViz {
    rocket: Rocket,
    flight: Option<FlightResult>,
    grid: Option<DispersionGrid>,
}

impl eframe::App for DispersionViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.heading(format!("Rocket: {}", self.rocket.name));
            match &self.flight {
                Some(f) => ui.label(format!(
                    "Apogee: {:.0} m  |  Hard landing: {:.1} s  |  Soft landing: {:.1} s",
                    f.events.apogee.altitude,
                    f.events.hard_landing.time,
                    f.descent.events.soft_landing.time,
                )),
                None => ui.label("Reference flight failed"),
            };
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let half_w = available.x / 2.0 - 8.0;

            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.label("Altitude (m)");
                    Plot::new("altitude")
                        .width(half_w)
                        .height(available.y / 2.0 - 8.0)
                        .x_axis_label("Time (s)")
                        .legend(Legend::default())
                        .show(ui, |plot_ui| {
                            if let Some(f) = &self.flight {
                                let ascent: PlotPoints = f
                                    .time
                                    .iter()
                                    .zip(&f.states)
                                    .map(|(&t, s)| [t, s.pos.z])
                                    .collect();
                                plot_ui.line(Line::new("Ballistic", ascent));
                                let chute: PlotPoints = f
                                    .descent
                                    .time
                                    .iter()
                                    .zip(&f.descent.positions)
                                    .map(|(&t, p)| [t, p.z])
                                    .collect();
                                plot_ui.line(Line::new("Parachute", chute));
                            }
                        });
                });

                ui.vertical(|ui| {
                    ui.label("Trajectory Profile (m)");
                    Plot::new("profile")
                        .width(half_w)
                        .height(available.y / 2.0 - 8.0)
                        .x_axis_label("Downrange (m)")
                        .data_aspect(1.0)
                        .show(ui, |plot_ui| {
                            if let Some(f) = &self.flight {
                                let points: PlotPoints = f
                                    .states
                                    .iter()
                                    .map(|s| [s.downrange(), s.pos.z])
                                    .collect();
                                plot_ui.line(Line::new("Trajectory", points));
                            }
                        });
                });
            });

            ui.label("Landing footprint, East vs North (m)");
            Plot::new("footprint")
                .width(available.x - 8.0)
                .height(available.y / 2.0 - 40.0)
                .data_aspect(1.0)
                .legend(Legend::default())
                .show(ui, |plot_ui| {
                    let Some(grid) = &self.grid else {
                        return;
                    };
                    for (speed, row) in grid.speeds.iter().zip(&grid.cells) {
                        let hard: Vec<[f64; 2]> =
                            row.iter().filter_map(|c| c.landing()).map(|p| p.hard).collect();
                        let soft: Vec<[f64; 2]> =
                            row.iter().filter_map(|c| c.landing()).map(|p| p.soft).collect();
                        plot_ui.line(Line::new(format!("hard {speed:.0} m/s"), PlotPoints::from(hard)));
                        plot_ui.line(Line::new(format!("soft {speed:.0} m/s"), PlotPoints::from(soft)));
                    }
                    plot_ui.points(Points::new("launch", vec![[0.0, 0.0]]).radius(4.0));
                });
        });
    }
}
