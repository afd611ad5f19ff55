pub mod config;
pub mod core;
pub mod errors;
pub mod output;
pub mod read_temperature_file;
pub mod simulation;
pub mod temperature_iterator;

#[cfg(test)]
mod tests;

pub use crate::config::SimulationConfig;
pub use crate::errors::SimulationError;
pub use crate::simulation::controller::SimulationController;

use crate::core::heat_loss::{format_heat_loss_rate, HeatLossRate};
use crate::output::{write_history_report, Output};
use crate::read_temperature_file::temperature_data_to_vec;
use std::io::Read;
use tracing::info;

/// Totals of a simulation run over the whole temperature input.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub steps: usize,
    pub simulated_hours: f64,
    pub final_heat_loss: HeatLossRate,
    pub cumulative_heat_loss: f64, // kWh
    pub electricity_cost: f64,
}

/// Run a simulation headless from start to end and write its history report to `output`.
pub fn run_simulation(
    config: SimulationConfig,
    temperatures: impl Read,
    output: impl Output,
) -> anyhow::Result<RunSummary> {
    let samples = temperature_data_to_vec(temperatures)?;
    info!(samples = samples.len(), "temperature input read");

    let controller = SimulationController::new(config, samples)?;
    let steps = controller.run_to_end()?;
    let history = controller.history();
    write_history_report(&history, &output)?;

    let summary = RunSummary {
        steps,
        simulated_hours: controller.simulation_duration_hours(),
        final_heat_loss: format_heat_loss_rate(history.current().heat_loss().global),
        cumulative_heat_loss: controller.cumulative_heat_loss(),
        electricity_cost: controller.electricity_cost(),
    };
    info!(
        steps,
        cumulative_heat_loss = summary.cumulative_heat_loss,
        electricity_cost = summary.electricity_cost,
        "simulation complete"
    );

    Ok(summary)
}
