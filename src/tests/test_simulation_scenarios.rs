mod test_simulation_scenarios {
    use crate::config::SimulationConfig;
    use crate::core::heat_loss::{LayerTopology, PowerUnit};
    use crate::core::house_component::ComponentType;
    use crate::output::SinkOutput;
    use crate::read_temperature_file::temperature_data_to_vec;
    use crate::simulation::history::{Action, SimulationHistory};
    use crate::simulation::snapshot::{SimulationSnapshot, SnapshotChanges, WeatherStep};
    use crate::{run_simulation, SimulationController};
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};
    use itertools::Itertools;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::sync::Arc;

    fn temperature_csv(temperatures: &[f64]) -> String {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let rows = temperatures
            .iter()
            .enumerate()
            .map(|(i, temperature)| {
                let timestamp = start + Duration::hours(i as i64);
                format!("{},{temperature}", timestamp.to_rfc3339())
            })
            .join("\n");
        format!("time,temperature\n{rows}\n")
    }

    #[fixture]
    pub fn history() -> SimulationHistory {
        let config = SimulationConfig::default();
        let initial = SimulationSnapshot::new(
            config.indoor_temperature,
            5.,
            config.number_of_floors,
            config.price_per_kwh,
            Arc::new(config.build_tree().unwrap()),
            config.layer_topology,
        )
        .unwrap();
        SimulationHistory::new(initial)
    }

    fn steps(temperatures: &[f64]) -> Vec<WeatherStep> {
        temperatures
            .iter()
            .map(|temperature| WeatherStep::new(*temperature, 24.))
            .collect()
    }

    #[rstest]
    fn should_reproduce_identical_snapshots_when_revisiting_the_future(
        history: SimulationHistory,
    ) {
        let forward = history
            .reduce(Action::Advance(steps(&[-2., 4., 9.])))
            .unwrap();
        let revisited = forward
            .reduce(Action::Rewind(1))
            .unwrap()
            .reduce(Action::Advance(steps(&[4., 9.])))
            .unwrap();

        assert_eq!(revisited.past().collect_vec(), forward.past().collect_vec());
        assert_eq!(revisited.future().len(), 0);
    }

    #[rstest]
    fn should_recompute_after_editing_the_present(history: SimulationHistory) {
        let forward = history
            .reduce(Action::Advance(steps(&[-2., 4., 9.])))
            .unwrap();
        let edited = forward
            .reduce(Action::Rewind(1))
            .unwrap()
            .reduce(Action::UpdateCurrent(SnapshotChanges {
                indoor_temperature: Some(18.),
                ..Default::default()
            }))
            .unwrap();
        assert_eq!(edited.future().len(), 0);

        let recomputed = edited
            .reduce(Action::Advance(steps(&[4., 9.])))
            .unwrap();
        let original = forward.past().collect_vec();
        let fresh = recomputed.past().collect_vec();

        assert_eq!(fresh.len(), original.len());
        assert_eq!(fresh[0], original[0]);
        for (fresh, original) in fresh[1..].iter().zip(&original[1..]) {
            assert_eq!(fresh.indoor_temperature(), 18.);
            assert!(fresh.heat_loss().global < original.heat_loss().global);
            assert!(fresh.cumulative_heat_loss() < original.cumulative_heat_loss());
        }
    }

    #[rstest]
    fn should_accumulate_energy_over_a_full_run() {
        let csv = temperature_csv(&[10.; 48]);
        let samples = temperature_data_to_vec(csv.as_bytes()).unwrap();
        // the initial snapshot already sees the constant outdoor temperature
        let constant_heat_loss = SimulationController::new(SimulationConfig::default(), samples)
            .unwrap()
            .history()
            .current()
            .heat_loss()
            .global;

        let summary = run_simulation(SimulationConfig::default(), csv.as_bytes(), SinkOutput)
            .unwrap();

        assert_eq!(summary.steps, 2);
        assert_eq!(summary.simulated_hours, 48.);
        assert_relative_eq!(
            summary.cumulative_heat_loss,
            constant_heat_loss * 48. / 1000.,
            max_relative = 1e-9
        );
        assert_eq!(
            summary.electricity_cost,
            (summary.cumulative_heat_loss * 0.25).round()
        );
        assert_eq!(summary.final_heat_loss.unit, PowerUnit::KiloWatt);
    }

    #[rstest]
    fn should_lose_less_heat_through_series_layers() {
        let mut insulated = SimulationConfig::default();
        for component in insulated
            .components
            .iter_mut()
            .filter(|component| component.component_type == ComponentType::Wall)
        {
            component.insulation = Some("brick and mineral wool".to_string());
        }
        let csv = temperature_csv(&[0.; 24]);

        let independent = run_simulation(insulated.clone(), csv.as_bytes(), SinkOutput).unwrap();
        let series = run_simulation(
            SimulationConfig {
                layer_topology: LayerTopology::Series,
                ..insulated
            },
            csv.as_bytes(),
            SinkOutput,
        )
        .unwrap();

        assert!(series.cumulative_heat_loss < independent.cumulative_heat_loss);
    }

    #[rstest]
    fn should_count_added_insulation_layers_independently() {
        let samples = temperature_data_to_vec(temperature_csv(&[0.; 24]).as_bytes()).unwrap();
        let controller = SimulationController::new(SimulationConfig::default(), samples).unwrap();
        let before = controller.current_heat_loss().per_component["wall1"];

        controller
            .change_component_insulation(ComponentType::Wall, "brick and mineral wool")
            .unwrap();
        controller.run_to_end().unwrap();

        let after = controller.current_heat_loss().per_component["wall1"];
        assert!(after > before);
    }

    #[rstest]
    fn should_fail_run_on_malformed_input() {
        let csv = "time,temperature\n2024-01-01T00:00:00Z,cold\n";
        assert!(run_simulation(SimulationConfig::default(), csv.as_bytes(), SinkOutput).is_err());
    }
}
