mod test_simulation_scenarios;
