#[cfg(test)]
mod pipeline_tests {
    use std::fs;
    use std::io::Write;

    use approx::assert_relative_eq;
    use tempfile::{NamedTempFile, TempDir};

    use honeypotsim::config_loader::load_config;
    use honeypotsim::experiment::run_experiment;
    use honeypotsim::graph::generators;
    use honeypotsim::optimize::{optimizer_for, CoverageMatrix, ExactOptions, Strategy};
    use honeypotsim::params::Parameters;
    use honeypotsim::simulation::{ScenarioGenerator, ScenarioSet, SpreadModel, StreamSeed};
    use honeypotsim::stats::Alpha;
    use honeypotsim::validation::{compare_paired, compare_solutions, estimate_sampling_error};

    fn complete_params(network: &str) -> Parameters {
        Parameters {
            network: network.to_string(),
            model: SpreadModel::RepeatedAttempt,
            honeypots: 1,
            repetitions: 100,
            target_fraction: 1.0,
            false_negative: 0.0,
            time_steps: 2,
            transmissibility: 1.0,
        }
    }

    /// A certain contagion on a complete graph reaches everyone, so any
    /// single honeypot detects every scenario and ties go to the smallest id
    #[test]
    fn test_complete_graph_every_strategy_picks_vertex_zero() {
        let graph = generators::complete(5);
        let params = complete_params(graph.name());
        let scenarios = ScenarioGenerator::new(&graph)
            .generate(&params, StreamSeed::new(11))
            .unwrap();
        let coverage = CoverageMatrix::from_scenarios(&scenarios).unwrap();

        for strategy in Strategy::ALL {
            let optimizer = optimizer_for(strategy, params.transmissibility, &ExactOptions::default());
            let solution = optimizer.optimize(&graph, &coverage, 1).unwrap();
            assert_eq!(solution.honeypots, vec![0], "{}", strategy);
            assert_relative_eq!(solution.objective, 1.0);
        }
    }

    #[test]
    fn test_held_out_validation_on_certain_spread() {
        let graph = generators::complete(5);
        let params = complete_params(graph.name());
        let generator = ScenarioGenerator::new(&graph);
        let training = CoverageMatrix::from_scenarios(&generator.generate(&params, StreamSeed::new(1)).unwrap()).unwrap();
        let held_out = CoverageMatrix::from_scenarios(&generator.generate(&params, StreamSeed::new(2)).unwrap()).unwrap();
        let alpha = Alpha::default();

        let greedy = optimizer_for(Strategy::MaxRowsGreedy, 1.0, &ExactOptions::default())
            .optimize(&graph, &training, 1)
            .unwrap();
        let degree = optimizer_for(Strategy::DegreeCentrality, 1.0, &ExactOptions::default())
            .optimize(&graph, &training, 1)
            .unwrap();

        let sampling = estimate_sampling_error(&greedy, &held_out, alpha).unwrap();
        assert_relative_eq!(sampling.estimate.point, 1.0);
        assert_relative_eq!(sampling.estimate.half_width, 0.0);

        // Identical selections never disagree
        let paired = compare_paired(&greedy, &degree, &held_out, alpha).unwrap();
        assert_eq!(paired.table.only_first + paired.table.only_second, 0);
        assert_relative_eq!(paired.difference.point, 0.0);
        assert!(paired.difference.contains(0.0));
        assert!(!paired.significant);

        let comparison = compare_solutions(&greedy, &degree, &held_out, alpha).unwrap();
        assert_eq!(comparison.semi_hamming, 0);
    }

    #[test]
    fn test_false_negatives_share_infections() {
        let graph = generators::circulant(12, &[1, 3]).unwrap();
        let mut params = complete_params(graph.name());
        params.transmissibility = 0.4;
        params.time_steps = 3;
        params.repetitions = 40;
        let generator = ScenarioGenerator::new(&graph);

        let exact = generator.generate(&params, StreamSeed::new(5)).unwrap();
        params.false_negative = 0.5;
        let noisy = generator.generate(&params, StreamSeed::new(5)).unwrap();

        assert_eq!(exact.infections(), noisy.infections());
        for (clean, faulty) in exact.detections().iter().zip(noisy.detections()) {
            for (&c, &f) in clean.iter().zip(faulty) {
                assert!(c || !f, "a missed detection cannot reappear");
            }
        }
    }

    #[test]
    fn test_scenario_persistence_round_trip() {
        let dir = TempDir::new().unwrap();
        let graph = generators::circulant(10, &[1]).unwrap();
        let mut params = complete_params(graph.name());
        params.transmissibility = 0.5;
        params.repetitions = 25;

        let set = ScenarioGenerator::new(&graph)
            .generate(&params, StreamSeed::new(3))
            .unwrap();
        let path = set.save_in(dir.path()).unwrap();
        assert_eq!(ScenarioSet::load(&path).unwrap(), set);
    }

    #[test]
    fn test_circulant_cleanup_and_largest_component() {
        let ring = generators::circulant(10, &[1]).unwrap();
        let mut chorded = ring.clone();
        chorded.add_edge(0, 5);
        assert_eq!(chorded.edge_count(), ring.edge_count() + 1);

        for graph in [&ring, &chorded] {
            assert!(!graph.has_self_loops());
        }

        chorded.add_vertex(42);
        assert_eq!(chorded.retain_largest_component(), 1);
        assert!(!chorded.contains(42));
        assert_eq!(chorded.vertex_count(), 10);
        assert_eq!(chorded.edge_count(), 11);
    }

    #[test]
    fn test_edge_list_network_is_cleaned() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("net.txt"), "# ring with noise\n0 1\n1 2\n2 0\n2 2\n7\n").unwrap();
        let mut config_file = NamedTempFile::new_in(dir.path()).unwrap();
        write!(
            config_file,
            r#"
general:
  name: "cleanup"
network:
  path: "net.txt"
sweep:
  models: [single_attempt]
  honeypots: [1]
  repetitions: [10]
  time_steps: [2]
  transmissibilities: [0.5]
"#
        )
        .unwrap();

        let config = load_config(config_file.path()).unwrap();
        let graph = config.network.build(dir.path()).unwrap();
        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert!(!graph.has_self_loops());
        assert!(!graph.contains(7));
    }

    fn write_experiment(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("experiment.yaml");
        fs::write(
            &path,
            r#"
general:
  name: "ring-sweep"
  seed: 17
  output_dir: "out"
network:
  generator: circulant
  vertices: 8
  offsets: [1]
sweep:
  models: [repeated_attempt]
  honeypots: [2, 20]
  repetitions: [30]
  time_steps: [3]
  transmissibilities: [0.5]
optimization:
  strategies: [degree_centrality, max_rows_greedy, exact]
  exact:
    budget:
      time_limit: "30s"
validation:
  held_out_repetitions: 200
  gap_replications: 2
"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn test_experiment_writes_every_table() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&write_experiment(&dir)).unwrap();

        let summary = run_experiment(&config, dir.path()).unwrap();
        assert_eq!(summary.completed, 1);
        // Twenty honeypots do not fit on eight vertices
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].1.stage, "configure");
        assert_eq!(summary.best.len(), 1);
        assert_eq!(summary.network.vertices, 8);

        let out = dir.path().join("out");
        for table in [
            "networks.csv",
            "solutions.csv",
            "sampling_error.csv",
            "paired_comparisons.csv",
            "solution_comparisons.csv",
            "overfitting_gaps.csv",
            "failures.csv",
            "summary.json",
        ] {
            assert!(out.join(table).exists(), "{} missing", table);
        }

        let solutions = fs::read_to_string(out.join("solutions.csv")).unwrap();
        assert_eq!(solutions.lines().count(), 1 + 3);
        let paired = fs::read_to_string(out.join("paired_comparisons.csv")).unwrap();
        assert_eq!(paired.lines().count(), 1 + 3);
    }

    #[test]
    fn test_experiment_is_reproducible_and_appends() {
        let dir = TempDir::new().unwrap();
        let mut config = load_config(&write_experiment(&dir)).unwrap();
        config.validation.gap_replications = 0;

        let first = run_experiment(&config, dir.path()).unwrap();
        config.general.append = true;
        let second = run_experiment(&config, dir.path()).unwrap();

        assert_eq!(first.best[0].strategy, second.best[0].strategy);
        assert_relative_eq!(first.best[0].held_out, second.best[0].held_out);

        let solutions = fs::read_to_string(dir.path().join("out/solutions.csv")).unwrap();
        let headers = solutions.lines().filter(|l| l.starts_with("network,")).count();
        assert_eq!(headers, 1);
        assert_eq!(solutions.lines().count(), 1 + 2 * 3);
        assert!(!dir.path().join("out/overfitting_gaps.csv").exists());
    }
}
