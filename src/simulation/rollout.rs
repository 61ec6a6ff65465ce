//! A single stochastic rollout.
//!
//! A rollout owns its generator, so it can be paused at one time budget
//! and resumed later with exactly the draws a fresh run would have made.

use rand::Rng;
use rand_chacha::ChaCha20Rng;

use super::model::{SeedChoice, SpreadModel};
use crate::error::{HoneypotError, Result};
use crate::graph::IndexedGraph;

/// Why a rollout stopped advancing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloutState {
    Running,
    /// Infected count reached the target
    ReachedTarget,
    /// A step passed without a new infection
    Quiescent,
}

/// Pick the initial infected vertex
pub fn select_seed(graph: &IndexedGraph, choice: SeedChoice, rng: &mut ChaCha20Rng) -> Result<usize> {
    if graph.is_empty() {
        return Err(HoneypotError::Input(
            "cannot select a seed vertex in an empty graph".to_string(),
        ));
    }
    match choice {
        SeedChoice::Random => Ok(rng.gen_range(0..graph.len())),
        SeedChoice::Fixed(v) => graph.index_of(v).ok_or_else(|| {
            HoneypotError::Input(format!("seed vertex {} is not in the graph", v))
        }),
    }
}

/// Number of infected vertices that ends a rollout early
pub fn target_count(vertices: usize, target_fraction: f64) -> usize {
    ((target_fraction * vertices as f64).ceil() as usize).clamp(1, vertices.max(1))
}

#[derive(Debug, Clone)]
pub struct Rollout {
    model: SpreadModel,
    transmissibility: f64,
    target: usize,
    infected: Vec<bool>,
    infected_order: Vec<usize>,
    frontier: Vec<usize>,
    seed_vertex: usize,
    steps: usize,
    state: RolloutState,
    rng: ChaCha20Rng,
}

impl Rollout {
    pub fn start(
        graph: &IndexedGraph,
        model: SpreadModel,
        transmissibility: f64,
        target_fraction: f64,
        seed: SeedChoice,
        mut rng: ChaCha20Rng,
    ) -> Result<Self> {
        let seed_vertex = select_seed(graph, seed, &mut rng)?;
        let mut infected = vec![false; graph.len()];
        infected[seed_vertex] = true;

        let mut rollout = Self {
            model,
            transmissibility,
            target: target_count(graph.len(), target_fraction),
            infected,
            infected_order: vec![seed_vertex],
            frontier: vec![seed_vertex],
            seed_vertex,
            steps: 0,
            state: RolloutState::Running,
            rng,
        };
        rollout.update_state(true);
        Ok(rollout)
    }

    pub fn infected(&self) -> &[bool] {
        &self.infected
    }

    pub fn infected_count(&self) -> usize {
        self.infected_order.len()
    }

    pub fn seed_vertex(&self) -> usize {
        self.seed_vertex
    }

    /// Steps actually simulated so far
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn state(&self) -> RolloutState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state != RolloutState::Running
    }

    /// Steps needed to reach the target, if it was reached
    pub fn time_to_target(&self) -> Option<usize> {
        (self.state == RolloutState::ReachedTarget).then_some(self.steps)
    }

    /// Simulate until `budget` total steps have elapsed or the rollout stops
    pub fn advance(&mut self, graph: &IndexedGraph, budget: usize) {
        while self.state == RolloutState::Running && self.steps < budget {
            let newly = match self.model {
                SpreadModel::SingleAttempt => {
                    let sources = std::mem::take(&mut self.frontier);
                    self.attempt_from(graph, &sources)
                }
                SpreadModel::RepeatedAttempt => {
                    let sources = self.infected_order.clone();
                    self.attempt_from(graph, &sources)
                }
                SpreadModel::NeighborThreshold => self.threshold_draws(graph),
            };
            self.steps += 1;

            for &v in &newly {
                self.infected[v] = true;
            }
            self.infected_order.extend_from_slice(&newly);
            let progressed = !newly.is_empty();
            self.frontier = newly;
            self.update_state(progressed);
        }
    }

    /// Per-edge attempts from `sources` to their susceptible neighbours
    fn attempt_from(&mut self, graph: &IndexedGraph, sources: &[usize]) -> Vec<usize> {
        let mut pending = vec![false; self.infected.len()];
        let mut newly = Vec::new();
        for &v in sources {
            for &u in graph.neighbors(v) {
                if self.infected[u] || pending[u] {
                    continue;
                }
                if self.rng.gen_bool(self.transmissibility) {
                    pending[u] = true;
                    newly.push(u);
                }
            }
        }
        newly
    }

    /// One draw per susceptible vertex that touches the infection
    fn threshold_draws(&mut self, graph: &IndexedGraph) -> Vec<usize> {
        self.boundary(graph)
            .into_iter()
            .filter(|_| self.rng.gen_bool(self.transmissibility))
            .collect()
    }

    /// Susceptible vertices adjacent to an infected one, ascending
    fn boundary(&self, graph: &IndexedGraph) -> Vec<usize> {
        let mut seen = vec![false; self.infected.len()];
        for &v in &self.infected_order {
            for &u in graph.neighbors(v) {
                if !self.infected[u] {
                    seen[u] = true;
                }
            }
        }
        seen.iter()
            .enumerate()
            .filter_map(|(i, &s)| s.then_some(i))
            .collect()
    }

    fn update_state(&mut self, progressed: bool) {
        if self.infected_count() >= self.target {
            self.state = RolloutState::ReachedTarget;
        } else if !progressed {
            self.state = RolloutState::Quiescent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::generators;
    use crate::simulation::rng::StreamSeed;

    fn run(
        graph: &IndexedGraph,
        model: SpreadModel,
        p: f64,
        target: f64,
        seed: SeedChoice,
        budget: usize,
        run: u64,
    ) -> Rollout {
        let rng = StreamSeed::new(5).rollout_rng(run);
        let mut r = Rollout::start(graph, model, p, target, seed, rng).unwrap();
        r.advance(graph, budget);
        r
    }

    #[test]
    fn test_zero_transmissibility_only_seed_infected() {
        let g = generators::complete(6).indexed();
        for model in SpreadModel::ALL {
            let r = run(&g, model, 0.0, 1.0, SeedChoice::Random, 20, 1);
            assert_eq!(r.infected_count(), 1, "{}", model);
            assert!(r.infected()[r.seed_vertex()]);
        }
    }

    #[test]
    fn test_single_attempt_stalls_after_one_step_at_zero() {
        let g = generators::complete(4).indexed();
        let r = run(&g, SpreadModel::SingleAttempt, 0.0, 1.0, SeedChoice::Fixed(0), 50, 0);
        assert_eq!(r.state(), RolloutState::Quiescent);
        assert_eq!(r.steps(), 1);
    }

    #[test]
    fn test_repeated_attempt_certain_spread_follows_distance() {
        let graph = generators::circulant(20, &[1]).unwrap();
        let g = graph.indexed();
        let r = run(&g, SpreadModel::RepeatedAttempt, 1.0, 1.0, SeedChoice::Fixed(0), 3, 0);

        let dist = graph.shortest_path_lengths(0).unwrap();
        for (i, &infected) in r.infected().iter().enumerate() {
            assert_eq!(infected, dist[&g.id(i)] <= 3, "vertex {}", g.id(i));
        }
        assert_eq!(r.steps(), 3);
        assert_eq!(r.state(), RolloutState::Running);
    }

    #[test]
    fn test_target_stops_early() {
        let g = generators::complete(10).indexed();
        let r = run(&g, SpreadModel::RepeatedAttempt, 1.0, 0.5, SeedChoice::Fixed(3), 10, 0);
        assert_eq!(r.state(), RolloutState::ReachedTarget);
        assert_eq!(r.time_to_target(), Some(1));
        assert_eq!(r.infected_count(), 10);
    }

    #[test]
    fn test_resume_matches_uninterrupted_run() {
        let g = generators::circulant(30, &[1, 4]).unwrap().indexed();
        for model in SpreadModel::ALL {
            let whole = run(&g, model, 0.3, 1.0, SeedChoice::Random, 8, 2);

            let rng = StreamSeed::new(5).rollout_rng(2);
            let mut resumed = Rollout::start(&g, model, 0.3, 1.0, SeedChoice::Random, rng).unwrap();
            resumed.advance(&g, 3);
            resumed.advance(&g, 8);

            assert_eq!(whole.infected(), resumed.infected(), "{}", model);
            assert_eq!(whole.steps(), resumed.steps());
        }
    }

    #[test]
    fn test_seed_selection_errors() {
        let empty = crate::graph::Graph::new("empty").indexed();
        let mut rng = StreamSeed::new(1).rollout_rng(0);
        assert!(matches!(
            select_seed(&empty, SeedChoice::Random, &mut rng),
            Err(HoneypotError::Input(_))
        ));

        let g = generators::complete(3).indexed();
        assert!(matches!(
            select_seed(&g, SeedChoice::Fixed(9), &mut rng),
            Err(HoneypotError::Input(_))
        ));
    }

    #[test]
    fn test_target_count_rounds_up() {
        assert_eq!(target_count(10, 0.25), 3);
        assert_eq!(target_count(10, 1.0), 10);
        assert_eq!(target_count(10, 0.0), 1);
    }

    fn fraction_fully_infected(graph: &IndexedGraph, model: SpreadModel, p: f64, budget: usize, runs: u64) -> f64 {
        let full = (0..runs)
            .filter(|&i| {
                let r = run(graph, model, p, 1.0, SeedChoice::Fixed(0), budget, i);
                r.infected_count() == graph.len()
            })
            .count();
        full as f64 / runs as f64
    }

    #[test]
    fn test_repeated_attempt_stops_at_first_barren_step() {
        let g = generators::circulant(30, &[1]).unwrap().indexed();
        let mut stalled = 0;
        for i in 0..200 {
            let rng = StreamSeed::new(0).rollout_rng(i);
            let mut r = Rollout::start(&g, SpreadModel::RepeatedAttempt, 0.3, 1.0, SeedChoice::Fixed(0), rng).unwrap();
            while !r.is_finished() && r.steps() < 20 {
                let before = r.infected_count();
                r.advance(&g, r.steps() + 1);
                if r.infected_count() == before {
                    assert_eq!(r.state(), RolloutState::Quiescent, "run {} step {}", i, r.steps());
                    stalled += 1;
                }
            }
            if r.state() == RolloutState::Quiescent {
                // stepping further does nothing
                let steps = r.steps();
                r.advance(&g, 20);
                assert_eq!(r.steps(), steps);
            }
        }
        assert!(stalled > 0);
    }

    #[test]
    fn test_single_attempt_failed_edge_never_refires() {
        let g = generators::complete(2).indexed();
        for budget in [1, 50] {
            let full = fraction_fully_infected(&g, SpreadModel::SingleAttempt, 0.5, budget, 4000);
            assert!((full - 0.5).abs() < 0.05, "budget {}: {}", budget, full);
        }

        // path 1 - 0 - 2 seeded in the middle: a failed edge out of the
        // seed is retried only under repeated attempts
        let mut path = crate::graph::Graph::new("path");
        path.add_edge(0, 1);
        path.add_edge(0, 2);
        let g = path.indexed();
        let single = fraction_fully_infected(&g, SpreadModel::SingleAttempt, 0.5, 10, 4000);
        let repeated = fraction_fully_infected(&g, SpreadModel::RepeatedAttempt, 0.5, 10, 4000);
        assert!((single - 0.25).abs() < 0.05, "single attempt {}", single);
        assert!((repeated - 0.5).abs() < 0.05, "repeated attempt {}", repeated);
    }

    #[test]
    fn test_threshold_draw_ignores_infected_neighbour_count() {
        // seed 0 feeds hubs 1..=3, which all feed vertex 9
        let mut diamond = crate::graph::Graph::new("diamond");
        for middle in 1..=3 {
            diamond.add_edge(0, middle);
            diamond.add_edge(middle, 9);
        }
        let g = diamond.indexed();
        let sink = g.index_of(9).unwrap();
        let middles: Vec<usize> = (1..=3).map(|v| g.index_of(v).unwrap()).collect();

        let rate = |model: SpreadModel| {
            let (mut eligible, mut hit) = (0u32, 0u32);
            for i in 0..4000 {
                let rng = StreamSeed::new(9).rollout_rng(i);
                let mut r = Rollout::start(&g, model, 0.5, 1.0, SeedChoice::Fixed(0), rng).unwrap();
                r.advance(&g, 1);
                if !middles.iter().all(|&m| r.infected()[m]) {
                    continue;
                }
                eligible += 1;
                r.advance(&g, 2);
                if r.infected()[sink] {
                    hit += 1;
                }
            }
            hit as f64 / eligible as f64
        };

        // one draw at p versus three attempts at p
        let threshold = rate(SpreadModel::NeighborThreshold);
        let repeated = rate(SpreadModel::RepeatedAttempt);
        assert!((threshold - 0.5).abs() < 0.1, "threshold {}", threshold);
        assert!((repeated - 0.875).abs() < 0.1, "repeated {}", repeated);
    }
}
