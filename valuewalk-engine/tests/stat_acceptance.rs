use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_chacha::ChaCha20Rng;
use valuewalk_engine::{
    Choice, GraphBuilder, MonteCarloEstimator, SimulationConfig, SimulationSession, WalkLimits,
    choose_weighted, run_baseline, run_episode,
};

const SAMPLE_SIZE: usize = 20_000;
// Chi-square critical value for 3 degrees of freedom at the 99.9% level.
const CHI_SQUARE_CRITICAL_DF3: f64 = 16.266;

fn as_f64(count: usize) -> f64 {
    f64::from(u32::try_from(count).expect("count fits u32"))
}

#[test]
fn weighted_draw_matches_weight_shares() {
    let mut builder = GraphBuilder::new();
    let targets: Vec<_> = (0..4)
        .map(|idx| builder.terminal(format!("t{idx}"), 0.0))
        .collect();
    let start = builder.decision_with(
        "start",
        0.0,
        targets
            .iter()
            .zip([1.0, 2.0, 3.0, 4.0])
            .map(|(to, weight)| Choice::weighted(*to, weight)),
    );
    let graph = builder.build().expect("valid graph");
    let choices = graph.state(start).expect("start exists").choices();

    let mut rng = SmallRng::seed_from_u64(0xACED);
    let mut observed = [0usize; 4];
    for _ in 0..SAMPLE_SIZE {
        let idx = choose_weighted(choices, &mut rng).expect("positive weights");
        observed[idx] += 1;
    }

    let total = as_f64(SAMPLE_SIZE);
    let chi_square: f64 = observed
        .iter()
        .zip([0.1, 0.2, 0.3, 0.4])
        .map(|(count, share)| {
            let expected = total * share;
            let diff = as_f64(*count) - expected;
            diff * diff / expected
        })
        .sum();
    assert!(
        chi_square < CHI_SQUARE_CRITICAL_DF3,
        "chi-square {chi_square:.3} for counts {observed:?}"
    );
}

#[test]
fn payoff_is_sum_of_entries_plus_step_cost() {
    let mut builder = GraphBuilder::new();
    let d = builder.terminal("D", -0.75);
    let c = builder.decision_with("C", 2.5, [Choice::new(d)]);
    let b = builder.decision_with("B", 1.25, [Choice::new(c)]);
    let a = builder.decision_with("A", 100.0, [Choice::new(b)]);
    let graph = builder.build().expect("valid graph");
    let limits = WalkLimits::new(-0.3);
    let mut rng = ChaCha20Rng::seed_from_u64(1);

    let baseline = run_baseline(&graph, a, limits, &mut rng).expect("terminates");
    let episode = run_episode(&graph, a, limits, &mut rng).expect("terminates");
    let expected = 1.25 + 2.5 - 0.75 - 0.3 * 3.0;
    assert_eq!(baseline.steps, 3);
    assert!((baseline.payoff - expected).abs() < 1e-12);
    assert!((episode.payoff - expected).abs() < 1e-12);
    assert_eq!(episode.visited.len(), 4);
}

#[test]
fn chain_value_error_shrinks_with_more_episodes() {
    let mut builder = GraphBuilder::new();
    let end = builder.terminal("end", 12.0);
    let start = builder.decision_with("start", 0.0, [Choice::new(end)]);
    let graph = builder.build().expect("valid graph");
    let target = 12.0 - 1.0;

    let mut errors = Vec::new();
    for episodes in [10, 50, 200] {
        let config = SimulationConfig {
            episodes,
            learning_rate: 0.05,
            cost_per_step: -1.0,
            ..SimulationConfig::default()
        };
        let mut estimator = MonteCarloEstimator::new(&graph, &config).expect("valid config");
        let mut rng = SmallRng::seed_from_u64(7);
        estimator.run(&graph, start, &mut rng).expect("terminates");
        errors.push((estimator.values().value(start) - target).abs());
    }
    assert!(errors[0] > errors[1] && errors[1] > errors[2], "{errors:?}");
    assert!(errors[2] < 0.01);
}

#[test]
fn coin_flip_end_to_end() {
    let mut builder = GraphBuilder::new();
    let b = builder.terminal("B", -5.0);
    let c = builder.terminal("C", 10.0);
    let a = builder.decision_with("A", 0.0, [Choice::new(b), Choice::new(c)]);
    let graph = builder.build().expect("valid graph");
    let config = SimulationConfig {
        episodes: 20_000,
        learning_rate: 0.001,
        cost_per_step: -1.0,
        seed: Some(0x5EED),
        max_steps: None,
    };

    let mut session = SimulationSession::new("coin-flip", graph, a, config).expect("session");
    let report = session.run().expect("run completes");

    assert!((report.baseline.mean - 9.0).abs() < 1e-12);
    assert!((report.baseline.min - 9.0).abs() < 1e-12);
    assert!((report.baseline.max - 9.0).abs() < 1e-12);

    let a_value = report.state("A").expect("A reported").value;
    assert!((a_value - 1.5).abs() < 0.75, "A converged to {a_value}");
    let b_value = report.state("B").expect("B reported").value;
    let c_value = report.state("C").expect("C reported").value;
    assert!((b_value + 6.0).abs() < 0.05, "B converged to {b_value}");
    assert!((c_value - 9.0).abs() < 0.05, "C converged to {c_value}");

    let b_visits = report.state("B").expect("B reported").visits;
    let c_visits = report.state("C").expect("C reported").visits;
    assert_eq!(b_visits + c_visits, 20_000);
    let b_share = f64::from(u32::try_from(b_visits).expect("count fits u32")) / 20_000.0;
    assert!((b_share - 0.5).abs() < 0.03);
}
