//! Built-in scenarios selectable with `--scenario`.

use valuewalk_engine::{Choice, GraphBuilder, GraphError, ScenarioSpec};

/// A named scenario constructor.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub key: &'static str,
    pub description: &'static str,
    build: fn() -> Result<ScenarioSpec, GraphError>,
}

impl CatalogEntry {
    /// Construct and validate the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario graph is malformed.
    pub fn build(&self) -> Result<ScenarioSpec, GraphError> {
        (self.build)()
    }
}

static CATALOG: [CatalogEntry; 2] = [
    CatalogEntry {
        key: "ransomware",
        description: "Ransomware incident response tree (revenue 1000)",
        build: ransomware,
    },
    CatalogEntry {
        key: "coin-flip",
        description: "Actor picks between a -5 and a +10 terminal",
        build: coin_flip,
    },
];

pub const DEFAULT_SCENARIO: &str = "ransomware";

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    CATALOG.iter().map(|entry| (entry.key, entry.description))
}

pub fn find_scenario(key: &str) -> Option<&'static CatalogEntry> {
    CATALOG
        .iter()
        .find(|entry| entry.key.eq_ignore_ascii_case(key.trim()))
}

fn coin_flip() -> Result<ScenarioSpec, GraphError> {
    let mut builder = GraphBuilder::new();
    let a_low = builder.terminal("B", -5.0);
    let a_high = builder.terminal("C", 10.0);
    let start = builder.decision_with("A", 0.0, [Choice::new(a_low), Choice::new(a_high)]);
    let graph = builder.build()?;
    Ok(ScenarioSpec::from_graph("coin-flip", &graph, start))
}

/// Cost schedule of the incident response tree, derived from annual revenue.
#[derive(Debug, Clone, Copy)]
struct IncidentCosts {
    attack: f64,
    attack_after_investigation: f64,
    disagree: f64,
    expose_data_collaborate: f64,
    expose_data_not_collaborate: f64,
    kill_service: f64,
    launch_investigation: f64,
    not_pay: f64,
    not_preparing: f64,
    pay_25: f64,
    pay_50: f64,
    pay_75: f64,
    pay_full: f64,
    preparing: f64,
    replace_hardware: f64,
    wait: f64,
}

impl IncidentCosts {
    fn for_revenue(revenue: f64) -> Self {
        let ransom = revenue * 0.03;
        Self {
            attack: -revenue * 0.005,
            attack_after_investigation: -revenue * 0.001,
            disagree: -revenue * 0.002,
            expose_data_collaborate: -revenue * 0.006,
            expose_data_not_collaborate: -revenue * 0.008,
            kill_service: -revenue * 0.02,
            launch_investigation: -revenue * 0.01,
            not_pay: -revenue * 0.03,
            not_preparing: -revenue * 0.025,
            pay_25: -ransom * 0.25,
            pay_50: -ransom * 0.50,
            pay_75: -ransom * 0.75,
            pay_full: -revenue * 0.03,
            preparing: -revenue * 0.015,
            replace_hardware: -revenue * 0.05,
            wait: -revenue * 0.008,
        }
    }
}

// States are registered leaves-first so that report order follows the
// numbering from d39 down to d0.
#[allow(clippy::too_many_lines)]
fn ransomware() -> Result<ScenarioSpec, GraphError> {
    let cost = IncidentCosts::for_revenue(1000.0);
    let mut g = GraphBuilder::new();

    let d39 = g.terminal("d39: pay 75%", cost.pay_75);
    let d38 = g.terminal("d38: pay 50%", cost.pay_50);
    let d37 = g.decision_with("d37: ask 75%", 0.0, [Choice::new(d39)]);
    let d36 = g.decision_with("d36: ask 50%", 0.0, [Choice::new(d38)]);
    let d35 = g.decision_with(
        "d35: negotiate",
        0.0,
        [Choice::weighted(d36, 0.60), Choice::weighted(d37, 0.40)],
    );
    let d34 = g.terminal("d34: pay full amount", cost.pay_full);
    let d33 = g.terminal("d33: kill service", cost.kill_service);
    let d32 = g.terminal("d32: pay 75%", cost.pay_75);
    let d31 = g.terminal("d31: pay 50%", cost.pay_50);
    let d30 = g.terminal("d30: pay 50%", cost.pay_50);
    let d29 = g.terminal("d29: pay 25%", cost.pay_25);
    let d28 = g.terminal("d28: pay 75%", cost.pay_75);
    let d27 = g.terminal("d27: pay 50%", cost.pay_50);
    let d26 = g.decision_with(
        "d26: expose sensitive data not expecting negotiation",
        cost.expose_data_not_collaborate,
        [Choice::new(d33), Choice::new(d34), Choice::new(d35)],
    );
    let d25 = g.decision_with("d25: negotiate", 0.0, [Choice::new(d31), Choice::new(d32)]);
    let d24 = g.decision_with("d24: negotiate", 0.0, [Choice::new(d29), Choice::new(d30)]);
    let d23 = g.terminal("d23: lost control", 0.0);
    let d22 = g.decision_with("d22: ask 75%", 0.0, [Choice::new(d28)]);
    let d21 = g.decision_with("d21: ask 50%", 0.0, [Choice::new(d27)]);
    let d20 = g.terminal("d20: prepare", cost.preparing);
    let d19 = g.terminal("d19: not prepare", cost.not_preparing);
    let d18 = g.decision_with(
        "d18: disagree",
        cost.disagree,
        [Choice::weighted(d25, 0.30), Choice::weighted(d26, 0.70)],
    );
    let d17 = g.terminal("d17: pay full amount", cost.pay_full);
    let d16 = g.decision_with(
        "d16: wait",
        cost.wait,
        [Choice::weighted(d23, 0.10), Choice::weighted(d24, 0.90)],
    );
    let d15 = g.decision_with(
        "d15: negotiate",
        0.0,
        [Choice::weighted(d21, 0.25), Choice::weighted(d22, 0.75)],
    );
    let d14 = g.terminal("d14: pay full amount", cost.pay_full);
    let d13 = g.terminal("d13: kill service", cost.kill_service);
    let d12 = g.terminal("d12: pay 75%", cost.pay_75);
    let d11 = g.terminal("d11: pay 50%", cost.pay_50);
    let d10 = g.decision_with(
        "d10: not attacked",
        0.0,
        [Choice::new(d19), Choice::new(d20)],
    );
    let d9 = g.decision_with(
        "d9: attacked",
        cost.attack_after_investigation,
        [Choice::new(d16), Choice::new(d17), Choice::new(d18)],
    );
    let d8 = g.decision_with(
        "d8: expose sensitive data expecting negotiation",
        cost.expose_data_collaborate,
        [Choice::new(d13), Choice::new(d14), Choice::new(d15)],
    );
    let d7 = g.decision_with("d7: negotiate", 0.0, [Choice::new(d11), Choice::new(d12)]);
    let d6 = g.decision_with(
        "d6: launch investigation",
        cost.launch_investigation,
        [Choice::weighted(d9, 0.55), Choice::weighted(d10, 0.45)],
    );
    let d5 = g.terminal("d5: replace hardware", cost.replace_hardware);
    let d4 = g.terminal("d4: pay full amount", cost.pay_full);
    let d3 = g.decision_with(
        "d3: not pay",
        cost.not_pay,
        [Choice::weighted(d7, 0.3), Choice::weighted(d8, 0.7)],
    );
    let d2 = g.decision_with(
        "d2: attack did not happen",
        0.0,
        [Choice::new(d5), Choice::new(d6)],
    );
    let d1 = g.decision_with(
        "d1: attack happened",
        cost.attack,
        [Choice::new(d3), Choice::new(d4)],
    );
    let d0 = g.decision_with(
        "d0: vulnerability found",
        0.0,
        [Choice::weighted(d1, 0.8), Choice::weighted(d2, 0.2)],
    );

    let graph = g.build()?;
    let mut spec = ScenarioSpec::from_graph("ransomware", &graph, d0);
    spec.description = String::from(
        "Defender decisions after a vulnerability is found; attacker and \
         environment moves carry explicit probabilities.",
    );
    Ok(spec)
}
