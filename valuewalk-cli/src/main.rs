mod catalog;
mod loader;
mod reports;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use catalog::{DEFAULT_SCENARIO, list_scenarios};
use loader::ScenarioSource;
use valuewalk_engine::{GraphLoader, SimulationConfig, SimulationEngine};

#[derive(Debug, Parser)]
#[command(name = "valuewalk", version)]
#[command(
    about = "Estimate expected payoffs of a weighted decision graph with baseline walks and Monte Carlo value learning"
)]
struct Args {
    /// Built-in scenario to simulate
    #[arg(long, default_value = DEFAULT_SCENARIO)]
    scenario: String,

    /// Load the scenario graph from a JSON file instead of the catalog
    #[arg(long)]
    scenario_file: Option<PathBuf>,

    /// List all built-in scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Write the selected scenario as JSON and exit
    #[arg(long)]
    dump_scenario: bool,

    /// JSON file with simulation parameters; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of baseline walks and of Monte Carlo episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Constant step size of the value update, in (0, 1]
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Payoff charged per transition (zero or negative)
    #[arg(long, allow_hyphen_values = true)]
    step_cost: Option<f64>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Abort walks that exceed this many steps
    #[arg(long)]
    max_steps: Option<u64>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    let source = scenario_source(&args);
    if maybe_dump_scenario(&args, &source)? {
        return Ok(());
    }

    if args.report == "console" && args.output.is_none() {
        announce_banner();
    }

    let config = resolve_config(&args)?;
    let start_time = Instant::now();
    let engine = SimulationEngine::new(source);
    let mut session = engine.create_session(config)?;
    let report = session
        .run()
        .with_context(|| format!("simulation of '{}' failed", session.name()))?;
    log::info!(
        "finished '{}' in {:?} (seed {})",
        report.scenario,
        start_time.elapsed(),
        report.seed
    );

    write_report(&args, &report)
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn maybe_dump_scenario(args: &Args, source: &ScenarioSource) -> Result<bool> {
    if !args.dump_scenario {
        return Ok(false);
    }
    let spec = source.load_scenario()?;
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "{}", spec.to_json_pretty()?)?;
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎲 Valuewalk Simulator".bright_cyan().bold());
    println!("{}", "======================".cyan());
}

fn scenario_source(args: &Args) -> ScenarioSource {
    args.scenario_file.as_ref().map_or_else(
        || ScenarioSource::Builtin(args.scenario.clone()),
        |path| ScenarioSource::File(path.clone()),
    )
}

fn resolve_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = if let Some(path) = &args.config {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        SimulationConfig::from_json(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?
    } else {
        SimulationConfig::default()
    };

    if let Some(episodes) = args.episodes {
        config.episodes = episodes;
    }
    if let Some(learning_rate) = args.learning_rate {
        config.learning_rate = learning_rate;
    }
    if let Some(step_cost) = args.step_cost {
        config.cost_per_step = step_cost;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.max_steps.is_some() {
        config.max_steps = args.max_steps;
    }

    config.validate().context("invalid simulation parameters")?;
    Ok(config)
}

fn write_report(args: &Args, report: &valuewalk_engine::SimulationReport) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut output_target, report)?,
        _ => reports::generate_console_report(&mut output_target, report)?,
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            scenario: "coin-flip".to_string(),
            scenario_file: None,
            list_scenarios: false,
            dump_scenario: false,
            config: None,
            episodes: Some(25),
            learning_rate: None,
            step_cost: None,
            seed: Some(1337),
            max_steps: None,
            report: "json".to_string(),
            verbose: false,
            output: None,
        }
    }

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(name)
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let temp = temp_file("valuewalk-scenarios.txt");
        let args = Args {
            list_scenarios: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Available scenarios"));
        assert!(content.contains("ransomware"));
    }

    #[test]
    fn maybe_list_scenarios_returns_false_when_disabled() {
        assert!(!maybe_list_scenarios(&base_args()).unwrap());
    }

    #[test]
    fn dumped_scenario_parses_back() {
        let temp = temp_file("valuewalk-dump.json");
        let args = Args {
            dump_scenario: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        let source = scenario_source(&args);
        assert!(maybe_dump_scenario(&args, &source).unwrap());
        let content = std::fs::read_to_string(temp).unwrap();
        let spec = valuewalk_engine::ScenarioSpec::from_json(&content).unwrap();
        assert_eq!(spec.name, "coin-flip");
        assert_eq!(spec.states.len(), 3);
    }

    #[test]
    fn scenario_file_takes_precedence() {
        let args = Args {
            scenario_file: Some(PathBuf::from("graph.json")),
            ..base_args()
        };
        assert_eq!(
            scenario_source(&args),
            ScenarioSource::File(PathBuf::from("graph.json"))
        );
        assert_eq!(
            scenario_source(&base_args()),
            ScenarioSource::Builtin("coin-flip".to_string())
        );
    }

    #[test]
    fn flags_override_config_file() {
        let temp = temp_file("valuewalk-config.json");
        std::fs::write(
            &temp,
            r#"{ "episodes": 400, "learning_rate": 0.5, "cost_per_step": -2.0, "seed": 9 }"#,
        )
        .unwrap();
        let args = Args {
            config: Some(temp),
            step_cost: Some(-0.5),
            ..base_args()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.episodes, 25);
        assert!((config.learning_rate - 0.5).abs() < f64::EPSILON);
        assert!((config.cost_per_step + 0.5).abs() < f64::EPSILON);
        assert_eq!(config.seed, Some(1337));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let args = Args {
            learning_rate: Some(1.5),
            ..base_args()
        };
        let err = resolve_config(&args).unwrap_err();
        assert!(format!("{err:#}").contains("learning rate"));

        let args = Args {
            step_cost: Some(2.0),
            ..base_args()
        };
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn write_report_emits_json() {
        let temp = temp_file("valuewalk-report.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        let config = resolve_config(&args).unwrap();
        let mut session = SimulationEngine::new(scenario_source(&args))
            .create_session(config)
            .unwrap();
        let report = session.run().unwrap();
        write_report(&args, &report).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("\"scenario\": \"coin-flip\""));
        assert!(content.contains("\"seed\": 1337"));
    }

    #[test]
    fn write_report_emits_console() {
        let temp = temp_file("valuewalk-report.txt");
        let args = Args {
            report: "console".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        let config = resolve_config(&args).unwrap();
        let mut session = SimulationEngine::new(scenario_source(&args))
            .create_session(config)
            .unwrap();
        let report = session.run().unwrap();
        write_report(&args, &report).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Baseline expected payoff = 9.0"));
        assert!(content.contains("NON-TERMINAL STATES"));
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
