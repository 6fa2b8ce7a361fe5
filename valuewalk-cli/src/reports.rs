use std::io::Write;

use anyhow::Result;
use colored::Colorize;
use valuewalk_engine::{SimulationReport, StateReport, VALUE_DISPLAY_DIGITS, format_significant};

const SECTION_RULE_WIDTH: usize = 25;

pub fn generate_console_report(writer: &mut dyn Write, report: &SimulationReport) -> Result<()> {
    writeln!(writer)?;
    writeln!(
        writer,
        "{}",
        format!("📊 Scenario: {}", report.scenario).bright_cyan().bold()
    )?;
    writeln!(writer, "{}", "==============================".cyan())?;

    writeln!(
        writer,
        "Baseline expected payoff = {:?}",
        report.baseline.mean
    )?;
    writeln!(
        writer,
        "   range [{:?}, {:?}], {:.2} steps per walk",
        report.baseline.min, report.baseline.max, report.baseline.mean_steps
    )?;
    writeln!(writer)?;

    writeln!(
        writer,
        "N_EPISODES={}, LEARNING_RATE={:?}, START_STATE=\"{}\", STEP_COST={:?}, SEED={}",
        report.config.episodes,
        report.config.learning_rate,
        report.start,
        report.config.cost_per_step,
        report.seed
    )?;
    writeln!(
        writer,
        "[state_id: state_name] = value (terminal states indicated with >)"
    )?;

    write_section(writer, "TERMINAL STATES", report.terminal_states())?;
    write_section(writer, "NON-TERMINAL STATES", report.decision_states())?;

    writeln!(writer)?;
    writeln!(writer, "{}", "⚡ Episode Summary".bright_yellow().bold())?;
    writeln!(writer, "{}", "==================".yellow())?;
    writeln!(writer, "Episodes: {}", report.monte_carlo.episodes)?;
    writeln!(
        writer,
        "Mean payoff: {}",
        format_significant(report.monte_carlo.mean_payoff, VALUE_DISPLAY_DIGITS)
    )?;
    writeln!(
        writer,
        "Payoff range: [{}, {}]",
        format_significant(report.monte_carlo.min_payoff, VALUE_DISPLAY_DIGITS),
        format_significant(report.monte_carlo.max_payoff, VALUE_DISPLAY_DIGITS)
    )?;
    writeln!(writer, "Total steps: {}", report.monte_carlo.total_steps)?;
    writeln!(
        writer,
        "Random draws: baseline {}, episodes {}",
        report.draws.baseline, report.draws.episodes
    )?;
    Ok(())
}

fn write_section<'a>(
    writer: &mut dyn Write,
    title: &str,
    states: impl Iterator<Item = &'a StateReport>,
) -> Result<()> {
    writeln!(writer, "{} {title}", "*".repeat(SECTION_RULE_WIDTH))?;
    for state in states {
        let value = format_significant(state.value, VALUE_DISPLAY_DIGITS);
        if state.visits == 0 {
            writeln!(writer, "[{}] = {}", state.name, value.dimmed())?;
        } else {
            writeln!(writer, "[{}] = {value}", state.name)?;
        }
    }
    Ok(())
}

pub fn generate_json_report(writer: &mut dyn Write, report: &SimulationReport) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(writer, "{json_output}")?;
    Ok(())
}
