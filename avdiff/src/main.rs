#![forbid(unsafe_code)]

mod config;

use std::fs;
use std::path::{Path, PathBuf};

use avdiff_core::Space;
use avdiff_scene::{Preset, Scenario};
use avdiff_verify::{ActionMode, Backend, SolverConfig, Verdict, Verifier};
use clap::Parser;
use miette::{Diagnostic, IntoDiagnostic, NamedSource};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "avdiff",
    version,
    about = "Differential verifier for autonomous-vehicle decision policies"
)]
struct Cli {
    /// Code-policy DSL files (comma separated). Each is compiled into the code space.
    #[arg(long, value_delimiter = ',', required = true)]
    code: Vec<PathBuf>,

    /// User property DSL file.
    #[arg(long)]
    spec: PathBuf,

    /// Where the decoded counterexample is written as JSON.
    #[arg(long)]
    output: PathBuf,

    /// Overrides `[run] action`.
    #[arg(long, value_enum)]
    action: Option<ActionArg>,

    /// Overrides `[run] scenario`.
    #[arg(long, value_enum)]
    scenario: Option<ScenarioArg>,

    /// Config file (defaults to `./avdiff.toml` when present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides `[solver] timeout_ms`.
    #[arg(long)]
    timeout_ms: Option<u32>,

    /// Print the SMT-LIB2 query to stdout before solving.
    #[arg(long)]
    dump_query: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ActionArg {
    FlagOff,
    FlagOn,
}

impl From<ActionArg> for ActionMode {
    fn from(v: ActionArg) -> Self {
        match v {
            ActionArg::FlagOff => ActionMode::FlagOff,
            ActionArg::FlagOn => ActionMode::FlagOn,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ScenarioArg {
    Crosswalk,
    Intersection,
    TrafficLight,
    StopSign,
    Full,
}

impl From<ScenarioArg> for Preset {
    fn from(v: ScenarioArg) -> Self {
        match v {
            ScenarioArg::Crosswalk => Preset::Crosswalk,
            ScenarioArg::Intersection => Preset::Intersection,
            ScenarioArg::TrafficLight => Preset::TrafficLight,
            ScenarioArg::StopSign => Preset::StopSign,
            ScenarioArg::Full => Preset::Full,
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
#[error("solver could not decide the query: {reason}")]
#[diagnostic(
    code(avdiff::inconclusive),
    help("Try a larger `--timeout-ms`; the decoded result was written empty.")
)]
struct Inconclusive {
    reason: String,
}

#[cfg(feature = "z3")]
fn backend(config: SolverConfig) -> Box<dyn Backend> {
    Box::new(avdiff_verify::Z3Backend::new(config))
}

#[cfg(not(feature = "z3"))]
fn backend(_config: SolverConfig) -> Box<dyn Backend> {
    Box::new(avdiff_verify::NoZ3Backend)
}

fn compile_file(verifier: &mut Verifier, space: Space, path: &Path) -> miette::Result<()> {
    let src = fs::read_to_string(path)
        .into_diagnostic()
        .map_err(|e| e.wrap_err(format!("failed to read {}", path.display())))?;
    let source = NamedSource::new(path.display().to_string(), src.clone());
    verifier
        .compile_space(space, &src)
        .map_err(|e| miette::Report::new(e).with_source_code(source))
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("avdiff=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;

    let preset = cli.scenario.map(Preset::from).unwrap_or(cfg.run.scenario);
    let mode = cli.action.map(ActionMode::from).unwrap_or(cfg.run.action);
    let solver = SolverConfig {
        timeout_ms: cli.timeout_ms.or(cfg.solver.timeout_ms),
        ..SolverConfig::default()
    };
    info!(%preset, %mode, "starting run");

    let scenario = Scenario::from_preset(preset, cfg.scenario);
    let mut verifier = Verifier::new(mode);
    verifier.populate_model(&scenario)?;
    verifier.bind_code_policy(&scenario)?;
    for path in &cli.code {
        compile_file(&mut verifier, Space::Code, path)?;
    }
    compile_file(&mut verifier, Space::User, &cli.spec)?;

    for (space, symbols, formulas) in verifier.counts() {
        info!(%space, symbols, formulas, "space populated");
    }
    if cli.dump_query {
        print!("{}", verifier.query_smtlib()?);
    }

    let verdict = verifier.solve(backend(solver).as_mut())?;
    let report = verifier.decode_result()?;
    let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
    fs::write(&cli.output, json)
        .into_diagnostic()
        .map_err(|e| e.wrap_err(format!("failed to write {}", cli.output.display())))?;
    info!(output = %cli.output.display(), "result written");

    match verdict {
        Verdict::Inconclusive(reason) => Err(Inconclusive { reason }.into()),
        Verdict::ViolationFound | Verdict::NoViolation => {
            println!("{verdict}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn code_files_split_on_commas() {
        let cli = Cli::try_parse_from([
            "avdiff", "--code", "a.dsl,b.dsl", "--spec", "u.dsl", "--output", "o.json",
            "--action", "flag-on", "--scenario", "traffic-light",
        ])
        .unwrap();
        assert_eq!(cli.code, vec![PathBuf::from("a.dsl"), PathBuf::from("b.dsl")]);
        assert_eq!(cli.action, Some(ActionArg::FlagOn));
        assert_eq!(cli.scenario.map(Preset::from), Some(Preset::TrafficLight));
        assert!(!cli.dump_query);
    }

    #[test]
    fn spec_and_output_are_required() {
        assert!(Cli::try_parse_from(["avdiff", "--code", "a.dsl"]).is_err());
    }
}
