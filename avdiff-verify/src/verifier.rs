#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use avdiff_core::{Space, SpaceRegistry, code_bindings, compile_source};
use avdiff_logic::{NameSupply, Term, smtlib};
use avdiff_scene::{Scenario, ScenarioModel};
use serde::Deserialize;
use tracing::{debug, info};

use crate::counterexample::ScenarioReport;
use crate::solver::{Backend, CheckOutcome, VerifyError};

/// Whether the code policy is expected to stay off or come on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionMode {
    /// Search for a state where the code does not act but the user property holds.
    #[default]
    #[serde(alias = "flag_off")]
    FlagOff,
    /// Search for a state where both the code and the user property hold.
    #[serde(alias = "flag_on")]
    FlagOn,
}

impl ActionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionMode::FlagOff => "flag-off",
            ActionMode::FlagOn => "flag-on",
        }
    }
}

impl fmt::Display for ActionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('_', "-").as_str() {
            "flag-off" => Ok(ActionMode::FlagOff),
            "flag-on" => Ok(ActionMode::FlagOn),
            _ => Err(format!("unknown action '{s}' (expected flag-off or flag-on)")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Uninitialized,
    ModelPopulated,
    CodePopulated,
    UserPopulated,
    Solved,
    Decoded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Uninitialized => "uninitialized",
            Stage::ModelPopulated => "model-populated",
            Stage::CodePopulated => "code-populated",
            Stage::UserPopulated => "user-populated",
            Stage::Solved => "solved",
            Stage::Decoded => "decoded",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    ViolationFound,
    NoViolation,
    Inconclusive(String),
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::ViolationFound => f.write_str("violation found"),
            Verdict::NoViolation => f.write_str("no violation"),
            Verdict::Inconclusive(reason) => write!(f, "inconclusive ({reason})"),
        }
    }
}

/// One differential run: populate, compile, solve, decode, in that order.
pub struct Verifier {
    mode: ActionMode,
    stage: Stage,
    registry: SpaceRegistry,
    names: NameSupply,
    code_bound: bool,
    outcome: Option<CheckOutcome>,
}

impl Verifier {
    pub fn new(mode: ActionMode) -> Self {
        Self {
            mode,
            stage: Stage::Uninitialized,
            registry: SpaceRegistry::new(),
            names: NameSupply::new(),
            code_bound: false,
            outcome: None,
        }
    }

    pub fn mode(&self) -> ActionMode {
        self.mode
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn registry(&self) -> &SpaceRegistry {
        &self.registry
    }

    fn require(&self, call: &str, allowed: &[Stage]) -> Result<(), VerifyError> {
        if allowed.contains(&self.stage) {
            return Ok(());
        }
        let expected: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();
        Err(VerifyError::Usage(format!(
            "`{call}` called in stage {}, expected {}",
            self.stage,
            expected.join(" or ")
        )))
    }

    /// Copies every scenario variable and invariant into the `model` space.
    pub fn populate_model(&mut self, scenario: &dyn ScenarioModel) -> Result<(), VerifyError> {
        self.require("populate_model", &[Stage::Uninitialized])?;
        for (name, value) in scenario.variables() {
            self.registry.define(Space::Model, name, value);
        }
        for inv in scenario.invariants() {
            self.registry.assert_formula(Space::Model, inv);
        }
        self.stage = Stage::ModelPopulated;
        Ok(())
    }

    /// Binds the names the extracted code policy refers to. Parameter facts
    /// go to `model`. Bindings are installed once per run.
    pub fn bind_code_policy(&mut self, scenario: &Scenario) -> Result<(), VerifyError> {
        self.require("bind_code_policy", &[Stage::ModelPopulated])?;
        if self.code_bound {
            return Err(VerifyError::Usage(
                "bind_code_policy called twice; code bindings are already installed".to_string(),
            ));
        }
        let bindings = code_bindings(scenario, &mut self.names);
        for (name, value) in bindings.symbols {
            self.registry.define(Space::Code, name, value);
        }
        for fact in bindings.model_facts {
            self.registry.assert_formula(Space::Model, fact);
        }
        self.code_bound = true;
        Ok(())
    }

    /// Compiles `src` and appends the formula to `space`. A failed compile
    /// leaves the run unchanged.
    pub fn compile_space(&mut self, space: Space, src: &str) -> Result<(), VerifyError> {
        let next = match space {
            Space::Model => {
                return Err(VerifyError::Usage(
                    "the model space is populated from the scenario and cannot be compiled into"
                        .to_string(),
                ));
            }
            Space::Code => {
                self.require("compile_space(code)", &[Stage::ModelPopulated, Stage::CodePopulated])?;
                Stage::CodePopulated
            }
            Space::User => {
                self.require("compile_space(user)", &[Stage::CodePopulated, Stage::UserPopulated])?;
                Stage::UserPopulated
            }
        };
        let formula = compile_source(src, &self.registry, &mut self.names)?;
        debug!(%space, formula = %formula, "compiled");
        self.registry.assert_formula(space, formula);
        self.stage = next;
        Ok(())
    }

    /// The three conjuncts handed to the backend.
    pub fn query(&self) -> Result<Vec<Term>, VerifyError> {
        self.require(
            "query",
            &[Stage::UserPopulated, Stage::Solved, Stage::Decoded],
        )?;
        let code = Term::or(self.registry.formulas(Space::Code).to_vec());
        let code = match self.mode {
            ActionMode::FlagOff => code.not(),
            ActionMode::FlagOn => code,
        };
        Ok(vec![
            code,
            Term::and(self.registry.formulas(Space::Model).to_vec()),
            Term::or(self.registry.formulas(Space::User).to_vec()),
        ])
    }

    pub fn query_smtlib(&self) -> Result<String, VerifyError> {
        Ok(smtlib::script(&self.query()?))
    }

    pub fn solve(&mut self, backend: &mut dyn Backend) -> Result<Verdict, VerifyError> {
        self.require("solve", &[Stage::UserPopulated])?;
        let query = self.query()?;
        let outcome = backend.check(&query)?;
        let verdict = match &outcome {
            CheckOutcome::Sat(model) => {
                debug!(assignments = model.len(), "model found");
                Verdict::ViolationFound
            }
            CheckOutcome::Unsat => Verdict::NoViolation,
            CheckOutcome::Unknown(reason) => Verdict::Inconclusive(reason.clone()),
        };
        info!(mode = %self.mode, %verdict, "solved");
        self.outcome = Some(outcome);
        self.stage = Stage::Solved;
        Ok(verdict)
    }

    pub fn decode_result(&mut self) -> Result<ScenarioReport, VerifyError> {
        self.require("decode_result", &[Stage::Solved, Stage::Decoded])?;
        let report = match &self.outcome {
            Some(CheckOutcome::Sat(model)) => ScenarioReport::from_model(model),
            _ => ScenarioReport::empty(),
        };
        self.stage = Stage::Decoded;
        Ok(report)
    }

    /// `(space, symbols, formulas)` for every space.
    pub fn counts(&self) -> Vec<(Space, usize, usize)> {
        Space::ALL
            .iter()
            .map(|s| {
                (
                    *s,
                    self.registry.symbol_count(*s),
                    self.registry.formula_count(*s),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_mode_parses_both_spellings() {
        assert_eq!("flag-on".parse::<ActionMode>(), Ok(ActionMode::FlagOn));
        assert_eq!("flag_off".parse::<ActionMode>(), Ok(ActionMode::FlagOff));
        assert!("on".parse::<ActionMode>().is_err());
        assert_eq!(ActionMode::default(), ActionMode::FlagOff);
    }

    #[test]
    fn stages_are_ordered() {
        assert!(Stage::Uninitialized < Stage::ModelPopulated);
        assert!(Stage::UserPopulated < Stage::Solved);
        assert_eq!(Stage::CodePopulated.to_string(), "code-populated");
    }
}
