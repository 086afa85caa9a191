#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;

use avdiff_logic::Term;
use avdiff_parse::SymbolResolver;
use avdiff_scene::Value;
use tracing::warn;

/// One of the three independent partitions of symbols and formulas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Space {
    Model,
    Code,
    User,
}

impl Space {
    pub const ALL: [Space; 3] = [Space::Model, Space::Code, Space::User];

    /// Order used for unqualified lookups.
    pub const LOOKUP_ORDER: [Space; 3] = [Space::Code, Space::Model, Space::User];

    pub fn as_str(self) -> &'static str {
        match self {
            Space::Model => "model",
            Space::Code => "code",
            Space::User => "user",
        }
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default)]
struct Partition {
    symbols: BTreeMap<String, Value>,
    formulas: Vec<Term>,
}

/// Symbol tables and formula lists for every [`Space`].
#[derive(Clone, Debug, Default)]
pub struct SpaceRegistry {
    model: Partition,
    code: Partition,
    user: Partition,
}

impl SpaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn part(&self, space: Space) -> &Partition {
        match space {
            Space::Model => &self.model,
            Space::Code => &self.code,
            Space::User => &self.user,
        }
    }

    fn part_mut(&mut self, space: Space) -> &mut Partition {
        match space {
            Space::Model => &mut self.model,
            Space::Code => &mut self.code,
            Space::User => &mut self.user,
        }
    }

    /// Binds `name` in `space`. An existing binding is overwritten with a warning.
    pub fn define(&mut self, space: Space, name: impl Into<String>, value: Value) {
        let name = name.into();
        if let Some(old) = self.part_mut(space).symbols.insert(name.clone(), value) {
            warn!(%space, %name, previous = %old, "variable already exists; overwriting");
        }
    }

    pub fn assert_formula(&mut self, space: Space, formula: Term) {
        self.part_mut(space).formulas.push(formula);
    }

    pub fn lookup_in(&self, space: Space, name: &str) -> Option<&Value> {
        self.part(space).symbols.get(name)
    }

    /// Searches code, then model, then user.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        Space::LOOKUP_ORDER
            .iter()
            .find_map(|s| self.lookup_in(*s, name))
    }

    pub fn formulas(&self, space: Space) -> &[Term] {
        &self.part(space).formulas
    }

    pub fn symbols(&self, space: Space) -> impl Iterator<Item = (&str, &Value)> {
        self.part(space).symbols.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn symbol_count(&self, space: Space) -> usize {
        self.part(space).symbols.len()
    }

    pub fn formula_count(&self, space: Space) -> usize {
        self.part(space).formulas.len()
    }
}

impl SymbolResolver for SpaceRegistry {
    fn resolves(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_shadows_model_in_unqualified_lookup() {
        let mut reg = SpaceRegistry::new();
        reg.define(Space::User, "x", Value::Term(Term::int(3)));
        reg.define(Space::Model, "x", Value::Term(Term::int(1)));
        reg.define(Space::Code, "x", Value::Term(Term::int(2)));
        assert_eq!(reg.lookup("x"), Some(&Value::Term(Term::int(2))));
        assert_eq!(reg.lookup_in(Space::User, "x"), Some(&Value::Term(Term::int(3))));
        assert!(reg.resolves("x"));
        assert!(!reg.resolves("y"));
    }

    #[test]
    fn redefinition_overwrites() {
        let mut reg = SpaceRegistry::new();
        reg.define(Space::Model, "x", Value::Term(Term::int(1)));
        reg.define(Space::Model, "x", Value::Term(Term::int(5)));
        assert_eq!(reg.symbol_count(Space::Model), 1);
        assert_eq!(reg.lookup("x"), Some(&Value::Term(Term::int(5))));
    }

    #[test]
    fn formulas_stay_in_their_space() {
        let mut reg = SpaceRegistry::new();
        reg.assert_formula(Space::Code, Term::bool(true));
        reg.assert_formula(Space::Code, Term::bool(false));
        assert_eq!(reg.formula_count(Space::Code), 2);
        assert!(reg.formulas(Space::User).is_empty());
    }
}
