#![forbid(unsafe_code)]

//! Counterexample decoding: solver model → per-object report.
//!
//! Constants named `<label>_<id>_<field>` for a known object label are filed
//! under that label and id; everything else lands in `common`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use avdiff_logic::{Model, Scalar};
use regex::Regex;
use serde::Serialize;

/// Object labels with their own bucket, in match order.
pub const LABELS: [&str; 6] = [
    "vehicle",
    "pedestrian",
    "crosswalk",
    "traffic_light",
    "stop_sign",
    "yield_sign",
];

static OBJECT_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"^(?P<label>{})_(?P<id>[A-Za-z0-9]+)_(?P<field>.+)$",
        LABELS.join("|")
    );
    Regex::new(&pattern).expect("object field pattern is a valid regex")
});

/// `id -> field -> value`
pub type ObjectFields = BTreeMap<String, BTreeMap<String, Scalar>>;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub common: BTreeMap<String, Scalar>,
    #[serde(flatten)]
    pub objects: BTreeMap<String, ObjectFields>,
}

impl ScenarioReport {
    /// Every label bucket present and empty.
    pub fn empty() -> Self {
        Self {
            common: BTreeMap::new(),
            objects: LABELS
                .iter()
                .map(|l| (l.to_string(), ObjectFields::new()))
                .collect(),
        }
    }

    pub fn from_model(model: &Model) -> Self {
        let mut report = Self::empty();
        for (name, value) in model.iter() {
            let value = value.to_scalar();
            match OBJECT_FIELD.captures(name) {
                Some(caps) => {
                    report
                        .objects
                        .entry(caps["label"].to_string())
                        .or_default()
                        .entry(caps["id"].to_string())
                        .or_default()
                        .insert(caps["field"].to_string(), value);
                }
                None => {
                    report.common.insert(name.to_string(), value);
                }
            }
        }
        report
    }

    pub fn field(&self, label: &str, id: &str, field: &str) -> Option<Scalar> {
        self.objects.get(label)?.get(id)?.get(field).copied()
    }

    pub fn object_count(&self) -> usize {
        self.objects.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.common.is_empty() && self.object_count() == 0
    }
}
