use serde::{Deserialize, Serialize};

/// Whether the trader followed their plan on a trade.
///
/// The journal stores this as free text; only `"yes"` and `"no"` carry meaning.
/// Anything else round-trips unchanged as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlanAdherence {
    Yes,
    No,
    Other(String),
}

impl PlanAdherence {
    pub fn is_followed(&self) -> bool {
        matches!(self, PlanAdherence::Yes)
    }

    pub fn is_violated(&self) -> bool {
        matches!(self, PlanAdherence::No)
    }
}

impl From<String> for PlanAdherence {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "yes" => PlanAdherence::Yes,
            "no" => PlanAdherence::No,
            _ => PlanAdherence::Other(raw),
        }
    }
}

impl From<PlanAdherence> for String {
    fn from(value: PlanAdherence) -> Self {
        match value {
            PlanAdherence::Yes => "yes".to_string(),
            PlanAdherence::No => "no".to_string(),
            PlanAdherence::Other(raw) => raw,
        }
    }
}
