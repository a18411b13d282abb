//! Materialization kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// How a model is persisted in the warehouse.
///
/// Graph data is read leniently (anything unrecognized becomes `Other`);
/// selector values go through [`FromStr`], which is strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Materialization {
    Table,
    #[default]
    View,
    Incremental,
    Ephemeral,
    Seed,
    Other,
}

impl Materialization {
    pub const ALL: [Materialization; 6] = [
        Materialization::Table,
        Materialization::View,
        Materialization::Incremental,
        Materialization::Ephemeral,
        Materialization::Seed,
        Materialization::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Materialization::Table => "table",
            Materialization::View => "view",
            Materialization::Incremental => "incremental",
            Materialization::Ephemeral => "ephemeral",
            Materialization::Seed => "seed",
            Materialization::Other => "other",
        }
    }

    /// Lenient conversion for values coming out of a dbt project.
    pub fn from_config(value: &str) -> Self {
        value.parse().unwrap_or(Materialization::Other)
    }
}

impl FromStr for Materialization {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnknownMaterializationKind(wanted.to_string()))
    }
}

impl fmt::Display for Materialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Materialization {
    fn from(value: String) -> Self {
        Self::from_config(&value)
    }
}

impl From<Materialization> for String {
    fn from(value: Materialization) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("TABLE".parse::<Materialization>().unwrap(), Materialization::Table);
        assert_eq!(" Incremental ".parse::<Materialization>().unwrap(), Materialization::Incremental);
        assert_eq!("seed".parse::<Materialization>().unwrap(), Materialization::Seed);
    }

    #[test]
    fn test_parse_unknown_kind() {
        let err = "snapshot".parse::<Materialization>().unwrap_err();
        assert!(matches!(err, Error::UnknownMaterializationKind(ref k) if k == "snapshot"));
    }

    #[test]
    fn test_from_config_is_lenient() {
        assert_eq!(Materialization::from_config("materialized_view"), Materialization::Other);
        assert_eq!(Materialization::from_config("View"), Materialization::View);
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Materialization::Ephemeral).unwrap();
        assert_eq!(json, "\"ephemeral\"");
        let back: Materialization = serde_json::from_str("\"snapshot\"").unwrap();
        assert_eq!(back, Materialization::Other);
    }
}
