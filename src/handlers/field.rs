use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Searchable and array attributes of a handler.
///
/// The numeric indices are shared with storage ports and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id = 0,
    Types = 1,
    Suffixes = 2,
    Actions = 3,
    Locales = 4,
    ActionMap = 5,
    Accesses = 6,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Id,
        Field::Types,
        Field::Suffixes,
        Field::Actions,
        Field::Locales,
        Field::ActionMap,
        Field::Accesses,
    ];

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Types => "types",
            Field::Suffixes => "suffixes",
            Field::Actions => "actions",
            Field::Locales => "locales",
            Field::ActionMap => "action_map",
            Field::Accesses => "accesses",
        }
    }

    /// Everything except the id is array-typed.
    pub fn is_array(self) -> bool {
        self != Field::Id
    }

    /// Fields with an auxiliary value index.
    pub fn is_indexed(self) -> bool {
        matches!(self, Field::Types | Field::Suffixes | Field::Actions)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized field: {0}")]
pub struct UnknownField(pub String);

impl TryFrom<u32> for Field {
    type Error = UnknownField;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Field::ALL
            .into_iter()
            .find(|field| field.index() == value)
            .ok_or_else(|| UnknownField(value.to_string()))
    }
}

/// Accepts the numeric index or the lowercase name.
impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(index) = s.parse::<u32>() {
            return Field::try_from(index);
        }
        Field::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// A field was recognized but the operation does not accept it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field '{field}' is not supported by {operation}")]
pub struct FieldNotSupported {
    pub field: Field,
    pub operation: &'static str,
}

/// How a requested id is matched against registered ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Exact = 0,
    Prefix = 1,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized search mode: {0}")]
pub struct UnknownSearchMode(pub String);

impl TryFrom<u32> for SearchMode {
    type Error = UnknownSearchMode;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SearchMode::Exact),
            1 => Ok(SearchMode::Prefix),
            other => Err(UnknownSearchMode(other.to_string())),
        }
    }
}

impl FromStr for SearchMode {
    type Err = UnknownSearchMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" | "exact" => Ok(SearchMode::Exact),
            "1" | "prefix" => Ok(SearchMode::Prefix),
            other => Err(UnknownSearchMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_indices_are_stable() {
        let indices: Vec<u32> = Field::ALL.iter().map(|f| f.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(Field::try_from(5).unwrap(), Field::ActionMap);
        assert_eq!(Field::try_from(7).unwrap_err(), UnknownField("7".into()));
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!("types".parse::<Field>().unwrap(), Field::Types);
        assert_eq!("2".parse::<Field>().unwrap(), Field::Suffixes);
        assert_eq!("action_map".parse::<Field>().unwrap(), Field::ActionMap);
        assert!("TYPES".parse::<Field>().is_err());
        assert!("9".parse::<Field>().is_err());
    }

    #[test]
    fn test_search_mode_parsing() {
        assert_eq!("prefix".parse::<SearchMode>().unwrap(), SearchMode::Prefix);
        assert_eq!(SearchMode::try_from(0).unwrap(), SearchMode::Exact);
        assert!(SearchMode::try_from(2).is_err());
        assert_eq!(SearchMode::default(), SearchMode::Exact);
    }
}
