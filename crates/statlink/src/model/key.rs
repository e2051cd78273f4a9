// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::Structure;
use crate::{Error, Result};

/// Constraint on one dimension of a [`Key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    /// Any code.
    Wildcard,
    /// One of the listed codes. Never empty.
    Codes(BTreeSet<String>),
}

impl Segment {
    fn parse(input: &str) -> Result<Self> {
        if input.is_empty() || input == "*" {
            return Ok(Self::Wildcard);
        }

        input
            .split('+')
            .map(|code| {
                if code.is_empty() || code.contains(|c: char| c.is_whitespace() || c == '*') {
                    Err(Error::invalid_argument(format!("invalid code '{code}' in key segment '{input}'")))
                } else {
                    Ok(code.to_string())
                }
            })
            .collect::<Result<BTreeSet<_>>>()
            .map(Self::Codes)
    }

    fn contains(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Wildcard, _) => true,
            (Self::Codes(_), Self::Wildcard) => false,
            (Self::Codes(mine), Self::Codes(theirs)) => theirs.is_subset(mine),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wildcard => f.write_str("*"),
            Self::Codes(codes) => {
                for (i, code) in codes.iter().enumerate() {
                    if i > 0 {
                        f.write_str("+")?;
                    }
                    f.write_str(code)?;
                }
                Ok(())
            }
        }
    }
}

/// Series selector of a data query, e.g. `M.USD+GBP.EUR.SP00.A` or `D.*.*.*.*`.
///
/// [`Key::ALL`] selects every series regardless of the structure's dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    segments: Option<Vec<Segment>>,
}

impl Key {
    /// Selects every series.
    pub const ALL: Self = Self { segments: None };

    /// Parses a key, where `all` stands for [`Key::ALL`].
    ///
    /// Segments are separated by `.`; an empty segment or `*` is a wildcard and codes
    /// within a segment are separated by `+`.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidArgument`](crate::ErrorKind::InvalidArgument) error for an empty
    /// or malformed code.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.eq_ignore_ascii_case("all") {
            return Ok(Self::ALL);
        }

        let segments = input.split('.').map(Segment::parse).collect::<Result<Vec<_>>>()?;
        Ok(Self { segments: Some(segments) })
    }

    /// Returns `true` for [`Key::ALL`] and for keys made only of wildcards.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.segments
            .as_ref()
            .is_none_or(|segments| segments.iter().all(|s| *s == Segment::Wildcard))
    }

    /// Returns `true` when every series selected by `other` is also selected by `self`.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        match (&self.segments, &other.segments) {
            (None, _) => true,
            (Some(_), None) => self.is_unrestricted(),
            (Some(mine), Some(theirs)) => mine.len() == theirs.len() && mine.iter().zip(theirs).all(|(m, t)| m.contains(t)),
        }
    }

    /// Returns `true` when `self` selects strictly more series than `other`.
    #[must_use]
    pub fn supersedes(&self, other: &Self) -> bool {
        self.contains(other) && !other.contains(self)
    }

    /// Checks the key against the dimensions of `structure`.
    ///
    /// Codes are only checked for dimensions that list their codes.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidArgument`](crate::ErrorKind::InvalidArgument) error when the
    /// number of segments differs from the number of dimensions or a code is unknown.
    pub fn validate_on(&self, structure: &Structure) -> Result<()> {
        let Some(segments) = &self.segments else {
            return Ok(());
        };

        if segments.len() != structure.dimensions.len() {
            return Err(Error::invalid_argument(format!(
                "key '{self}' has {} dimensions, structure '{}' expects {}",
                segments.len(),
                structure.structure_ref,
                structure.dimensions.len()
            )));
        }

        for (segment, dimension) in segments.iter().zip(&structure.dimensions) {
            let Segment::Codes(codes) = segment else { continue };
            if dimension.codes.is_empty() {
                continue;
            }
            if let Some(unknown) = codes.iter().find(|code| !dimension.codes.contains_key(*code)) {
                return Err(Error::invalid_argument(format!(
                    "code '{unknown}' of key '{self}' is not a value of dimension '{}'",
                    dimension.id
                )));
            }
        }

        Ok(())
    }
}

impl Default for Key {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(segments) = &self.segments else {
            return f.write_str("all");
        };
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Key {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::ErrorKind;
    use crate::model::{Dimension, StructureRef};

    fn key(input: &str) -> Key {
        Key::parse(input).expect("valid key")
    }

    fn exr_structure() -> Structure {
        let dimension = |id: &str, codes: &[&str]| Dimension {
            id: id.to_string(),
            name: id.to_string(),
            codes: codes.iter().map(|c| ((*c).to_string(), (*c).to_string())).collect::<BTreeMap<_, _>>(),
        };
        Structure {
            structure_ref: StructureRef::new("ECB", "ECB_EXR1", "1.0"),
            name: "Exchange rates".to_string(),
            dimensions: vec![
                dimension("FREQ", &["A", "M", "D"]),
                dimension("CURRENCY", &["USD", "GBP", "CHF"]),
                dimension("CURRENCY_DENOM", &["EUR"]),
                dimension("EXR_TYPE", &[]),
                dimension("EXR_SUFFIX", &["A", "E"]),
            ],
            attributes: Vec::new(),
            time_dimension_id: Some("TIME_PERIOD".to_string()),
            primary_measure_id: "OBS_VALUE".to_string(),
        }
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(key("all"), Key::ALL);
        assert_eq!(key("ALL").to_string(), "all");
        assert_eq!(key("M..EUR.SP00.A").to_string(), "M.*.EUR.SP00.A");
        assert_eq!(key("M.USD+GBP.EUR.*.A").to_string(), "M.GBP+USD.EUR.*.A");
    }

    #[test]
    fn malformed_codes_are_rejected() {
        for input in ["M.USD+.EUR", "M.U SD", "M.US*"] {
            assert_eq!(Key::parse(input).expect_err(input).kind(), ErrorKind::InvalidArgument, "{input}");
        }
    }

    #[test]
    fn containment() {
        assert!(Key::ALL.contains(&key("M.USD.EUR.SP00.A")));
        assert!(key("M.*.*.*.*").contains(&key("M.USD.EUR.SP00.A")));
        assert!(key("M.USD+GBP.EUR.SP00.A").contains(&key("M.USD.EUR.SP00.A")));
        assert!(!key("M.*.*.*.*").contains(&key("D.*.*.*.*")));
        assert!(!key("M.USD.EUR.SP00.A").contains(&key("M.*.EUR.SP00.A")));
        assert!(!key("M.*.*").contains(&key("M.*.*.*.*")));
        assert!(key("*.*.*.*.*").contains(&Key::ALL));
        assert!(!key("M.*.*.*.*").contains(&Key::ALL));
    }

    #[test]
    fn supersedes_is_strict() {
        assert!(Key::ALL.supersedes(&key("M.*.*.*.*")));
        assert!(!key("M.*.*.*.*").supersedes(&key("M.*.*.*.*")));
        assert!(!key("M.USD.EUR.SP00.A").supersedes(&key("M.*.*.*.*")));
        assert!(!Key::ALL.supersedes(&key("*.*.*.*.*")));
    }

    #[test]
    fn validation_checks_arity_and_codes() {
        let structure = exr_structure();
        Key::ALL.validate_on(&structure).expect("all is always valid");
        key("M.USD.EUR.SP00.A").validate_on(&structure).expect("valid key");
        key("D.*.*.*.*").validate_on(&structure).expect("wildcards are valid");

        let arity = key("M.USD.EUR").validate_on(&structure).expect_err("wrong arity");
        assert_eq!(arity.kind(), ErrorKind::InvalidArgument);
        assert!(arity.detail().contains("expects 5"), "{}", arity.detail());

        let unknown = key("M.JPY.EUR.SP00.A").validate_on(&structure).expect_err("unknown code");
        assert!(unknown.detail().contains("'JPY'"), "{}", unknown.detail());
    }

    #[test]
    fn serializes_as_text() {
        let json = serde_json::to_string(&key("M.USD.EUR.SP00.A")).expect("serialize");
        assert_eq!(json, "\"M.USD.EUR.SP00.A\"");
        assert_eq!(serde_json::from_str::<Key>("\"all\"").expect("deserialize"), Key::ALL);
        assert!(serde_json::from_str::<Key>("\"M.+\"").is_err());
    }
}
