// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Agency matching any agency.
pub const ALL_AGENCIES: &str = "all";
/// Version matching any version.
pub const LATEST_VERSION: &str = "latest";

fn parse_parts(input: &str, what: &str) -> Result<(String, String, String)> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    let (agency, id, version) = match parts.as_slice() {
        [id] => (ALL_AGENCIES, *id, LATEST_VERSION),
        [agency, id] => (*agency, *id, LATEST_VERSION),
        [agency, id, version] => (*agency, *id, *version),
        _ => return Err(Error::invalid_argument(format!("malformed {what} reference '{input}'"))),
    };

    if id.is_empty() {
        return Err(Error::invalid_argument(format!("{what} reference '{input}' has no id")));
    }

    let or_default = |value: &str, default: &str| if value.is_empty() { default.to_string() } else { value.to_string() };
    Ok((or_default(agency, ALL_AGENCIES), id.to_string(), or_default(version, LATEST_VERSION)))
}

fn component_contains(pattern: &str, wildcard: &str, value: &str) -> bool {
    pattern == wildcard || pattern == value
}

macro_rules! artefact_ref {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name {
            agency: String,
            id: String,
            version: String,
        }

        impl $name {
            /// Creates a reference from its three components.
            pub fn new(agency: impl Into<String>, id: impl Into<String>, version: impl Into<String>) -> Self {
                Self {
                    agency: agency.into(),
                    id: id.into(),
                    version: version.into(),
                }
            }

            /// Parses `id`, `agency,id` or `agency,id,version`.
            ///
            /// Missing components default to any agency and the latest version.
            ///
            /// # Errors
            ///
            /// Returns an [`InvalidArgument`](crate::ErrorKind::InvalidArgument) error when
            /// the input has more than three components or no id.
            pub fn parse(input: &str) -> Result<Self> {
                let (agency, id, version) = parse_parts(input, $what)?;
                Ok(Self { agency, id, version })
            }

            /// Returns the maintenance agency.
            #[must_use]
            pub fn agency(&self) -> &str {
                &self.agency
            }

            /// Returns the identifier.
            #[must_use]
            pub fn id(&self) -> &str {
                &self.id
            }

            /// Returns the version.
            #[must_use]
            pub fn version(&self) -> &str {
                &self.version
            }

            /// Returns `true` when `other` is this reference or one of the references it
            /// stands for, treating `all` agencies and `latest` versions as wildcards.
            #[must_use]
            pub fn contains(&self, other: &Self) -> bool {
                component_contains(&self.agency, ALL_AGENCIES, &other.agency)
                    && self.id == other.id
                    && component_contains(&self.version, LATEST_VERSION, &other.version)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{},{},{}", self.agency, self.id, self.version)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse(s)
            }
        }
    };
}

artefact_ref!(
    /// Identifies a dataflow: the entry point of every data query.
    FlowRef,
    "flow"
);

artefact_ref!(
    /// Identifies the data structure describing a flow's dimensions.
    StructureRef,
    "structure"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn short_forms_get_defaults() {
        assert_eq!(FlowRef::parse("EXR").expect("parse"), FlowRef::new("all", "EXR", "latest"));
        assert_eq!(FlowRef::parse("ECB,EXR").expect("parse"), FlowRef::new("ECB", "EXR", "latest"));
        assert_eq!(FlowRef::parse("ECB,EXR,1.0").expect("parse"), FlowRef::new("ECB", "EXR", "1.0"));
        assert_eq!(FlowRef::parse(",EXR,").expect("parse"), FlowRef::new("all", "EXR", "latest"));
    }

    #[test]
    fn display_round_trips() {
        let reference = StructureRef::new("ECB", "ECB_EXR1", "1.0");
        assert_eq!(reference.to_string(), "ECB,ECB_EXR1,1.0");
        assert_eq!(reference.to_string().parse::<StructureRef>().expect("parse"), reference);
    }

    #[test]
    fn malformed_references_are_rejected() {
        for input in ["", "ECB,", "a,b,c,d"] {
            let error = FlowRef::parse(input).expect_err(input);
            assert_eq!(error.kind(), ErrorKind::InvalidArgument, "{input}");
        }
    }

    #[test]
    fn wildcards_contain_concrete_references() {
        let concrete = FlowRef::new("ECB", "EXR", "1.0");
        assert!(FlowRef::parse("EXR").expect("parse").contains(&concrete));
        assert!(FlowRef::parse("ECB,EXR").expect("parse").contains(&concrete));
        assert!(!FlowRef::parse("IMF,EXR").expect("parse").contains(&concrete));
        assert!(!FlowRef::parse("ICP").expect("parse").contains(&concrete));
        assert!(!concrete.contains(&FlowRef::parse("EXR").expect("parse")));
    }
}
