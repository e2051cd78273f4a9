// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Ordered language preferences, e.g. `fr,en` or `*` for any language.
///
/// Languages are part of the cache namespace, so responses negotiated for different
/// preferences never share a cache slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Languages {
    tags: Option<Vec<String>>,
}

impl Languages {
    /// Any language.
    pub const ANY: Self = Self { tags: None };

    /// Parses comma-separated language tags.
    ///
    /// An empty input or `*` alone means any language.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidArgument`](crate::ErrorKind::InvalidArgument) error for a
    /// malformed tag.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() || input == "*" {
            return Ok(Self::ANY);
        }

        let tags = input
            .split(',')
            .map(|tag| {
                let tag = tag.trim();
                if is_valid_tag(tag) {
                    Ok(tag.to_string())
                } else {
                    Err(Error::invalid_argument(format!("invalid language tag '{tag}' in '{input}'")))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { tags: Some(tags) })
    }

    /// Returns the tags in preference order, or `None` for any language.
    #[must_use]
    pub fn tags(&self) -> Option<&[String]> {
        self.tags.as_deref()
    }
}

fn is_valid_tag(tag: &str) -> bool {
    if tag == "*" {
        return true;
    }

    let mut subtags = tag.split('-');
    let primary_ok = subtags
        .next()
        .is_some_and(|primary| (1..=8).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic()));
    primary_ok && subtags.all(|subtag| (1..=8).contains(&subtag.len()) && subtag.chars().all(|c| c.is_ascii_alphanumeric()))
}

impl Default for Languages {
    fn default() -> Self {
        Self::ANY
    }
}

impl fmt::Display for Languages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tags {
            None => f.write_str("*"),
            Some(tags) => f.write_str(&tags.join(",")),
        }
    }
}

impl FromStr for Languages {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_language() {
        assert_eq!(Languages::parse("*").expect("parse"), Languages::ANY);
        assert_eq!(Languages::parse("").expect("parse"), Languages::ANY);
        assert_eq!(Languages::default().to_string(), "*");
    }

    #[test]
    fn preference_lists() {
        let languages = Languages::parse("fr-BE, en ,*").expect("parse");
        assert_eq!(languages.tags(), Some(["fr-BE".to_string(), "en".to_string(), "*".to_string()].as_slice()));
        assert_eq!(languages.to_string(), "fr-BE,en,*");
    }

    #[test]
    fn malformed_tags_are_rejected() {
        for input in ["en,,fr", "e n", "123", "en-"] {
            assert!(Languages::parse(input).is_err(), "{input}");
        }
    }
}
