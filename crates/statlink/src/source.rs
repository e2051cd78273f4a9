// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::sync::Arc;

use http::Uri;

use crate::languages::Languages;
use crate::{Error, Result};

/// A statistical data service reachable through a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    id: String,
    driver: String,
    endpoint: Uri,
    languages: Option<Languages>,
}

impl Source {
    /// Describes the service `id`, served by `driver` at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidArgument`](crate::ErrorKind::InvalidArgument) error when `id` is
    /// empty or `endpoint` is not an absolute URI with a host.
    pub fn new(id: impl Into<String>, driver: impl Into<String>, endpoint: &str) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::invalid_argument("source id is empty"));
        }

        let endpoint: Uri = endpoint
            .parse()
            .map_err(|e: http::uri::InvalidUri| Error::invalid_argument(format!("invalid endpoint '{endpoint}' of source '{id}': {e}")))?;
        if endpoint.host().is_none() {
            return Err(Error::invalid_argument(format!("endpoint '{endpoint}' of source '{id}' has no host")));
        }

        Ok(Self {
            id,
            driver: driver.into(),
            endpoint,
            languages: None,
        })
    }

    /// Overrides the language preferences of the connecting manager for this source.
    #[must_use]
    pub fn with_languages(mut self, languages: Languages) -> Self {
        self.languages = Some(languages);
        self
    }

    /// Returns the source id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the id of the driver serving this source.
    #[must_use]
    pub fn driver(&self) -> &str {
        &self.driver
    }

    /// Returns the endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    /// Returns the language override, if any.
    #[must_use]
    pub const fn languages(&self) -> Option<&Languages> {
        self.languages.as_ref()
    }

    /// Returns the cache namespace of this source when negotiating `languages`.
    ///
    /// The namespace combines driver, host and languages.
    #[must_use]
    pub fn namespace(&self, languages: &Languages) -> Arc<str> {
        let host = self.endpoint.host().unwrap_or_default();
        Arc::from(format!("{}:{host}#{languages}", self.driver))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} at {})", self.id, self.driver, self.endpoint)
    }
}
