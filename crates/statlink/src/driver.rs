// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::sync::Arc;

use crate::Result;
use crate::client::SdmxClient;
use crate::languages::Languages;
use crate::source::Source;

/// Protocol implementation creating clients for sources.
pub trait Driver: Send + Sync {
    /// Returns the id sources use to name this driver.
    fn id(&self) -> &str;

    /// Returns the sources this driver knows out of the box.
    fn default_sources(&self) -> Vec<Source>;

    /// Creates a raw client for `source`, negotiating `languages`.
    ///
    /// # Errors
    ///
    /// Returns an error when the source cannot be served by this driver.
    fn connect(&self, source: &Source, languages: &Languages) -> Result<Arc<dyn SdmxClient>>;
}

/// Drivers available to a manager, populated explicitly at start-up.
#[derive(Default, Clone)]
pub struct DriverRegistry {
    drivers: Vec<Arc<dyn Driver>>,
}

impl DriverRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a driver, replacing any driver with the same id.
    #[must_use]
    pub fn with(mut self, driver: impl Driver + 'static) -> Self {
        self.register(Arc::new(driver));
        self
    }

    /// Adds a driver, replacing any driver with the same id.
    pub fn register(&mut self, driver: Arc<dyn Driver>) {
        self.drivers.retain(|d| d.id() != driver.id());
        self.drivers.push(driver);
    }

    /// Finds a driver by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Driver>> {
        self.drivers.iter().find(|d| d.id() == id)
    }

    /// Returns the default sources of every driver.
    #[must_use]
    pub fn sources(&self) -> Vec<Source> {
        self.drivers.iter().flat_map(|d| d.default_sources()).collect()
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.drivers.iter().map(|d| d.id())).finish()
    }
}
