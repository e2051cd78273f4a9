// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;
use std::time::Duration;

use statcache::{CacheConfig, CacheTelemetry, CacheTier, DefaultCache, default_cache, system_clock};
use tick::Clock;
use tracing::debug;

use crate::cached::CachedClient;
use crate::connection::Connection;
use crate::driver::DriverRegistry;
use crate::languages::Languages;
use crate::model::DataRepository;
use crate::resource::ResourceId;
use crate::source::Source;
use crate::{Error, Result};

/// Settings shared by every connection of a manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Language preferences, unless a source overrides them.
    pub languages: Languages,
    /// Time-to-live of cached responses.
    pub ttl: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            languages: Languages::ANY,
            ttl: Duration::from_secs(5 * 60),
        }
    }
}

/// Entry point: knows the drivers and sources and hands out cached connections.
///
/// All connections share one cache; namespaces keep their entries apart.
#[derive(Debug)]
pub struct SdmxManager<S> {
    registry: DriverRegistry,
    cache: Arc<S>,
    config: ManagerConfig,
    custom_sources: Vec<Source>,
}

impl<S> SdmxManager<S> {
    /// Creates a manager over `registry`, caching in `cache`.
    pub const fn new(registry: DriverRegistry, cache: Arc<S>, config: ManagerConfig) -> Self {
        Self {
            registry,
            cache,
            config,
            custom_sources: Vec::new(),
        }
    }

    /// Adds a source, replacing any source with the same id.
    pub fn add_source(&mut self, source: Source) {
        self.custom_sources.retain(|s| s.id() != source.id());
        self.custom_sources.push(source);
    }

    /// Lists the default sources of the drivers and the added sources; an added source
    /// hides a default source with the same id.
    #[must_use]
    pub fn sources(&self) -> Vec<Source> {
        let mut sources: Vec<Source> = self
            .registry
            .sources()
            .into_iter()
            .filter(|s| self.custom_sources.iter().all(|custom| custom.id() != s.id()))
            .collect();
        sources.extend(self.custom_sources.iter().cloned());
        sources
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Returns the shared cache.
    #[must_use]
    pub const fn cache(&self) -> &Arc<S> {
        &self.cache
    }

    /// Returns the driver registry.
    #[must_use]
    pub const fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    /// Opens a cached connection to the source `source_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`NotFound`](crate::ErrorKind::NotFound) error for an unknown source or
    /// driver, or the driver's error when it cannot serve the source.
    pub fn connect(&self, source_id: &str) -> Result<Connection<CachedClient<S>>>
    where
        S: CacheTier<ResourceId, DataRepository>,
    {
        let source = self
            .sources()
            .into_iter()
            .find(|s| s.id() == source_id)
            .ok_or_else(|| Error::not_found(format!("source '{source_id}'")))?;
        let driver = self
            .registry
            .get(source.driver())
            .ok_or_else(|| Error::not_found(format!("driver '{}' of source '{source_id}'", source.driver())))?;

        let languages = source.languages().unwrap_or(&self.config.languages);
        let client = driver.connect(&source, languages)?;
        let namespace = source.namespace(languages);
        debug!(source = source_id, namespace = %namespace, "connecting");

        Ok(Connection::new(CachedClient::new(client, Arc::clone(&self.cache), namespace, self.config.ttl)))
    }
}

impl SdmxManager<DefaultCache<ResourceId, DataRepository>> {
    /// Creates a manager caching as described by `cache_config`, with its time-to-live.
    #[must_use]
    pub fn with_cache_config(registry: DriverRegistry, cache_config: &CacheConfig, clock: Clock) -> Self {
        let cache = default_cache(cache_config, clock, CacheTelemetry::default());
        let config = ManagerConfig {
            ttl: cache_config.ttl,
            ..ManagerConfig::default()
        };
        Self::new(registry, Arc::new(cache), config)
    }

    /// Creates a manager caching as configured by the `STATLINK_CACHE_*` environment
    /// variables.
    #[must_use]
    pub fn from_env(registry: DriverRegistry) -> Self {
        Self::with_cache_config(registry, &CacheConfig::from_env(), system_clock())
    }
}

#[cfg(test)]
mod tests {
    use statcache::MemoryCache;

    use super::*;
    use crate::{ErrorKind, RepositoryClient, RepositoryDriver};

    fn registry() -> DriverRegistry {
        let driver = RepositoryDriver::new("repo")
            .with_source("ECB", "https://ecb.test/service", RepositoryClient::new(DataRepository::new("ECB")))
            .expect("source");
        DriverRegistry::new().with(driver)
    }

    fn manager() -> SdmxManager<MemoryCache<ResourceId, DataRepository>> {
        SdmxManager::new(registry(), Arc::new(MemoryCache::new(Clock::new_frozen())), ManagerConfig::default())
    }

    #[test]
    fn added_sources_hide_defaults() {
        let mut manager = manager();
        manager.add_source(Source::new("ECB", "repo", "https://mirror.test").expect("source"));
        manager.add_source(Source::new("IMF", "repo", "https://imf.test").expect("source"));

        let sources = manager.sources();
        let hosts: Vec<String> = sources
            .iter()
            .map(|s| format!("{}={}", s.id(), s.endpoint().host().unwrap_or_default()))
            .collect();
        assert_eq!(hosts, ["ECB=mirror.test", "IMF=imf.test"]);
    }

    #[test]
    fn unknown_source_or_driver_is_not_found() {
        let mut manager = manager();
        assert_eq!(manager.connect("IMF").expect_err("unknown source").kind(), ErrorKind::NotFound);

        manager.add_source(Source::new("BIS", "sdmx30", "https://bis.test").expect("source"));
        assert_eq!(manager.connect("BIS").expect_err("unknown driver").kind(), ErrorKind::NotFound);
    }

    #[test]
    fn source_languages_override_manager_languages() {
        let mut manager = manager();
        let connection = manager.connect("ECB").expect("connect");
        assert_eq!(connection.client().namespace(), "repo:ecb.test#*");

        let french = Languages::parse("fr").expect("languages");
        manager.add_source(
            Source::new("ECB", "repo", "https://ecb.test/service")
                .expect("source")
                .with_languages(french),
        );
        let connection = manager.connect("ECB").expect("connect");
        assert_eq!(connection.client().namespace(), "repo:ecb.test#fr");
    }
}
