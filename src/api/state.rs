//! Application state for shared services

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{CacheAsideGateway, CacheStore};

/// Shared state handed to every handler.
///
/// One gateway per configured resource kind, all sharing the same cache
/// store handle. Built once at startup; handlers only ever read it.
#[derive(Clone)]
pub struct AppState {
    gateways: Arc<HashMap<String, Arc<CacheAsideGateway>>>,
    cache: Arc<dyn CacheStore>,
}

impl AppState {
    pub fn new(
        gateways: HashMap<String, Arc<CacheAsideGateway>>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            gateways: Arc::new(gateways),
            cache,
        }
    }

    /// Looks up the gateway serving a resource kind
    pub fn gateway(&self, resource: &str) -> Option<&Arc<CacheAsideGateway>> {
        self.gateways.get(resource)
    }

    /// All gateways, for readiness checks
    pub fn gateways(&self) -> impl Iterator<Item = &Arc<CacheAsideGateway>> {
        self.gateways.values()
    }

    /// The shared cache store handle
    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCacheStore;
    use crate::infrastructure::store::InMemoryEntityStore;
    use std::time::Duration;

    fn test_state(resources: &[&str]) -> AppState {
        let cache: Arc<dyn CacheStore> = Arc::new(MockCacheStore::new());
        let gateways = resources
            .iter()
            .map(|resource| {
                let store = Arc::new(InMemoryEntityStore::new());
                let gateway = CacheAsideGateway::new(
                    *resource,
                    store,
                    cache.clone(),
                    Duration::from_secs(60),
                );
                (resource.to_string(), Arc::new(gateway))
            })
            .collect();

        AppState::new(gateways, cache)
    }

    #[test]
    fn test_gateway_lookup() {
        let state = test_state(&["games", "clients"]);

        assert!(state.gateway("games").is_some());
        assert!(state.gateway("clients").is_some());
        assert!(state.gateway("movies").is_none());
    }

    #[test]
    fn test_gateways_iteration() {
        let state = test_state(&["games", "clients"]);
        assert_eq!(state.gateways().count(), 2);
    }
}
