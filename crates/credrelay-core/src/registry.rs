// ── Remote site registry ──
//
// Ordered list of trusted remote sites. Loaded once from the settings
// store; every mutation persists the full list before the in-memory copy
// changes, so a failed write leaves both sides as they were.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::RemoteSite;
use crate::store::{SettingsStore, StoreError};

/// Settings key holding the site list (a JSON array of strings).
pub const SITES_SETTING_KEY: &str = "ea-wp-remote-rest-user-authentication-remote-sites";

pub struct SiteRegistry {
    store: Arc<dyn SettingsStore>,
    sites: RwLock<Vec<RemoteSite>>,
}

impl SiteRegistry {
    /// Load the persisted list. Stored entries that no longer parse as a
    /// site are skipped with a warning.
    pub fn load(store: Arc<dyn SettingsStore>) -> Result<Self, CoreError> {
        let raw = match store.get(SITES_SETTING_KEY)? {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value::<Vec<String>>(value).map_err(|e| {
                StoreError::Corrupt {
                    key: SITES_SETTING_KEY.into(),
                    reason: e.to_string(),
                }
            })?,
        };

        let mut sites = Vec::with_capacity(raw.len());
        for entry in raw {
            match RemoteSite::parse(&entry) {
                Ok(site) => sites.push(site),
                Err(e) => warn!(entry = %entry, error = %e, "ignoring stored remote site"),
            }
        }
        debug!(count = sites.len(), "remote site registry loaded");

        Ok(Self {
            store,
            sites: RwLock::new(sites),
        })
    }

    /// Snapshot of the configured sites, in probe order.
    pub fn list(&self) -> Vec<RemoteSite> {
        self.sites
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.sites
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Normalize and append `raw`. Returns `false` when the site is
    /// already registered.
    pub fn add(&self, raw: &str) -> Result<bool, CoreError> {
        let site = RemoteSite::parse(raw)?;
        let mut sites = self.sites.write().unwrap_or_else(PoisonError::into_inner);

        if sites.contains(&site) {
            debug!(site = %site, "remote site already registered");
            return Ok(false);
        }

        let mut next = sites.clone();
        next.push(site.clone());
        self.persist(&next)?;
        *sites = next;

        info!(site = %site, "added remote site");
        Ok(true)
    }

    /// Normalize `raw` and remove its first occurrence. Returns `false`
    /// when nothing matched.
    pub fn remove(&self, raw: &str) -> Result<bool, CoreError> {
        let Ok(site) = RemoteSite::parse(raw) else {
            debug!(input = raw, "nothing to remove");
            return Ok(false);
        };
        let mut sites = self.sites.write().unwrap_or_else(PoisonError::into_inner);

        let Some(idx) = sites.iter().position(|s| *s == site) else {
            debug!(site = %site, "remote site not registered");
            return Ok(false);
        };

        let mut next = sites.clone();
        next.remove(idx);
        self.persist(&next)?;
        *sites = next;

        info!(site = %site, "removed remote site");
        Ok(true)
    }

    fn persist(&self, sites: &[RemoteSite]) -> Result<(), CoreError> {
        let value = serde_json::to_value(sites).map_err(StoreError::from)?;
        self.store.put(SITES_SETTING_KEY, value)?;
        Ok(())
    }
}

impl std::fmt::Debug for SiteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteRegistry")
            .field("sites", &self.list())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::store::MemoryStore;

    fn names(registry: &SiteRegistry) -> Vec<String> {
        registry.list().into_iter().map(String::from).collect()
    }

    #[test]
    fn add_normalizes_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let registry = SiteRegistry::load(store.clone()).unwrap();
        assert!(registry.is_empty());

        assert!(registry.add("https://example.com/wp-json/wp/v2/").unwrap());
        assert!(registry.add("http://blog.example.org/").unwrap());

        assert_eq!(names(&registry), vec!["example.com", "blog.example.org"]);
        assert_eq!(
            store.get(SITES_SETTING_KEY).unwrap(),
            Some(json!(["example.com", "blog.example.org"]))
        );
    }

    #[test]
    fn duplicate_add_is_a_no_op() {
        let store = Arc::new(MemoryStore::new());
        let registry = SiteRegistry::load(store).unwrap();

        assert!(registry.add("example.com").unwrap());
        assert!(!registry.add("https://example.com/").unwrap());
        assert_eq!(names(&registry), vec!["example.com"]);
    }

    #[test]
    fn remove_first_match_only_and_absent_is_ok() {
        let store = Arc::new(MemoryStore::new());
        store
            .put(SITES_SETTING_KEY, json!(["a.example", "b.example", "a.example"]))
            .unwrap();
        let registry = SiteRegistry::load(store.clone()).unwrap();

        assert!(registry.remove("https://a.example/wp-json").unwrap());
        assert_eq!(names(&registry), vec!["b.example", "a.example"]);

        assert!(!registry.remove("missing.example").unwrap());
        assert!(!registry.remove("   ").unwrap());
        assert_eq!(
            store.get(SITES_SETTING_KEY).unwrap(),
            Some(json!(["b.example", "a.example"]))
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        let registry = SiteRegistry::load(Arc::new(MemoryStore::new())).unwrap();
        assert!(matches!(
            registry.add("https:///wp-json/"),
            Err(CoreError::InvalidSite { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn invalid_stored_entries_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        store
            .put(SITES_SETTING_KEY, json!(["example.com", "", "https://"]))
            .unwrap();
        let registry = SiteRegistry::load(store).unwrap();
        assert_eq!(names(&registry), vec!["example.com"]);
    }

    #[test]
    fn non_list_setting_is_corrupt() {
        let store = Arc::new(MemoryStore::new());
        store.put(SITES_SETTING_KEY, json!({"oops": true})).unwrap();
        assert!(matches!(
            SiteRegistry::load(store),
            Err(CoreError::Store(StoreError::Corrupt { .. }))
        ));
    }
}
