//! In-process cache of storefront theme settings, keyed by company id.
//!
//! Entries live until the company saves new settings; the write path stores
//! the saved row. An entry is only ever replaced by a higher version, so a
//! reader that loaded the row before a concurrent save cannot put the old
//! version back.

use std::sync::Arc;

use dashmap::DashMap;
use shared::models::ThemeSettings;
use sqlx::PgPool;

use crate::db;

#[derive(Clone, Default)]
pub struct ThemeCache {
    entries: Arc<DashMap<String, Arc<ThemeSettings>>>,
}

impl ThemeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, company_id: &str) -> Option<Arc<ThemeSettings>> {
        self.entries.get(company_id).map(|e| Arc::clone(e.value()))
    }

    /// Store `settings` unless a newer version is already cached; returns
    /// whichever entry wins.
    pub fn insert(&self, settings: ThemeSettings) -> Arc<ThemeSettings> {
        let fresh = Arc::new(settings);
        let entry = self
            .entries
            .entry(fresh.company_id.clone())
            .and_modify(|current| {
                if fresh.version > current.version {
                    *current = Arc::clone(&fresh);
                }
            })
            .or_insert_with(|| Arc::clone(&fresh));
        Arc::clone(entry.value())
    }

    /// Cached settings, falling back to the stored row or defaults (version 0)
    pub async fn get_or_load(
        &self,
        pool: &PgPool,
        company_id: &str,
    ) -> Result<Arc<ThemeSettings>, sqlx::Error> {
        if let Some(hit) = self.get(company_id) {
            return Ok(hit);
        }
        let settings = db::settings::find(pool, company_id)
            .await?
            .unwrap_or_else(|| ThemeSettings::defaults(company_id));
        Ok(self.insert(settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get() {
        let cache = ThemeCache::new();
        assert!(cache.get("c1").is_none());

        let mut settings = ThemeSettings::defaults("c1");
        settings.version = 4;
        cache.insert(settings);
        assert_eq!(cache.get("c1").map(|s| s.etag()), Some("\"c1-v4\"".to_string()));
        assert!(cache.get("c2").is_none());
    }

    fn versioned(company_id: &str, version: i64) -> ThemeSettings {
        let mut settings = ThemeSettings::defaults(company_id);
        settings.version = version;
        settings
    }

    #[test]
    fn test_older_version_never_replaces_newer() {
        let cache = ThemeCache::new();
        cache.insert(versioned("c1", 2));

        // a reader that loaded v1 before the save finishes after it
        let served = cache.insert(versioned("c1", 1));
        assert_eq!(served.version, 2);
        assert_eq!(cache.get("c1").map(|s| s.etag()), Some("\"c1-v2\"".to_string()));

        let served = cache.insert(versioned("c1", 3));
        assert_eq!(served.version, 3);
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = ThemeCache::new();
        let other = cache.clone();
        cache.insert(ThemeSettings::defaults("c2"));
        assert!(other.get("c2").is_some());
    }
}
