use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use super::PlatformApi;
use crate::error::Result;

/// Platform API objects keyed by canonical platform directory.
///
/// Remove an entry before deleting its directory: the key of a missing
/// directory cannot be canonicalized.
#[derive(Default)]
pub struct PlatformApiCache {
    entries: Mutex<HashMap<PathBuf, Arc<dyn PlatformApi>>>,
}

impl std::fmt::Debug for PlatformApiCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformApiCache")
            .field("len", &self.len())
            .finish()
    }
}

impl PlatformApiCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(platform_dir: &Path) -> PathBuf {
        dunce::canonicalize(platform_dir).unwrap_or_else(|_| platform_dir.to_path_buf())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Arc<dyn PlatformApi>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, platform_dir: &Path) -> Option<Arc<dyn PlatformApi>> {
        self.lock().get(&Self::key(platform_dir)).cloned()
    }

    /// Cache `api`, replacing any previous entry for the directory
    pub fn insert(&self, platform_dir: &Path, api: Arc<dyn PlatformApi>) {
        self.lock().insert(Self::key(platform_dir), api);
    }

    /// The cached API, or the result of `load` which is then cached
    pub fn get_or_try_insert(
        &self,
        platform_dir: &Path,
        load: impl FnOnce() -> Result<Arc<dyn PlatformApi>>,
    ) -> Result<Arc<dyn PlatformApi>> {
        let key = Self::key(platform_dir);
        if let Some(api) = self.lock().get(&key) {
            return Ok(api.clone());
        }
        let api = load()?;
        self.lock().insert(key, api.clone());
        Ok(api)
    }

    pub fn remove(&self, platform_dir: &Path) -> Option<Arc<dyn PlatformApi>> {
        self.lock().remove(&Self::key(platform_dir))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ScriptPlatformApi;
    use cordova_test_utils::TestProject;

    #[test]
    fn equivalent_paths_share_an_entry() {
        let test = TestProject::new().with_dir("platforms/android");
        let cache = PlatformApiCache::new();
        let dir = test.path("platforms/android");

        cache.insert(&dir, Arc::new(ScriptPlatformApi::new("android", &dir)));
        let dotted = test.path("platforms/../platforms/android");
        assert!(cache.get(&dotted).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn loads_once() {
        let test = TestProject::new().with_dir("platforms/ios");
        let cache = PlatformApiCache::new();
        let dir = test.path("platforms/ios");
        let mut loads = 0;

        for _ in 0..3 {
            cache
                .get_or_try_insert(&dir, || {
                    loads += 1;
                    let api: Arc<dyn PlatformApi> = Arc::new(ScriptPlatformApi::new("ios", &dir));
                    Ok(api)
                })
                .unwrap();
        }
        assert_eq!(loads, 1);

        assert!(cache.remove(&dir).is_some());
        assert!(cache.is_empty());
    }
}
