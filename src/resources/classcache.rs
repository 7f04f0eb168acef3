//! Memoized class lookups.
//!
//! Name-based class resolution scans the engine's object table, which is too
//! slow for per-frame paths. [`ClassCache`] remembers every answer, misses
//! included, until a caller forces a refresh. Class descriptors do not move
//! for the lifetime of the process, so a cached hit is never wrong; a cached
//! miss can be if the class is registered later, which is what
//! `force_refresh` is for.

use bevy_ecs::prelude::Resource;
use log::debug;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::host::{ClassHandle, HostError, LookupKind, ObjectModel};

/// Thread-safe name → class cache. Safe to share with auxiliary threads.
#[derive(Resource, Default)]
pub struct ClassCache {
    entries: Mutex<FxHashMap<String, Option<ClassHandle>>>,
}

impl ClassCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `name`, consulting the engine only on a miss or when
    /// `force_refresh` is set. The lock is held across the whole
    /// read-lookup-store sequence.
    pub fn resolve(&self, host: &dyn ObjectModel, name: &str, force_refresh: bool) -> Option<ClassHandle> {
        let mut entries = self.entries.lock();
        if !force_refresh {
            if let Some(cached) = entries.get(name) {
                return *cached;
            }
        }
        let class = host.find_class(name);
        if class.is_none() {
            debug!("Class {} not found; caching the miss", name);
        }
        entries.insert(name.to_string(), class);
        class
    }

    /// [`ClassCache::resolve`] for classes the caller cannot do without.
    pub fn resolve_required(&self, host: &dyn ObjectModel, name: &str) -> Result<ClassHandle, HostError> {
        self.resolve(host, name, false).ok_or_else(|| HostError::NotFound {
            kind: LookupKind::Class,
            name: name.to_string(),
        })
    }

    /// Whether `name` has a cached entry (hit or miss).
    pub fn contains(&self, name: &str) -> bool {
        self.entries.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use crate::host::ACTOR_CLASS;
    use std::sync::Arc;

    #[test]
    fn test_second_resolve_is_a_cache_hit() {
        let host = MockHost::with_engine_classes();
        let cache = ClassCache::new();

        let first = cache.resolve(&host, ACTOR_CLASS, false);
        let second = cache.resolve(&host, ACTOR_CLASS, false);
        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(host.class_lookups(ACTOR_CLASS), 1);
    }

    #[test]
    fn test_misses_are_cached() {
        let host = MockHost::with_engine_classes();
        let cache = ClassCache::new();
        let name = "Class /Script/Game.LateClass";

        assert_eq!(cache.resolve(&host, name, false), None);
        assert!(cache.contains(name));

        // Registered after the miss: still a miss until forced.
        let late = host.define_class(name, None);
        assert_eq!(cache.resolve(&host, name, false), None);
        assert_eq!(host.class_lookups(name), 1);

        assert_eq!(cache.resolve(&host, name, true), Some(late));
        assert_eq!(cache.resolve(&host, name, false), Some(late));
        assert_eq!(host.class_lookups(name), 2);
    }

    #[test]
    fn test_resolve_required_reports_not_found() {
        let host = MockHost::with_engine_classes();
        let cache = ClassCache::new();
        let err = cache.resolve_required(&host, "Class /Script/Nope.Nope").unwrap_err();
        assert!(matches!(
            err,
            HostError::NotFound {
                kind: LookupKind::Class,
                ..
            }
        ));
    }

    #[test]
    fn test_concurrent_resolves_look_up_once() {
        let host = Arc::new(MockHost::with_engine_classes());
        let cache = Arc::new(ClassCache::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let host = host.clone();
                let cache = cache.clone();
                std::thread::spawn(move || cache.resolve(host.as_ref(), ACTOR_CLASS, false))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(results.iter().all(|r| *r == results[0] && r.is_some()));
        assert_eq!(host.class_lookups(ACTOR_CLASS), 1);
    }

    #[test]
    fn test_clear_forgets_entries() {
        let host = MockHost::with_engine_classes();
        let cache = ClassCache::new();
        cache.resolve(&host, ACTOR_CLASS, false);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
