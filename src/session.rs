//! Session-scoped UI cache.
//!
//! The app needs a handful of cross-screen remembered values: scroll
//! offsets per route, which image URLs have already loaded (to skip
//! skeleton placeholders), and small bits of screen state. Instead of
//! hidden module-level globals, callers own a `SessionCache` and pass it
//! where needed; dropping it is the teardown. Each namespace is bounded
//! with insertion-order eviction so a long session cannot grow without
//! limit.

use std::collections::{HashMap, VecDeque};

use serde_json::Value;

const DEFAULT_NAMESPACE_CAPACITY: usize = 256;

const NS_SCROLL: &str = "scroll";
const NS_IMAGES: &str = "images";

#[derive(Default)]
struct Namespace {
    order: VecDeque<String>,
    values: HashMap<String, Value>,
}

impl Namespace {
    fn insert(&mut self, key: String, value: Value, capacity: usize) {
        if self.values.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
            while self.order.len() > capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.values.remove(&oldest);
                }
            }
        }
    }
}

pub struct SessionCache {
    capacity: usize,
    namespaces: HashMap<String, Namespace>,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE_CAPACITY)
    }
}

impl SessionCache {
    /// `capacity` bounds each namespace individually.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            namespaces: HashMap::new(),
        }
    }

    pub fn set(&mut self, namespace: &str, key: &str, value: Value) {
        let capacity = self.capacity;
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value, capacity);
    }

    pub fn get(&self, namespace: &str, key: &str) -> Option<&Value> {
        self.namespaces.get(namespace)?.values.get(key)
    }

    pub fn remove(&mut self, namespace: &str, key: &str) -> Option<Value> {
        let ns = self.namespaces.get_mut(namespace)?;
        ns.order.retain(|k| k != key);
        ns.values.remove(key)
    }

    pub fn clear_namespace(&mut self, namespace: &str) {
        self.namespaces.remove(namespace);
    }

    /// Whole-session teardown.
    pub fn clear(&mut self) {
        self.namespaces.clear();
    }

    pub fn len(&self, namespace: &str) -> usize {
        self.namespaces
            .get(namespace)
            .map(|ns| ns.values.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.values().all(|ns| ns.values.is_empty())
    }

    // -----------------------------------------------------------------------
    // Scroll positions
    // -----------------------------------------------------------------------

    pub fn save_scroll(&mut self, route: &str, offset: f64) {
        self.set(NS_SCROLL, route, Value::from(offset));
    }

    pub fn restore_scroll(&self, route: &str) -> Option<f64> {
        self.get(NS_SCROLL, route)?.as_f64()
    }

    // -----------------------------------------------------------------------
    // Loaded-image marks
    // -----------------------------------------------------------------------

    pub fn mark_image_loaded(&mut self, src: &str) {
        self.set(NS_IMAGES, src, Value::Bool(true));
    }

    pub fn is_image_loaded(&self, src: &str) -> bool {
        self.get(NS_IMAGES, src)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_get_round_trip() {
        let mut cache = SessionCache::default();
        cache.set("drawer", "entries", json!({"open": true}));
        assert_eq!(cache.get("drawer", "entries"), Some(&json!({"open": true})));
        assert_eq!(cache.get("drawer", "missing"), None);
    }

    #[test]
    fn test_scroll_round_trip() {
        let mut cache = SessionCache::default();
        cache.save_scroll("/entries", 420.5);
        assert_eq!(cache.restore_scroll("/entries"), Some(420.5));
        assert_eq!(cache.restore_scroll("/customers"), None);
    }

    #[test]
    fn test_image_marks() {
        let mut cache = SessionCache::default();
        assert!(!cache.is_image_loaded("a.png"));
        cache.mark_image_loaded("a.png");
        assert!(cache.is_image_loaded("a.png"));
    }

    #[test]
    fn test_eviction_drops_oldest() {
        let mut cache = SessionCache::new(2);
        cache.set("ns", "first", json!(1));
        cache.set("ns", "second", json!(2));
        cache.set("ns", "third", json!(3));

        assert_eq!(cache.len("ns"), 2);
        assert_eq!(cache.get("ns", "first"), None);
        assert_eq!(cache.get("ns", "second"), Some(&json!(2)));
        assert_eq!(cache.get("ns", "third"), Some(&json!(3)));
    }

    #[test]
    fn test_update_does_not_evict() {
        let mut cache = SessionCache::new(2);
        cache.set("ns", "first", json!(1));
        cache.set("ns", "second", json!(2));
        cache.set("ns", "first", json!(10));

        assert_eq!(cache.len("ns"), 2);
        assert_eq!(cache.get("ns", "first"), Some(&json!(10)));
    }

    #[test]
    fn test_namespaces_are_independent() {
        let mut cache = SessionCache::new(1);
        cache.set("a", "k", json!(1));
        cache.set("b", "k", json!(2));
        assert_eq!(cache.get("a", "k"), Some(&json!(1)));
        assert_eq!(cache.get("b", "k"), Some(&json!(2)));
    }

    #[test]
    fn test_remove_and_teardown() {
        let mut cache = SessionCache::default();
        cache.set("ns", "k", json!(1));
        assert_eq!(cache.remove("ns", "k"), Some(json!(1)));
        assert_eq!(cache.remove("ns", "k"), None);

        cache.set("ns", "k", json!(1));
        cache.mark_image_loaded("a.png");
        cache.clear();
        assert!(cache.is_empty());
    }
}
