use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::behavior::MockBehavior;
use crate::error::Error;
use crate::query;

///
/// In-memory registry of injected response behaviors, keyed by the canonical
/// request signature `UPPER(method) + " " + path + query-signature`.
///
/// The store holds at most one behavior per key: registering a second
/// behavior for the same signature overwrites the first. Entries never
/// expire on their own, they live until `reset()` or the end of the process.
///
/// A store is an explicitly owned value. Cloning it is cheap and yields a
/// handle onto the same underlying state, which is how the server shares it
/// across connections.
///
#[derive(Clone, Debug, Default)]
pub struct MockStore {
    state: Arc<Mutex<HashMap<String, MockBehavior>>>,
    ignore_query_hash: bool,
}

impl MockStore {
    ///
    /// An empty store with exact-signature matching.
    ///
    pub fn new() -> MockStore {
        MockStore::default()
    }

    ///
    /// Degraded-match mode: a lookup that misses on the exact signature
    /// additionally tries the key with an empty query signature, so a
    /// behavior saved without a query constraint can answer any query for
    /// that method and path. Off by default.
    ///
    pub fn ignoring_query_hash(mut self) -> MockStore {
        self.ignore_query_hash = true;
        self
    }

    ///
    /// Validates and registers a behavior, overwriting any previous behavior
    /// with the same signature. Fails with `ErrorKind::InvalidBehavior` when
    /// the behavior is malformed.
    ///
    pub fn save(&self, behavior: MockBehavior) -> Result<(), Error> {
        behavior.validate()?;

        let signature = behavior
            .qs
            .as_deref()
            .map(query::canonicalize)
            .unwrap_or_default();
        let key = mock_key(&behavior.method, &behavior.path, &signature);

        log::debug!("registering override {}", key);
        self.state.lock().unwrap().insert(key, behavior);

        Ok(())
    }

    ///
    /// Returns the behavior registered for this method, path and live query
    /// string, if any. Exact key equality only, no partial or prefix
    /// matching.
    ///
    pub fn lookup(&self, method: &str, path: &str, query: &str) -> Option<MockBehavior> {
        let signature = query::canonicalize(query);
        let state = self.state.lock().unwrap();

        let found = state.get(&mock_key(method, path, &signature));
        if found.is_none() && self.ignore_query_hash && !signature.is_empty() {
            return state.get(&mock_key(method, path, "")).cloned();
        }

        found.cloned()
    }

    ///
    /// Removes all registered behaviors. Always succeeds.
    ///
    pub fn reset(&self) {
        self.state.lock().unwrap().clear();
    }
}

fn mock_key(method: &str, path: &str, query_signature: &str) -> String {
    format!("{} {}{}", method.to_uppercase(), path, query_signature)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::MockStore;
    use crate::behavior::MockBehavior;
    use crate::error::ErrorKind;

    fn behavior(status: u16, qs: Option<&str>) -> MockBehavior {
        MockBehavior {
            method: "get".to_string(),
            path: "/batman/location".to_string(),
            status,
            response: Some(json!({ "arkham": "asylum" })),
            qs: qs.map(str::to_string),
        }
    }

    #[test]
    fn lookup_is_case_insensitive_on_the_method() {
        let store = MockStore::new();
        store.save(behavior(201, None)).unwrap();

        assert!(store.lookup("GET", "/batman/location", "").is_some());
        assert!(store.lookup("get", "/batman/location", "").is_some());
    }

    #[test]
    fn later_saves_overwrite_earlier_ones() {
        let store = MockStore::new();
        store.save(behavior(201, None)).unwrap();
        store.save(behavior(503, None)).unwrap();

        let found = store.lookup("GET", "/batman/location", "").unwrap();
        assert_eq!(found.status, 503);
    }

    #[test]
    fn reset_clears_everything() {
        let store = MockStore::new();
        store.save(behavior(201, None)).unwrap();
        store.reset();

        assert!(store.lookup("GET", "/batman/location", "").is_none());
    }

    #[test]
    fn query_scoped_behaviors_match_reordered_queries() {
        let store = MockStore::new();
        store
            .save(behavior(201, Some("greeting=hi%20you&foo=1")))
            .unwrap();

        assert!(store
            .lookup("GET", "/batman/location", "foo=1&greeting=hi+you")
            .is_some());
        assert!(store
            .lookup("GET", "/batman/location", "hello=world")
            .is_none());
        assert!(store.lookup("GET", "/batman/location", "").is_none());
    }

    #[test]
    fn unscoped_behaviors_require_a_bare_query_by_default() {
        let store = MockStore::new();
        store.save(behavior(201, None)).unwrap();

        assert!(store.lookup("GET", "/batman/location", "foo=1").is_none());
    }

    #[test]
    fn ignoring_the_query_hash_falls_back_to_unscoped_behaviors() {
        let store = MockStore::new().ignoring_query_hash();
        store.save(behavior(201, None)).unwrap();
        store.save(behavior(202, Some("foo=1"))).unwrap();

        // The exact signature still wins when one is registered.
        let scoped = store.lookup("GET", "/batman/location", "foo=1").unwrap();
        assert_eq!(scoped.status, 202);

        let fallback = store.lookup("GET", "/batman/location", "bar=2").unwrap();
        assert_eq!(fallback.status, 201);
    }

    #[test]
    fn unrooted_paths_are_rejected() {
        let store = MockStore::new();
        let mut invalid = behavior(201, None);
        invalid.path = "batman/location".to_string();

        let err = store.save(invalid).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidBehavior));
    }

    #[test]
    fn empty_methods_are_rejected() {
        let store = MockStore::new();
        let mut invalid = behavior(201, None);
        invalid.method = String::new();

        let err = store.save(invalid).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidBehavior));
    }

    #[test]
    fn out_of_range_statuses_are_rejected() {
        let store = MockStore::new();
        let err = store.save(behavior(42, None)).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidBehavior));
    }
}
