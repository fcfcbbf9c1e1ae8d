//! End-to-end behavior of memoized routes and revoking writes over the
//! in-process store.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use keystash_cache::{
    BackendResolver, CacheClient, CacheError, CacheResult, CacheRouter, CacheSettings, CallArgs,
    FallbackStore, Lookup, RevocationList, SharedClient,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Record {
    name: String,
}

#[derive(Debug, PartialEq)]
enum ServiceError {
    NotFound(String),
    Cache(String),
}

impl From<CacheError> for ServiceError {
    fn from(e: CacheError) -> Self {
        Self::Cache(e.to_string())
    }
}

/// Backing data plus a call counter.
struct Backing {
    records: HashMap<String, Record>,
    calls: AtomicUsize,
}

impl Backing {
    fn new() -> Arc<Self> {
        let mut records = HashMap::new();
        records.insert(
            "1".to_string(),
            Record {
                name: "x".to_string(),
            },
        );
        Arc::new(Self {
            records,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

async fn lookup(
    router: &CacheRouter,
    backing: &Arc<Backing>,
    id: &str,
) -> Result<Option<Record>, ServiceError> {
    let backing = Arc::clone(backing);
    router
        .route("id", "deleg")
        .named("lookup")
        .call(&CallArgs::new().with("id", id), |args| async move {
            backing.calls.fetch_add(1, Ordering::SeqCst);
            Ok(args.get("id").and_then(|id| backing.records.get(id)).cloned())
        })
        .await
}

fn memory_router() -> (CacheRouter, Arc<FallbackStore>) {
    let store = Arc::new(FallbackStore::new());
    (CacheRouter::with_client(store.clone()), store)
}

#[tokio::test]
async fn test_lookup_scenario() {
    let (router, store) = memory_router();
    let backing = Backing::new();
    let expected = Some(Record {
        name: "x".to_string(),
    });

    assert_eq!(lookup(&router, &backing, "1").await.unwrap(), expected);
    assert_eq!(backing.calls(), 1);
    assert_eq!(
        store.get("deleg-1").await.unwrap(),
        Some(br#"{"name":"x"}"#.to_vec())
    );

    assert_eq!(lookup(&router, &backing, "1").await.unwrap(), expected);
    assert_eq!(backing.calls(), 1);

    // A legitimate "nothing" is cached too.
    assert_eq!(lookup(&router, &backing, "2").await.unwrap(), None);
    assert_eq!(lookup(&router, &backing, "2").await.unwrap(), None);
    assert_eq!(backing.calls(), 2);
    assert_eq!(
        router.lookup::<Record>("deleg", "2").await.unwrap(),
        Lookup::HitAbsent
    );

    // Deleting through the revoking wrapper forces a re-read.
    let deleted: Result<(), ServiceError> = router
        .revoke_all("deleg")
        .call(|| async { Ok(()) })
        .await;
    deleted.unwrap();

    assert_eq!(lookup(&router, &backing, "1").await.unwrap(), expected);
    assert_eq!(backing.calls(), 3);
    assert_eq!(lookup(&router, &backing, "2").await.unwrap(), None);
    assert_eq!(backing.calls(), 4);
}

#[tokio::test]
async fn test_keys_are_recorded_for_revocation() {
    let (router, store) = memory_router();
    let backing = Backing::new();

    lookup(&router, &backing, "1").await.unwrap();
    lookup(&router, &backing, "2").await.unwrap();
    lookup(&router, &backing, "1").await.unwrap();

    assert_eq!(
        store.get("revocation_deleg").await.unwrap(),
        Some(b"1,2".to_vec())
    );
}

#[tokio::test]
async fn test_fail_open_without_backend() {
    let router = CacheRouter::disabled();
    let backing = Backing::new();

    for _ in 0..3 {
        assert_eq!(
            lookup(&router, &backing, "1").await.unwrap().map(|r| r.name),
            Some("x".to_string())
        );
    }
    assert_eq!(backing.calls(), 3);
}

#[tokio::test]
async fn test_in_memory_fallback_from_settings() {
    let router = CacheRouter::new(CacheSettings::in_memory());
    let backing = Backing::new();

    lookup(&router, &backing, "1").await.unwrap();
    lookup(&router, &backing, "1").await.unwrap();
    assert_eq!(backing.calls(), 1);
}

#[tokio::test]
async fn test_errors_pass_through_uncached() {
    let (router, store) = memory_router();
    let calls = Arc::new(AtomicUsize::new(0));
    let route = router.route("id", "deleg");

    for _ in 0..2 {
        let calls = Arc::clone(&calls);
        let result: Result<Option<Record>, ServiceError> = route
            .call(&CallArgs::new().with("id", "9"), |args| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ServiceError::NotFound(
                    args.get("id").unwrap_or_default().to_string(),
                ))
            })
            .await;
        assert_eq!(result, Err(ServiceError::NotFound("9".to_string())));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(store.get("deleg-9").await.unwrap().is_none());
    assert!(store.get("revocation_deleg").await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_argument_is_unexpected() {
    let (router, _) = memory_router();
    let backing = Backing::new();
    let inner = Arc::clone(&backing);

    let result: Result<Option<Record>, ServiceError> = router
        .route("delegation_id", "deleg")
        .named("get_delegation")
        .call(&CallArgs::new().with("id", "1"), |_| async move {
            inner.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        })
        .await;

    match result {
        Err(ServiceError::Cache(message)) => {
            assert!(message.contains("There is no argument delegation_id in function get_delegation"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(backing.calls(), 0);
}

#[tokio::test]
async fn test_key_ids_that_cannot_be_revoked_are_refused() {
    let (router, store) = memory_router();
    let backing = Backing::new();

    for id in ["", "a,b"] {
        match lookup(&router, &backing, id).await {
            Err(ServiceError::Cache(message)) => {
                assert!(message.contains("Invalid cache key id"), "{message}");
            }
            other => panic!("unexpected result for {id:?}: {other:?}"),
        }
    }
    assert_eq!(backing.calls(), 0);
    assert!(store.is_empty());

    // Nothing stale survives a revoke-all either.
    router.revoke("deleg").await.unwrap();
    assert!(lookup(&router, &backing, "").await.is_err());
    assert_eq!(backing.calls(), 0);
}

#[tokio::test]
async fn test_fail_open_accepts_any_key_id() {
    let router = CacheRouter::disabled();
    let backing = Backing::new();

    assert_eq!(lookup(&router, &backing, "a,b").await.unwrap(), None);
    assert_eq!(lookup(&router, &backing, "").await.unwrap(), None);
    assert_eq!(backing.calls(), 2);
}

#[tokio::test]
async fn test_revocation_scoped_to_prefix() {
    let (router, store) = memory_router();
    let list = RevocationList::new(store.clone());

    for (prefix, id) in [("deleg", "A"), ("deleg", "B"), ("policy", "A")] {
        store
            .set(&format!("{prefix}-{id}"), b"1", Duration::ZERO)
            .await
            .unwrap();
        list.record(prefix, id).await.unwrap();
    }

    assert_eq!(router.revoke("deleg").await.unwrap(), 2);
    assert!(store.get("deleg-A").await.unwrap().is_none());
    assert!(store.get("deleg-B").await.unwrap().is_none());
    assert!(store.get("policy-A").await.unwrap().is_some());
}

/// Delegates to a [`FallbackStore`] but has no `append`.
#[derive(Default)]
struct NoAppend {
    inner: FallbackStore,
}

#[async_trait]
impl CacheClient for NoAppend {
    fn name(&self) -> &'static str {
        "no-append"
    }
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.inner.get(key).await
    }
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<bool> {
        self.inner.set(key, value, ttl).await
    }
    async fn add(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<bool> {
        self.inner.add(key, value, ttl).await
    }
    async fn incr(&self, key: &str, delta: i64) -> CacheResult<Option<i64>> {
        self.inner.incr(key, delta).await
    }
    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.inner.delete(key).await
    }
}

#[tokio::test]
async fn test_strict_revocation_discards_result() {
    let router = CacheRouter::with_client(Arc::new(NoAppend::default()));
    let backing = Backing::new();

    // First key creates the list, second cannot be appended.
    lookup(&router, &backing, "1").await.unwrap();
    let err = lookup(&router, &backing, "2").await.unwrap_err();

    match err {
        ServiceError::Cache(message) => {
            assert!(message.contains("Unable to add token to revocation list"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(backing.calls(), 2);
}

#[tokio::test]
async fn test_relaxed_revocation_returns_result() {
    let client: SharedClient = Arc::new(NoAppend::default());
    let settings = CacheSettings {
        strict_revocation: false,
        ..CacheSettings::default()
    };
    let router = CacheRouter::from_resolver(BackendResolver::with_client(client, settings));
    let backing = Backing::new();

    lookup(&router, &backing, "1").await.unwrap();
    assert_eq!(lookup(&router, &backing, "2").await.unwrap(), None);

    // The value is cached even though it cannot be revoked.
    assert_eq!(lookup(&router, &backing, "2").await.unwrap(), None);
    assert_eq!(backing.calls(), 2);
}

#[tokio::test]
async fn test_concurrent_records_keep_every_id() {
    let store = Arc::new(FallbackStore::new());
    let list = RevocationList::new(store.clone());

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let list = list.clone();
            tokio::spawn(async move { list.record("deleg", &i.to_string()).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut ids = list.keys("deleg").await.unwrap();
    ids.sort_by_key(|id| id.parse::<u32>().unwrap());
    let expected: Vec<String> = (0..32).map(|i| i.to_string()).collect();
    assert_eq!(ids, expected);
}
