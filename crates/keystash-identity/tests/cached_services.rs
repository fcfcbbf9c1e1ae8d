//! Managers over in-memory drivers with an in-process cache.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use keystash_cache::{CacheClient, CacheRouter, FallbackStore};
use keystash_core::{CoreError, Result};
use keystash_identity::{
    Delegation, DelegationDriver, DelegationManager, InMemoryDelegationDriver,
    InMemoryPolicyDriver, Policy, PolicyDriver, PolicyManager, PolicyPatch, RoleRef,
};
use serde_json::json;

/// Counts driver reads.
#[derive(Default)]
struct CountingDelegations {
    inner: InMemoryDelegationDriver,
    gets: AtomicUsize,
}

impl CountingDelegations {
    fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DelegationDriver for CountingDelegations {
    async fn create_delegation(
        &self,
        id: &str,
        delegation: Delegation,
        roles: Vec<RoleRef>,
    ) -> Result<Delegation> {
        self.inner.create_delegation(id, delegation, roles).await
    }

    async fn get_delegation(&self, id: &str) -> Result<Option<Delegation>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_delegation(id).await
    }

    async fn list_delegations(&self) -> Result<Vec<Delegation>> {
        self.inner.list_delegations().await
    }

    async fn list_delegations_for_delegatee(&self, user: &str) -> Result<Vec<Delegation>> {
        self.inner.list_delegations_for_delegatee(user).await
    }

    async fn list_delegations_for_delegator(&self, user: &str) -> Result<Vec<Delegation>> {
        self.inner.list_delegations_for_delegator(user).await
    }

    async fn delete_delegation(&self, id: &str) -> Result<()> {
        self.inner.delete_delegation(id).await
    }
}

fn delegation_manager() -> (DelegationManager, Arc<CountingDelegations>, Arc<FallbackStore>) {
    let store = Arc::new(FallbackStore::new());
    let driver = Arc::new(CountingDelegations::default());
    let manager = DelegationManager::new(driver.clone(), CacheRouter::with_client(store.clone()));
    (manager, driver, store)
}

#[tokio::test]
async fn test_delegation_reads_are_cached() {
    let (manager, driver, store) = delegation_manager();
    let created = manager
        .create_delegation(
            Delegation::new("alice", "bob").with_project("p1"),
            vec![RoleRef::new("member")],
        )
        .await
        .unwrap();
    assert_eq!(created.id.len(), 32);

    let first = manager.get_delegation(&created.id).await.unwrap();
    let second = manager.get_delegation(&created.id).await.unwrap();
    assert_eq!(first, Some(created.clone()));
    assert_eq!(second, first);
    assert_eq!(driver.gets(), 1);

    assert!(
        store
            .get(&format!("deleg-{}", created.id))
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_missing_delegation_is_cached() {
    let (manager, driver, _) = delegation_manager();

    assert!(manager.get_delegation("nope").await.unwrap().is_none());
    assert!(manager.get_delegation("nope").await.unwrap().is_none());
    assert_eq!(driver.gets(), 1);
}

#[tokio::test]
async fn test_delete_revokes_cached_reads() {
    let (manager, driver, _) = delegation_manager();
    let created = manager
        .create_delegation(Delegation::new("alice", "bob"), vec![])
        .await
        .unwrap();

    assert!(manager.get_delegation(&created.id).await.unwrap().is_some());
    manager.delete_delegation(&created.id).await.unwrap();

    assert!(manager.get_delegation(&created.id).await.unwrap().is_none());
    assert_eq!(driver.gets(), 2);
}

#[tokio::test]
async fn test_failed_delete_still_revokes() {
    let (manager, driver, _) = delegation_manager();
    manager.get_delegation("ghost").await.unwrap();

    let err = manager.delete_delegation("ghost").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));

    manager.get_delegation("ghost").await.unwrap();
    assert_eq!(driver.gets(), 2);
}

#[tokio::test]
async fn test_invalid_id_never_reaches_cache() {
    let (manager, driver, store) = delegation_manager();

    let err = manager.get_delegation("a,b").await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidId(_)));
    assert_eq!(driver.gets(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_delegation_manager_without_cache() {
    let driver = Arc::new(CountingDelegations::default());
    let manager = DelegationManager::new(driver.clone(), CacheRouter::disabled());
    let created = manager
        .create_delegation(Delegation::new("alice", "bob"), vec![])
        .await
        .unwrap();

    manager.get_delegation(&created.id).await.unwrap();
    manager.get_delegation(&created.id).await.unwrap();
    assert_eq!(driver.gets(), 2);

    let listed = manager.list_delegations_for_delegatee("bob").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(manager.list_delegations_for_delegator("bob").await.unwrap().is_empty());
    assert_eq!(manager.list_delegations().await.unwrap().len(), 1);
}

fn policy_manager() -> (PolicyManager, Arc<InMemoryPolicyDriver>) {
    let driver = Arc::new(InMemoryPolicyDriver::new());
    let cache = CacheRouter::with_client(Arc::new(FallbackStore::new()));
    (PolicyManager::new(driver.clone(), cache), driver)
}

#[tokio::test]
async fn test_policy_update_revokes() {
    let (manager, driver) = policy_manager();
    let created = manager
        .create_policy(Policy::new("ep1", "application/json", json!({"rule": 1})))
        .await
        .unwrap();

    assert_eq!(manager.get_policy(&created.id).await.unwrap(), created);

    // A write that bypasses the manager is not observed until revocation.
    driver
        .update_policy(
            &created.id,
            PolicyPatch {
                blob: Some(json!({"rule": 2})),
                ..PolicyPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(manager.get_policy(&created.id).await.unwrap().blob, json!({"rule": 1}));

    let updated = manager
        .update_policy(
            &created.id,
            PolicyPatch {
                policy_type: Some("text/plain".into()),
                ..PolicyPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.blob, json!({"rule": 2}));
    assert_eq!(manager.get_policy(&created.id).await.unwrap(), updated);
}

#[tokio::test]
async fn test_missing_policy_is_not_found() {
    let (manager, driver) = policy_manager();

    let err = manager.get_policy("p1").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));

    // The absence stays cached until a policy mutation revokes it.
    driver
        .create_policy("p1", Policy::new("ep1", "t", json!(1)))
        .await
        .unwrap();
    assert!(manager.get_policy("p1").await.is_err());

    manager
        .create_policy(Policy::new("ep2", "t", json!(2)))
        .await
        .unwrap();
    assert_eq!(manager.get_policy("p1").await.unwrap().endpoint_id, "ep1");
}

#[tokio::test]
async fn test_policy_manager_validation() {
    let (manager, _) = policy_manager();

    let err = manager
        .create_policy(Policy::new("", "t", json!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));

    let created = manager
        .create_policy(Policy::new("ep", "t", json!(1)))
        .await
        .unwrap();
    let err = manager
        .update_policy(
            &created.id,
            PolicyPatch {
                id: Some("other".into()),
                ..PolicyPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidRequest(_)));

    manager.delete_policy(&created.id).await.unwrap();
    assert!(manager.list_policies().await.unwrap().is_empty());
    assert!(matches!(
        manager.get_policy(&created.id).await.unwrap_err(),
        CoreError::NotFound { .. }
    ));
}
