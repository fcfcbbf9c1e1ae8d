//! Service layer: drivers fronted by the cache router.
//!
//! Single-record reads are memoized per id. Every mutation first revokes all
//! cached reads under the resource's prefix.

use std::sync::Arc;

use keystash_cache::{CacheRouter, CallArgs, Route};
use keystash_core::{CoreError, Result, generate_id, now_utc, validate_id};

use crate::delegation::{Delegation, DelegationDriver, RoleRef};
use crate::policy::{Policy, PolicyDriver, PolicyPatch};

/// Cache prefix for delegation reads.
pub const DELEGATION_PREFIX: &str = "deleg";
/// Cache prefix for policy reads.
pub const POLICY_PREFIX: &str = "policy";

pub struct DelegationManager {
    driver: Arc<dyn DelegationDriver>,
    cache: CacheRouter,
    get_route: Route,
}

impl DelegationManager {
    pub fn new(driver: Arc<dyn DelegationDriver>, cache: CacheRouter) -> Self {
        let get_route = cache
            .route("delegation_id", DELEGATION_PREFIX)
            .named("get_delegation");
        Self {
            driver,
            cache,
            get_route,
        }
    }

    pub async fn create_delegation(
        &self,
        delegation: Delegation,
        roles: Vec<RoleRef>,
    ) -> Result<Delegation> {
        let id = generate_id();
        let created = self
            .cache
            .revoke_all(DELEGATION_PREFIX)
            .call(|| async move { self.driver.create_delegation(&id, delegation, roles).await })
            .await?;
        tracing::info!(delegation_id = %created.id, "Created delegation");
        Ok(created)
    }

    /// Cached read. Entries that expired after being cached are still hidden.
    pub async fn get_delegation(&self, delegation_id: &str) -> Result<Option<Delegation>> {
        validate_id(delegation_id)?;
        let args = CallArgs::new().with("delegation_id", delegation_id);
        let found = self
            .get_route
            .call(&args, |_| self.driver.get_delegation(delegation_id))
            .await?;
        Ok(found.filter(|d| d.is_active_at(now_utc())))
    }

    pub async fn list_delegations(&self) -> Result<Vec<Delegation>> {
        self.driver.list_delegations().await
    }

    pub async fn list_delegations_for_delegatee(&self, user_id: &str) -> Result<Vec<Delegation>> {
        self.driver.list_delegations_for_delegatee(user_id).await
    }

    pub async fn list_delegations_for_delegator(&self, user_id: &str) -> Result<Vec<Delegation>> {
        self.driver.list_delegations_for_delegator(user_id).await
    }

    pub async fn delete_delegation(&self, delegation_id: &str) -> Result<()> {
        self.cache
            .revoke_all(DELEGATION_PREFIX)
            .call(|| self.driver.delete_delegation(delegation_id))
            .await?;
        tracing::info!(delegation_id = %delegation_id, "Deleted delegation");
        Ok(())
    }
}

pub struct PolicyManager {
    driver: Arc<dyn PolicyDriver>,
    cache: CacheRouter,
    get_route: Route,
}

impl PolicyManager {
    pub fn new(driver: Arc<dyn PolicyDriver>, cache: CacheRouter) -> Self {
        let get_route = cache.route("policy_id", POLICY_PREFIX).named("get_policy");
        Self {
            driver,
            cache,
            get_route,
        }
    }

    pub async fn create_policy(&self, policy: Policy) -> Result<Policy> {
        policy.validate()?;
        let id = generate_id();
        let created = self
            .cache
            .revoke_all(POLICY_PREFIX)
            .call(|| async move { self.driver.create_policy(&id, policy).await })
            .await?;
        tracing::info!(policy_id = %created.id, "Created policy");
        Ok(created)
    }

    pub async fn list_policies(&self) -> Result<Vec<Policy>> {
        self.driver.list_policies().await
    }

    /// Cached read. A missing policy is cached too and reported as `NotFound`.
    pub async fn get_policy(&self, policy_id: &str) -> Result<Policy> {
        validate_id(policy_id)?;
        let args = CallArgs::new().with("policy_id", policy_id);
        self.get_route
            .call(&args, |_| self.driver.get_policy(policy_id))
            .await?
            .ok_or_else(|| CoreError::not_found("policy", policy_id))
    }

    pub async fn update_policy(&self, policy_id: &str, patch: PolicyPatch) -> Result<Policy> {
        patch.check_id(policy_id)?;
        self.cache
            .revoke_all(POLICY_PREFIX)
            .call(|| self.driver.update_policy(policy_id, patch))
            .await
    }

    pub async fn delete_policy(&self, policy_id: &str) -> Result<()> {
        self.cache
            .revoke_all(POLICY_PREFIX)
            .call(|| self.driver.delete_policy(policy_id))
            .await?;
        tracing::info!(policy_id = %policy_id, "Deleted policy");
        Ok(())
    }
}
