//! In-memory drivers backed by `DashMap`.
//!
//! Intended for tests and single-process deployments. Nothing is persisted.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use keystash_core::{CoreError, Result, normalize_utc, now_utc, validate_id};

use crate::delegation::{Delegation, DelegationDriver, RoleRef};
use crate::policy::{Policy, PolicyDriver, PolicyPatch};

#[derive(Debug, Default)]
pub struct InMemoryDelegationDriver {
    delegations: DashMap<String, Delegation>,
}

impl InMemoryDelegationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn list_where(&self, predicate: impl Fn(&Delegation) -> bool) -> Vec<Delegation> {
        let mut found: Vec<Delegation> = self
            .delegations
            .iter()
            .filter(|entry| !entry.is_deleted() && predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }
}

#[async_trait]
impl DelegationDriver for InMemoryDelegationDriver {
    async fn create_delegation(
        &self,
        id: &str,
        mut delegation: Delegation,
        roles: Vec<RoleRef>,
    ) -> Result<Delegation> {
        validate_id(id)?;
        if delegation.delegator_user_id.is_empty() {
            return Err(CoreError::validation("delegator_user_id", "delegation"));
        }
        if delegation.delegatee_user_id.is_empty() {
            return Err(CoreError::validation("delegatee_user_id", "delegation"));
        }

        delegation.id = id.to_string();
        delegation.expires_at = delegation.expires_at.map(normalize_utc);
        delegation.deleted_at = None;
        delegation.roles = roles;

        match self.delegations.entry(id.to_string()) {
            Entry::Occupied(_) => Err(CoreError::conflict(
                "delegation",
                format!("Duplicate ID, {id}."),
            )),
            Entry::Vacant(slot) => {
                slot.insert(delegation.clone());
                Ok(delegation)
            }
        }
    }

    async fn get_delegation(&self, id: &str) -> Result<Option<Delegation>> {
        let now = now_utc();
        Ok(self
            .delegations
            .get(id)
            .filter(|entry| entry.is_active_at(now))
            .map(|entry| entry.value().clone()))
    }

    async fn list_delegations(&self) -> Result<Vec<Delegation>> {
        Ok(self.list_where(|_| true))
    }

    async fn list_delegations_for_delegatee(
        &self,
        delegatee_user_id: &str,
    ) -> Result<Vec<Delegation>> {
        Ok(self.list_where(|d| d.delegatee_user_id == delegatee_user_id))
    }

    async fn list_delegations_for_delegator(
        &self,
        delegator_user_id: &str,
    ) -> Result<Vec<Delegation>> {
        Ok(self.list_where(|d| d.delegator_user_id == delegator_user_id))
    }

    async fn delete_delegation(&self, id: &str) -> Result<()> {
        match self.delegations.get_mut(id) {
            Some(mut entry) => {
                entry.deleted_at = Some(now_utc());
                Ok(())
            }
            None => Err(CoreError::not_found("delegation", id)),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPolicyDriver {
    policies: DashMap<String, Policy>,
}

impl InMemoryPolicyDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PolicyDriver for InMemoryPolicyDriver {
    async fn create_policy(&self, id: &str, mut policy: Policy) -> Result<Policy> {
        validate_id(id)?;
        policy.validate()?;
        policy.id = id.to_string();

        match self.policies.entry(id.to_string()) {
            Entry::Occupied(_) => Err(CoreError::conflict(
                "policy",
                format!("Duplicate ID, {id}."),
            )),
            Entry::Vacant(slot) => {
                slot.insert(policy.clone());
                Ok(policy)
            }
        }
    }

    async fn list_policies(&self) -> Result<Vec<Policy>> {
        let mut policies: Vec<Policy> = self
            .policies
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        policies.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(policies)
    }

    async fn get_policy(&self, id: &str) -> Result<Option<Policy>> {
        Ok(self.policies.get(id).map(|entry| entry.value().clone()))
    }

    async fn update_policy(&self, id: &str, patch: PolicyPatch) -> Result<Policy> {
        patch.check_id(id)?;
        let mut entry = self
            .policies
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found("policy", id))?;

        let mut updated = entry.value().clone();
        updated.apply(patch);
        updated.validate()?;
        *entry = updated.clone();
        Ok(updated)
    }

    async fn delete_policy(&self, id: &str) -> Result<()> {
        match self.policies.remove(id) {
            Some(_) => Ok(()),
            None => Err(CoreError::not_found("policy", id)),
        }
    }
}
