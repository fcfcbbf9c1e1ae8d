//! Delegations: one user acting on behalf of another within a project.

use async_trait::async_trait;
use keystash_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// Reference to a role granted through a delegation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    pub id: String,
}

impl RoleRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delegation {
    #[serde(default)]
    pub id: String,
    pub delegator_user_id: String,
    pub delegatee_user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub impersonation: bool,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub deleted_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub roles: Vec<RoleRef>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl Delegation {
    pub fn new(delegator_user_id: impl Into<String>, delegatee_user_id: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            delegator_user_id: delegator_user_id.into(),
            delegatee_user_id: delegatee_user_id.into(),
            project_id: None,
            impersonation: false,
            expires_at: None,
            deleted_at: None,
            roles: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: OffsetDateTime) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_impersonation(mut self, impersonation: bool) -> Self {
        self.impersonation = impersonation;
        self
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Expired delegations are treated as nonexistent by readers.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }

    /// Visible to readers at `now`: neither deleted nor expired.
    pub fn is_active_at(&self, now: OffsetDateTime) -> bool {
        !self.is_deleted() && !self.is_expired_at(now)
    }
}

/// Storage backend for delegations.
#[async_trait]
pub trait DelegationDriver: Send + Sync {
    /// Store a new delegation under `id` with the given roles.
    ///
    /// Fails with `Conflict` when `id` is taken. An `expires_at` carrying an
    /// offset is stored as UTC.
    async fn create_delegation(
        &self,
        id: &str,
        delegation: Delegation,
        roles: Vec<RoleRef>,
    ) -> Result<Delegation>;

    /// `None` when missing, soft-deleted, or expired.
    async fn get_delegation(&self, id: &str) -> Result<Option<Delegation>>;

    /// All delegations that have not been deleted.
    async fn list_delegations(&self) -> Result<Vec<Delegation>>;

    async fn list_delegations_for_delegatee(&self, delegatee_user_id: &str)
    -> Result<Vec<Delegation>>;

    async fn list_delegations_for_delegator(&self, delegator_user_id: &str)
    -> Result<Vec<Delegation>>;

    /// Soft delete. Fails with `NotFound` when `id` was never created.
    async fn delete_delegation(&self, id: &str) -> Result<()>;
}
