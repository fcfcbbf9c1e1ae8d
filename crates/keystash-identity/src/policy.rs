//! Policy blobs attached to service endpoints.

use async_trait::async_trait;
use keystash_core::{CoreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub id: String,
    pub endpoint_id: String,
    pub blob: Value,
    #[serde(rename = "type")]
    pub policy_type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl Policy {
    pub fn new(endpoint_id: impl Into<String>, policy_type: impl Into<String>, blob: Value) -> Self {
        Self {
            id: String::new(),
            endpoint_id: endpoint_id.into(),
            blob,
            policy_type: policy_type.into(),
            extra: Map::new(),
        }
    }

    /// Reject policies missing a required attribute.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint_id.is_empty() {
            return Err(CoreError::validation("endpoint_id", "policy"));
        }
        if self.policy_type.is_empty() {
            return Err(CoreError::validation("type", "policy"));
        }
        if self.blob.is_null() {
            return Err(CoreError::validation("blob", "policy"));
        }
        Ok(())
    }

    /// Merge `patch` over this policy. `extra` keys are merged one by one.
    pub fn apply(&mut self, patch: PolicyPatch) {
        if let Some(endpoint_id) = patch.endpoint_id {
            self.endpoint_id = endpoint_id;
        }
        if let Some(blob) = patch.blob {
            self.blob = blob;
        }
        if let Some(policy_type) = patch.policy_type {
            self.policy_type = policy_type;
        }
        self.extra.extend(patch.extra);
    }
}

/// Partial update of a [`Policy`]. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<Value>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub policy_type: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl PolicyPatch {
    /// Fails when the patch tries to move the policy to another id.
    pub fn check_id(&self, policy_id: &str) -> Result<()> {
        match &self.id {
            Some(id) if id != policy_id => Err(CoreError::invalid_request("Cannot change policy ID")),
            _ => Ok(()),
        }
    }
}

/// Storage backend for policies.
#[async_trait]
pub trait PolicyDriver: Send + Sync {
    /// Fails with `Conflict` when `id` is taken.
    async fn create_policy(&self, id: &str, policy: Policy) -> Result<Policy>;

    async fn list_policies(&self) -> Result<Vec<Policy>>;

    async fn get_policy(&self, id: &str) -> Result<Option<Policy>>;

    /// Merge `patch` over the stored policy. Fails with `NotFound`.
    async fn update_policy(&self, id: &str, patch: PolicyPatch) -> Result<Policy>;

    /// Fails with `NotFound`.
    async fn delete_policy(&self, id: &str) -> Result<()>;
}
