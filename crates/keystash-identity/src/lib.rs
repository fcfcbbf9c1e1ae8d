//! Delegation and policy services for keystash.
//!
//! Each service pairs a storage driver with a [`keystash_cache::CacheRouter`]:
//! reads of a single record are memoized, mutations revoke everything cached
//! under the service's prefix before they run.

pub mod delegation;
pub mod manager;
pub mod memory;
pub mod policy;

pub use delegation::{Delegation, DelegationDriver, RoleRef};
pub use manager::{DELEGATION_PREFIX, DelegationManager, POLICY_PREFIX, PolicyManager};
pub use memory::{InMemoryDelegationDriver, InMemoryPolicyDriver};
pub use policy::{Policy, PolicyDriver, PolicyPatch};
