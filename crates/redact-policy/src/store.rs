//! Tenant policy persistence boundary

use std::collections::HashMap;

use parking_lot::RwLock;
use redact_core::{RedactError, Result, TenantPolicy};
use time::OffsetDateTime;

/// Storage for per-tenant policies. Implementations must be safe to share across threads.
pub trait PolicyStore: Send + Sync {
    /// Fails with `PolicyNotFound` when the tenant has no policy
    fn get(&self, tenant_id: &str) -> Result<TenantPolicy>;

    fn set(&self, tenant_id: &str, policy: TenantPolicy) -> Result<()>;

    fn delete(&self, tenant_id: &str) -> Result<()>;

    fn list(&self) -> Result<Vec<String>>;
}

/// Process-local store, mainly for tests and single-node use
#[derive(Default)]
pub struct InMemoryPolicyStore {
    policies: RwLock<HashMap<String, TenantPolicy>>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PolicyStore for InMemoryPolicyStore {
    fn get(&self, tenant_id: &str) -> Result<TenantPolicy> {
        self.policies
            .read()
            .get(tenant_id)
            .cloned()
            .ok_or_else(|| RedactError::PolicyNotFound(tenant_id.to_string()))
    }

    fn set(&self, tenant_id: &str, mut policy: TenantPolicy) -> Result<()> {
        let now = OffsetDateTime::now_utc();
        policy.created_at.get_or_insert(now);
        policy.updated_at = Some(now);

        self.policies.write().insert(tenant_id.to_string(), policy);
        Ok(())
    }

    fn delete(&self, tenant_id: &str) -> Result<()> {
        self.policies.write().remove(tenant_id);
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut tenants: Vec<String> = self.policies.read().keys().cloned().collect();
        tenants.sort();
        Ok(tenants)
    }
}
