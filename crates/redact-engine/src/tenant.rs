//! Tenant-aware decorator: per-tenant policies with a compiled-policy cache

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use redact_config::Config;
use redact_core::{
    EngineCapabilities, EngineStats, RedactError, RedactionRequest, RedactionResult, RestoreResult,
    Result, TenantPolicy, ValidationError,
};
use redact_detect::PatternSpec;
use redact_policy::{CompiledPolicy, InMemoryPolicyStore, PolicyStore};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::policy::PolicyAwareEngine;
use crate::provider::{RedactionProvider, ensure_active};

/// Cached tenant policy with its rules compiled
struct TenantEntry {
    policy: TenantPolicy,
    compiled: CompiledPolicy,
}

impl TenantEntry {
    fn new(policy: TenantPolicy) -> Self {
        let compiled = CompiledPolicy::compile(&policy.rules);
        Self { policy, compiled }
    }
}

/// Compiled policies plus a per-tenant generation, bumped by every write.
///
/// A reader that missed the cache only inserts what it fetched if the tenant's
/// generation is unchanged, so a concurrent set/delete/refresh is never overwritten.
#[derive(Default)]
struct PolicyCache {
    entries: HashMap<String, Arc<TenantEntry>>,
    generations: HashMap<String, u64>,
}

impl PolicyCache {
    fn generation(&self, tenant_id: &str) -> u64 {
        self.generations.get(tenant_id).copied().unwrap_or(0)
    }

    fn bump(&mut self, tenant_id: &str) {
        *self.generations.entry(tenant_id.to_string()).or_insert(0) += 1;
    }
}

pub struct TenantAwareEngine {
    inner: PolicyAwareEngine,
    store: Arc<dyn PolicyStore>,
    cache: RwLock<PolicyCache>,
    /// Serializes store writes with their cache updates
    writes: Mutex<()>,
}

impl TenantAwareEngine {
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self::from_engine(PolicyAwareEngine::new(), store)
    }

    pub fn with_config(config: &Config, store: Arc<dyn PolicyStore>) -> Self {
        Self::from_engine(PolicyAwareEngine::with_config(config), store)
    }

    pub fn from_engine(inner: PolicyAwareEngine, store: Arc<dyn PolicyStore>) -> Self {
        Self {
            inner,
            store,
            cache: RwLock::new(PolicyCache::default()),
            writes: Mutex::new(()),
        }
    }

    /// Engine backed by an [`InMemoryPolicyStore`]
    pub fn in_memory(config: &Config) -> Self {
        Self::with_config(config, Arc::new(InMemoryPolicyStore::new()))
    }

    pub fn policy_engine(&self) -> &PolicyAwareEngine {
        &self.inner
    }

    pub fn policy_engine_mut(&mut self) -> &mut PolicyAwareEngine {
        &mut self.inner
    }

    /// Redact under the tenant's policy. A tenant without a policy gets plain redaction.
    pub fn redact_for_tenant(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        request: &RedactionRequest,
    ) -> Result<RedactionResult> {
        ensure_active(cancel)?;
        require_tenant_id(tenant_id)?;

        let entry = match self.entry(tenant_id) {
            Ok(entry) => entry,
            Err(RedactError::PolicyNotFound(_)) => {
                debug!(tenant_id, "no tenant policy, using base redaction");
                return self.inner.redact(cancel, request);
            }
            Err(e) => return Err(e),
        };

        let request = tenant_request(tenant_id, &entry.policy, request);
        self.inner.apply_compiled(cancel, &request, &entry.compiled, None)
    }

    pub fn get_tenant_policy(&self, tenant_id: &str) -> Result<TenantPolicy> {
        require_tenant_id(tenant_id)?;
        Ok(self.entry(tenant_id)?.policy.clone())
    }

    /// Validate, persist and cache a tenant policy
    pub fn set_tenant_policy(&self, tenant_id: &str, mut policy: TenantPolicy) -> Result<()> {
        require_tenant_id(tenant_id)?;

        if policy.tenant_id.is_empty() {
            policy.tenant_id = tenant_id.to_string();
        }
        if policy.tenant_id != tenant_id {
            return Err(RedactError::InvalidInput(format!(
                "policy tenant ID ({}) does not match provided tenant ID ({})",
                policy.tenant_id, tenant_id
            )));
        }

        let errors = validate_tenant_policy(&self.inner, &policy);
        if !errors.is_empty() {
            return Err(RedactError::ValidationFailed(errors));
        }

        let _writing = self.writes.lock();
        self.store.set(tenant_id, policy)?;
        // Re-read so the cache carries the store's timestamps
        let stored = self.store.get(tenant_id)?;
        self.replace_entry(tenant_id, Some(stored));

        info!(tenant_id, "tenant policy updated");
        Ok(())
    }

    pub fn delete_tenant_policy(&self, tenant_id: &str) -> Result<()> {
        require_tenant_id(tenant_id)?;
        let _writing = self.writes.lock();
        self.store.delete(tenant_id)?;
        self.replace_entry(tenant_id, None);
        info!(tenant_id, "tenant policy deleted");
        Ok(())
    }

    pub fn list_tenants(&self) -> Result<Vec<String>> {
        self.store.list()
    }

    /// Reload one tenant's policy from the store, replacing the cached copy
    pub fn refresh_tenant_policy(&self, tenant_id: &str) -> Result<()> {
        require_tenant_id(tenant_id)?;
        let _writing = self.writes.lock();
        match self.store.get(tenant_id) {
            Ok(policy) => {
                self.replace_entry(tenant_id, Some(policy));
                Ok(())
            }
            Err(e) => {
                self.replace_entry(tenant_id, None);
                Err(e)
            }
        }
    }

    pub fn clear_policy_cache(&self) {
        self.cache.write().entries.clear();
    }

    pub fn cached_tenant_count(&self) -> usize {
        self.cache.read().entries.len()
    }

    /// Install (or drop) a tenant's cached entry and invalidate in-flight reads
    fn replace_entry(&self, tenant_id: &str, policy: Option<TenantPolicy>) {
        let entry = policy.map(|policy| Arc::new(TenantEntry::new(policy)));
        let mut cache = self.cache.write();
        match entry {
            Some(entry) => cache.entries.insert(tenant_id.to_string(), entry),
            None => cache.entries.remove(tenant_id),
        };
        cache.bump(tenant_id);
    }

    fn entry(&self, tenant_id: &str) -> Result<Arc<TenantEntry>> {
        loop {
            let generation = {
                let cache = self.cache.read();
                if let Some(entry) = cache.entries.get(tenant_id) {
                    return Ok(Arc::clone(entry));
                }
                cache.generation(tenant_id)
            };

            // Store read and compile happen without any lock held
            let fetched = self
                .store
                .get(tenant_id)
                .map(|policy| Arc::new(TenantEntry::new(policy)));

            let mut cache = self.cache.write();
            if cache.generation(tenant_id) != generation {
                debug!(tenant_id, "tenant policy changed during load, retrying");
                continue;
            }
            let entry = fetched?;
            cache
                .entries
                .insert(tenant_id.to_string(), Arc::clone(&entry));
            return Ok(entry);
        }
    }
}

impl RedactionProvider for TenantAwareEngine {
    fn redact(&self, cancel: &CancellationToken, request: &RedactionRequest) -> Result<RedactionResult> {
        self.inner.redact(cancel, request)
    }

    fn restore(&self, cancel: &CancellationToken, token: &str) -> Result<RestoreResult> {
        self.inner.restore(cancel, token)
    }

    fn capabilities(&self) -> EngineCapabilities {
        let mut caps = self
            .inner
            .capabilities()
            .with_feature("multi_tenant")
            .with_feature("tenant_policies")
            .with_feature("policy_caching")
            .with_feature("policy_persistence");
        caps.name = "TenantAwareEngine".to_string();
        caps.supports_multi_tenant = true;
        caps
    }

    fn stats(&self) -> EngineStats {
        self.inner.stats()
    }

    fn cleanup(&self, cancel: &CancellationToken) -> Result<usize> {
        self.inner.cleanup(cancel)
    }
}

fn require_tenant_id(tenant_id: &str) -> Result<()> {
    if tenant_id.trim().is_empty() {
        return Err(RedactError::InvalidInput("tenant ID cannot be empty".to_string()));
    }
    Ok(())
}

/// Fold tenant defaults into a copy of the caller's request
fn tenant_request(tenant_id: &str, policy: &TenantPolicy, request: &RedactionRequest) -> RedactionRequest {
    let mut request = request.clone();

    request.custom_patterns.extend(policy.custom_patterns.iter().cloned());
    if request.mode.is_none() {
        request.mode = policy.default_mode;
    }

    let context = request.context.get_or_insert_with(Default::default);
    for requirement in &policy.compliance_reqs {
        if !context.compliance_reqs.contains(requirement) {
            context.compliance_reqs.push(requirement.clone());
        }
    }
    context
        .metadata
        .insert("tenant_id".to_string(), Value::String(tenant_id.to_string()));
    context.metadata.insert(
        "tenant_policy_version".to_string(),
        Value::String(policy.version.clone()),
    );

    request
}

fn validate_tenant_policy(engine: &PolicyAwareEngine, policy: &TenantPolicy) -> Vec<ValidationError> {
    let mut errors = engine.validate_policy(&policy.rules);

    for (i, custom) in policy.custom_patterns.iter().enumerate() {
        if let Err(e) = PatternSpec::compile(custom.name.as_str().into(), &custom.pattern) {
            errors.push(ValidationError::new(
                &custom.name,
                Some(format!("custom_patterns[{}]", i)),
                e.to_string(),
                redact_policy::validate::INVALID_REGEX,
            ));
        }
    }

    errors
}
