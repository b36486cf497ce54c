//! Redaction engine layers.
//!
//! [`Engine`] runs detection, conflict resolution and rewriting, and mints vault tokens.
//! [`PolicyAwareEngine`] adds caller-supplied policy rules on top of it, and
//! [`TenantAwareEngine`] adds per-tenant policies loaded from a [`PolicyStore`].

pub mod engine;
pub mod policy;
pub mod provider;
pub mod tenant;

pub use engine::{CUSTOM_LABEL, Engine};
pub use policy::PolicyAwareEngine;
pub use provider::RedactionProvider;
pub use redact_policy::{InMemoryPolicyStore, PolicyStore};
pub use tenant::TenantAwareEngine;
pub use tokio_util::sync::CancellationToken;
