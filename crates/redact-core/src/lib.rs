//! Core domain models for the redaction engine
//!
//! This crate contains:
//! - Detection results (Redaction, RedactionResult, RestoreResult)
//! - Request models (RedactionRequest, RequestContext, CustomPattern)
//! - Policy models (PolicyRule, PolicyCondition, TenantPolicy)
//! - The shared error taxonomy

pub mod capabilities;
pub mod error;
pub mod mode;
pub mod policy;
pub mod redaction;
pub mod request;

pub use capabilities::{EngineCapabilities, EngineStats};
pub use error::{RedactError, Result};
pub use mode::Mode;
pub use policy::{
    ConditionOperator, PolicyCondition, PolicyRequest, PolicyRule, TenantPolicy, ValidationError,
};
pub use redaction::{Redaction, RedactionResult, RedactionType, RestoreResult};
pub use request::{CustomPattern, RedactionRequest, RequestContext};
