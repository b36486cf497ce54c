//! Policy rules: condition evaluation, field scoping, validation and tenant storage

pub mod conditions;
pub mod engine;
pub mod store;
pub mod validate;

pub use conditions::{CompiledCondition, evaluate, field_value};
pub use engine::{CompiledPolicy, CompiledRule, RULE_CONFIDENCE, field_matches};
pub use store::{InMemoryPolicyStore, PolicyStore};
pub use validate::{validate, validate_rule};
