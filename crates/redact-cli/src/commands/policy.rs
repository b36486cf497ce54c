use anyhow::{Result, bail};
use redact_config::Config;
use redact_core::RedactError;
use redact_engine::TenantAwareEngine;

use super::load_policy_file;
use crate::cli::PolicyCommands;

pub fn handle(cmd: PolicyCommands, config: &Config) -> Result<()> {
    match cmd {
        PolicyCommands::Validate { file } => {
            let mut policy = load_policy_file(&file)?;
            let rules = policy.rules.len();
            let tenant_id = "validate";
            policy.tenant_id = tenant_id.to_string();

            // Same checks a tenant policy goes through: rules and custom pattern regexes
            let engine = TenantAwareEngine::in_memory(config);
            match engine.set_tenant_policy(tenant_id, policy) {
                Ok(()) => {
                    println!("✓ {} rule(s) valid in {}", rules, file.display());
                    Ok(())
                }
                Err(RedactError::ValidationFailed(errors)) => {
                    for error in &errors {
                        println!("✗ {}", error);
                    }
                    bail!("{} validation error(s) in {}", errors.len(), file.display());
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}
