use anyhow::{Context, Result};
use redact_config::Config;
use redact_core::{RedactionRequest, RedactionResult, RedactionType, RequestContext};
use redact_engine::{CancellationToken, RedactionProvider, TenantAwareEngine};
use std::io::Read;
use std::time::Duration;

use super::load_policy_file;
use crate::cli::{OutputFormat, RedactArgs};

/// Tenant the CLI registers a `--policy` file under
const LOCAL_TENANT: &str = "local";

pub fn handle(args: RedactArgs, config: &Config) -> Result<()> {
    let text = read_input(&args)?;
    let engine = TenantAwareEngine::in_memory(config);
    let cancel = CancellationToken::new();

    let mut request = RedactionRequest::new(text)
        .with_types(args.types.iter().map(|t| RedactionType::from(t.as_str())).collect());
    request.mode = args.mode;
    if args.reversible {
        request = request.reversible(args.ttl.map(Duration::from_secs));
    }
    if let Some(field) = &args.field {
        request = request.with_context(RequestContext::for_field(field.as_str()));
    }

    let result = match &args.policy {
        Some(path) => {
            let mut policy = load_policy_file(path)?;
            policy.tenant_id = LOCAL_TENANT.to_string();
            engine
                .set_tenant_policy(LOCAL_TENANT, policy)
                .context("Policy file rejected")?;
            engine.redact_for_tenant(&cancel, LOCAL_TENANT, &request)?
        }
        None => engine.redact(&cancel, &request)?,
    };

    for warning in &result.warnings {
        tracing::warn!("{}", warning);
    }

    let rendered = match args.format {
        OutputFormat::Text => render_text(&result),
        OutputFormat::Json => {
            let mut value = serde_json::to_value(&result)?;
            if args.stats {
                value["stats"] = serde_json::to_value(engine.stats())?;
            }
            serde_json::to_string_pretty(&value)?
        }
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("✓ Wrote redacted output to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    if args.stats && matches!(args.format, OutputFormat::Text) {
        print_summary(&result);
    }

    Ok(())
}

fn read_input(args: &RedactArgs) -> Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.input {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read stdin")?;
    Ok(text)
}

fn render_text(result: &RedactionResult) -> String {
    match &result.token {
        Some(token) => format!("{}\ntoken: {}", result.redacted_text, token),
        None => result.redacted_text.clone(),
    }
}

/// Per-type counts, on stderr
fn print_summary(result: &RedactionResult) {
    let mut counts = std::collections::BTreeMap::new();
    for redaction in &result.redactions {
        *counts.entry(redaction.redaction_type.as_str()).or_insert(0usize) += 1;
    }

    eprintln!("\n{} redaction(s)", result.redactions.len());
    for (redaction_type, count) in counts {
        eprintln!("  {:<24} {}", redaction_type, count);
    }
}
