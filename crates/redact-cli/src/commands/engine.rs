use anyhow::{Result, bail};
use redact_config::Config;
use redact_core::{RedactionRequest, RedactionType};
use redact_detect::{replacement_label, type_priority};
use redact_engine::{CancellationToken, Engine, RedactionProvider};

use crate::cli::EngineCommands;

pub fn handle(cmd: EngineCommands, config: &Config) -> Result<()> {
    let engine = Engine::with_config(config);

    match cmd {
        EngineCommands::Stats => stats(&engine),
        EngineCommands::Patterns => patterns(&engine),
        EngineCommands::Cleanup => cleanup(&engine),
        EngineCommands::RotateKeys => rotate_keys(&engine),
        EngineCommands::Test => self_test(&engine),
    }
}

fn stats(engine: &Engine) -> Result<()> {
    let stats = engine.stats();
    let caps = engine.capabilities();

    println!("Engine: {} {}", caps.name, caps.version);
    println!("  Active patterns: {}", stats.active_patterns);
    println!("  Max text length: {} bytes", caps.max_text_length);
    println!("  Tokens: {}", stats.total_tokens);
    println!("  Key version: {} ({} retained)", stats.key_version, stats.retained_keys);
    for (version, count) in &stats.tokens_by_key_version {
        println!("    v{}: {} token(s)", version, count);
    }
    Ok(())
}

fn patterns(engine: &Engine) -> Result<()> {
    let mut types = engine.active_types();
    types.sort_by_key(|t| std::cmp::Reverse(type_priority(t)));

    println!("{:<24} {:>8}  LABEL", "TYPE", "PRIORITY");
    for redaction_type in &types {
        println!(
            "{:<24} {:>8}  {}",
            redaction_type.as_str(),
            type_priority(redaction_type),
            replacement_label(redaction_type)
        );
    }
    println!("\n{} active pattern(s)", types.len());
    Ok(())
}

fn cleanup(engine: &Engine) -> Result<()> {
    let removed = engine.cleanup(&CancellationToken::new())?;
    println!("✓ Removed {} expired token(s)", removed);
    println!("  (in-process vault: tokens from earlier runs are not visible)");
    Ok(())
}

fn rotate_keys(engine: &Engine) -> Result<()> {
    let version = engine.rotate_keys(&CancellationToken::new())?;
    println!("✓ Rotated master key to version {}", version);
    println!("  (in-process vault: the rotation is discarded when this command exits)");
    Ok(())
}

/// Sample inputs and the type each must be redacted as
const SELF_TEST_CASES: &[(&str, &str)] = &[
    ("Email me at jane.doe@example.com", "email"),
    ("Call 555-123-4567 today", "phone"),
    ("Card 4111-1111-1111-1111", "credit_card"),
    ("SSN: 123-45-6789", "ssn"),
    ("Server 192.168.1.1", "ip_address"),
    ("NI: AB123456C", "uk_national_insurance"),
    ("Postcode SW1A 1AA", "uk_postcode"),
];

fn self_test(engine: &Engine) -> Result<()> {
    let cancel = CancellationToken::new();
    let mut failures = 0;

    for (text, expected) in SELF_TEST_CASES {
        let expected = RedactionType::from_static(*expected);
        let result = engine.redact(&cancel, &RedactionRequest::new(*text))?;
        if result.count_of(&expected) > 0 {
            println!("✓ {:<24} {}", expected.as_str(), result.redacted_text);
        } else {
            failures += 1;
            println!("✗ {:<24} {}", expected.as_str(), result.redacted_text);
        }
    }

    let sample = SELF_TEST_CASES[0].0;
    let result = engine.redact(&cancel, &RedactionRequest::new(sample).reversible(None))?;
    let token = result.token.unwrap_or_default();
    let restores = |engine: &Engine| -> Result<bool> {
        Ok(!token.is_empty() && engine.restore(&cancel, &token)?.original_text == sample)
    };

    if restores(engine)? {
        println!("✓ {:<24} restored original text", "token_round_trip");
    } else {
        failures += 1;
        println!("✗ {:<24} token did not restore", "token_round_trip");
    }

    let version = engine.rotate_keys(&cancel)?;
    if restores(engine)? {
        println!("✓ {:<24} token still restores at key version {}", "key_rotation", version);
    } else {
        failures += 1;
        println!("✗ {:<24} token lost after rotating to version {}", "key_rotation", version);
    }

    let removed = engine.cleanup(&cancel)?;
    if removed == 0 && engine.stats().total_tokens == 1 {
        println!("✓ {:<24} live token kept", "cleanup");
    } else {
        failures += 1;
        println!("✗ {:<24} removed {} live token(s)", "cleanup", removed);
    }

    if failures > 0 {
        bail!("{} self-test check(s) failed", failures);
    }
    println!("\nAll checks passed");
    Ok(())
}
