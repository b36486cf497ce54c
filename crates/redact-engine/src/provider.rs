//! Common surface of every engine layer

use redact_core::{
    EngineCapabilities, EngineStats, RedactError, RedactionRequest, RedactionResult, RestoreResult,
    Result,
};
use tokio_util::sync::CancellationToken;

/// Trait implemented by the base engine and each decorator around it
pub trait RedactionProvider: Send + Sync {
    fn redact(&self, cancel: &CancellationToken, request: &RedactionRequest) -> Result<RedactionResult>;

    /// Recover the original text behind a token
    fn restore(&self, cancel: &CancellationToken, token: &str) -> Result<RestoreResult>;

    fn capabilities(&self) -> EngineCapabilities;

    fn stats(&self) -> EngineStats;

    /// Sweep expired tokens, returning how many were removed
    fn cleanup(&self, cancel: &CancellationToken) -> Result<usize>;
}

pub(crate) fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(RedactError::Cancelled);
    }
    Ok(())
}
