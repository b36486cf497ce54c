//! Runs patterns over text and emits raw, possibly overlapping candidates

use redact_core::{Mode, Redaction};
use tracing::debug;

use crate::patterns::PatternSpec;

/// Bytes of surrounding text kept on each side of a match
pub const CONTEXT_WINDOW: usize = 20;

#[derive(Debug, Clone)]
pub struct Detector {
    /// Candidates below this confidence are dropped
    pub min_confidence: f64,
    pub context_window: usize,
}

impl Default for Detector {
    fn default() -> Self {
        Self {
            min_confidence: 0.0,
            context_window: CONTEXT_WINDOW,
        }
    }
}

impl Detector {
    pub fn new(min_confidence: f64) -> Self {
        Self {
            min_confidence,
            ..Default::default()
        }
    }

    /// One candidate per regex match, in pattern order then match order.
    ///
    /// `mode` is the request's mode; a pattern pinned to a rule mode keeps its own.
    pub fn detect<'a, I>(&self, text: &str, patterns: I, mode: Mode) -> Vec<Redaction>
    where
        I: IntoIterator<Item = &'a PatternSpec>,
    {
        let mut candidates = Vec::new();

        for spec in patterns {
            if spec.confidence < self.min_confidence {
                continue;
            }

            let before = candidates.len();
            for m in spec.regex.find_iter(text) {
                // Zero-width matches carry nothing to redact
                if m.start() == m.end() {
                    continue;
                }

                candidates.push(Redaction {
                    redaction_type: spec.redaction_type.clone(),
                    start: m.start(),
                    end: m.end(),
                    original: m.as_str().to_string(),
                    replacement: replacement_for(spec, m.as_str(), mode),
                    confidence: spec.confidence,
                    context: extract_context(text, m.start(), m.end(), self.context_window),
                    rule: spec.rule.clone(),
                });
            }

            let found = candidates.len() - before;
            if found > 0 {
                debug!(redaction_type = %spec.redaction_type, matches = found, "pattern matched");
            }
        }

        candidates
    }
}

/// Replacement string for one match.
///
/// Tokenize/hash/encrypt produce labelled placeholders only. The vault token, when
/// requested, covers the whole original text instead.
pub fn replacement_for(spec: &PatternSpec, matched: &str, request_mode: Mode) -> String {
    match spec.mode.unwrap_or(request_mode) {
        Mode::Replace | Mode::Llm => spec.label.clone(),
        Mode::Mask => "*".repeat(matched.chars().count()),
        Mode::Remove => String::new(),
        Mode::Tokenize => format!("[TOKEN_{}]", spec.tag),
        Mode::Hash => format!("[HASH_{}]", spec.tag),
        Mode::Encrypt => format!("[ENCRYPTED_{}]", spec.tag),
    }
}

/// Text within `window` bytes of `[start, end)`, widened to the nearest char boundaries
pub fn extract_context(text: &str, start: usize, end: usize, window: usize) -> String {
    let mut from = start.saturating_sub(window);
    while from > 0 && !text.is_char_boundary(from) {
        from -= 1;
    }

    let mut to = end.saturating_add(window).min(text.len());
    while to < text.len() && !text.is_char_boundary(to) {
        to += 1;
    }

    text.get(from..to).unwrap_or_default().to_string()
}
