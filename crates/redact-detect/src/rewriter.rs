//! Applies resolved redactions to the original text

use redact_core::Redaction;
use tracing::warn;

/// Splice every replacement into `text`, right to left.
///
/// Offsets refer to the original text. Working from the highest start down keeps every
/// remaining span valid without offset bookkeeping. Spans that fall outside the text, split
/// a UTF-8 sequence, or overlap an already applied span are skipped.
pub fn rewrite(text: &str, redactions: &[Redaction]) -> String {
    let mut ordered: Vec<&Redaction> = redactions.iter().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    let mut output = text.to_string();
    let mut floor = text.len();

    for redaction in ordered {
        let valid = redaction.start <= redaction.end
            && redaction.end <= floor
            && text.is_char_boundary(redaction.start)
            && text.is_char_boundary(redaction.end);

        if !valid {
            warn!(
                redaction_type = %redaction.redaction_type,
                start = redaction.start,
                end = redaction.end,
                "skipping invalid redaction span"
            );
            continue;
        }

        output.replace_range(redaction.start..redaction.end, &redaction.replacement);
        floor = redaction.start;
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use redact_core::RedactionType;

    fn redaction(text: &str, needle: &str, replacement: &str) -> Redaction {
        let start = text.find(needle).unwrap();
        Redaction {
            redaction_type: RedactionType::CUSTOM,
            start,
            end: start + needle.len(),
            original: needle.to_string(),
            replacement: replacement.to_string(),
            confidence: 0.95,
            context: String::new(),
            rule: None,
        }
    }

    #[test]
    fn test_rewrite_any_input_order() {
        let text = "alice@example.com called 555-123-4567";
        let a = redaction(text, "alice@example.com", "[EMAIL_REDACTED]");
        let b = redaction(text, "555-123-4567", "[PHONE_REDACTED]");

        let expected = "[EMAIL_REDACTED] called [PHONE_REDACTED]";
        assert_eq!(rewrite(text, &[a.clone(), b.clone()]), expected);
        assert_eq!(rewrite(text, &[b, a]), expected);
    }

    #[test]
    fn test_rewrite_length_changes() {
        let text = "id 12345 and 678";
        let long = redaction(text, "12345", "[A_MUCH_LONGER_PLACEHOLDER]");
        let gone = redaction(text, "678", "");
        assert_eq!(rewrite(text, &[long, gone]), "id [A_MUCH_LONGER_PLACEHOLDER] and ");
    }

    #[test]
    fn test_rewrite_no_redactions() {
        assert_eq!(rewrite("nothing here", &[]), "nothing here");
    }

    #[test]
    fn test_rewrite_skips_out_of_range_span() {
        let text = "short";
        let mut bad = redaction(text, "short", "X");
        bad.end = 99;
        assert_eq!(rewrite(text, &[bad]), "short");
    }

    #[test]
    fn test_rewrite_skips_split_char() {
        let text = "naïve secret";
        let mut bad = redaction(text, "ï", "?");
        bad.end = bad.start + 1;
        let good = redaction(text, "secret", "[S]");
        assert_eq!(rewrite(text, &[bad, good]), "naïve [S]");
    }

    #[test]
    fn test_rewrite_skips_overlapping_span() {
        let text = "0123456789";
        let mut first = redaction(text, "234", "A");
        first.end = 6;
        let second = redaction(text, "456", "B");
        // second (start 4) applies first, then first (2..6) reaches into it
        assert_eq!(rewrite(text, &[first, second]), "0123B789");
    }
}
