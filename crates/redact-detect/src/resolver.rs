//! Reduces overlapping candidates to a non-overlapping set

use std::cmp::Ordering;

use redact_core::Redaction;
use tracing::debug;

use crate::patterns::type_priority;

/// Longer span wins; equal length falls back to type priority. Ties keep the incumbent.
fn outranks(candidate: &Redaction, incumbent: &Redaction) -> bool {
    match candidate.len().cmp(&incumbent.len()) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => {
            type_priority(&candidate.redaction_type) > type_priority(&incumbent.redaction_type)
        }
    }
}

/// Resolve candidates so that no two results overlap.
///
/// Candidates are visited by ascending start (stable, so pattern order breaks equal starts).
/// A candidate is compared against every accepted span it overlaps and is admitted only if
/// it outranks all of them, in which case all of them are evicted.
pub fn resolve(mut candidates: Vec<Redaction>) -> Vec<Redaction> {
    candidates.sort_by_key(|c| c.start);

    let total = candidates.len();
    let mut accepted: Vec<Redaction> = Vec::with_capacity(total);

    for candidate in candidates {
        let overlapping: Vec<usize> = accepted
            .iter()
            .enumerate()
            .filter(|(_, a)| candidate.overlaps(a))
            .map(|(i, _)| i)
            .collect();

        if overlapping.is_empty() {
            accepted.push(candidate);
            continue;
        }

        if overlapping.iter().all(|&i| outranks(&candidate, &accepted[i])) {
            for &i in overlapping.iter().rev() {
                accepted.remove(i);
            }
            accepted.push(candidate);
        }
    }

    accepted.sort_by_key(|r| r.start);
    debug!(candidates = total, accepted = accepted.len(), "resolved conflicts");
    accepted
}

/// True when no two redactions intersect
pub fn is_non_overlapping(redactions: &[Redaction]) -> bool {
    redactions
        .iter()
        .enumerate()
        .all(|(i, a)| redactions[i + 1..].iter().all(|b| !a.overlaps(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use redact_core::RedactionType;

    fn candidate(redaction_type: RedactionType, start: usize, end: usize) -> Redaction {
        Redaction {
            redaction_type,
            start,
            end,
            original: "x".repeat(end - start),
            replacement: String::new(),
            confidence: 0.95,
            context: String::new(),
            rule: None,
        }
    }

    fn spans(redactions: &[Redaction]) -> Vec<(usize, usize)> {
        redactions.iter().map(|r| (r.start, r.end)).collect()
    }

    #[test]
    fn test_no_overlap_keeps_all() {
        let resolved = resolve(vec![
            candidate(RedactionType::EMAIL, 20, 30),
            candidate(RedactionType::PHONE, 0, 10),
            candidate(RedactionType::SSN, 10, 20),
        ]);
        assert_eq!(spans(&resolved), vec![(0, 10), (10, 20), (20, 30)]);
    }

    #[test]
    fn test_multi_overlap_chain() {
        let resolved = resolve(vec![
            candidate(RedactionType::EMAIL, 0, 10),
            candidate(RedactionType::PHONE, 15, 25),
            candidate(RedactionType::SSN, 20, 30),
            candidate(RedactionType::CREDIT_CARD, 25, 42),
        ]);
        assert!(is_non_overlapping(&resolved));
        assert_eq!(spans(&resolved), vec![(0, 10), (25, 42)]);
        assert_eq!(resolved[1].redaction_type, RedactionType::CREDIT_CARD);
    }

    #[test]
    fn test_long_span_swallows_nested() {
        let resolved = resolve(vec![
            candidate(RedactionType::PHONE, 0, 12),
            candidate(RedactionType::SSN, 14, 25),
            candidate(RedactionType::CREDIT_CARD, 5, 24),
        ]);
        assert_eq!(spans(&resolved), vec![(5, 24)]);
    }

    #[test]
    fn test_shorter_candidate_discarded() {
        let resolved = resolve(vec![
            candidate(RedactionType::UK_PASSPORT_NUMBER, 8, 14),
            candidate(RedactionType::LINK, 0, 30),
        ]);
        assert_eq!(spans(&resolved), vec![(0, 30)]);

        let resolved = resolve(vec![
            candidate(RedactionType::PHONE, 0, 4),
            candidate(RedactionType::EMAIL, 2, 12),
            candidate(RedactionType::SSN, 6, 30),
        ]);
        assert_eq!(spans(&resolved), vec![(6, 30)]);
    }

    #[test]
    fn test_priority_breaks_length_tie() {
        let resolved = resolve(vec![
            candidate(RedactionType::PHONE, 5, 20),
            candidate(RedactionType::UK_PHONE_NUMBER, 5, 20),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].redaction_type, RedactionType::UK_PHONE_NUMBER);

        // Order of arrival does not matter
        let resolved = resolve(vec![
            candidate(RedactionType::UK_PHONE_NUMBER, 5, 20),
            candidate(RedactionType::PHONE, 5, 20),
        ]);
        assert_eq!(resolved[0].redaction_type, RedactionType::UK_PHONE_NUMBER);
    }

    #[test]
    fn test_length_beats_priority() {
        let resolved = resolve(vec![
            candidate(RedactionType::ZIP_CODE, 0, 5),
            candidate(RedactionType::SSN, 0, 11),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].redaction_type, RedactionType::SSN);
    }

    #[test]
    fn test_full_tie_keeps_first() {
        let resolved = resolve(vec![
            candidate(RedactionType::from("custom_id"), 3, 12),
            candidate(RedactionType::from("other_id"), 3, 12),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].redaction_type.as_str(), "custom_id");
    }

    #[test]
    fn test_adjacent_spans_do_not_conflict() {
        let resolved = resolve(vec![
            candidate(RedactionType::DATE, 0, 10),
            candidate(RedactionType::TIME, 10, 15),
        ]);
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(resolve(Vec::new()).is_empty());
    }
}
