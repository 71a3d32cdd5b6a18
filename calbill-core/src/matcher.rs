//! Fuzzy matching of free text against customers and appointment types.
//!
//! Scores use the partial-ratio metric: the best indel similarity between
//! the shorter string and any same-length window of the longer one, so a
//! name that appears verbatim inside a longer summary scores 100.

use rapidfuzz::distance::indel;

use crate::error::{CalBillError, CalBillResult};
use crate::model::{AppointmentType, Customer};
use crate::store::{DEFAULT_NAME, Store};

/// Scores at or below this are not trusted.
pub const MATCH_THRESHOLD: f64 = 85.0;

/// Something that can be matched by name.
pub trait Candidate {
    fn name(&self) -> &str;
    fn alt_name(&self) -> Option<&str>;
}

impl Candidate for Customer {
    fn name(&self) -> &str {
        &self.name
    }

    fn alt_name(&self) -> Option<&str> {
        self.alt_name.as_deref()
    }
}

impl Candidate for AppointmentType {
    fn name(&self) -> &str {
        &self.name
    }

    fn alt_name(&self) -> Option<&str> {
        self.alt_name.as_deref()
    }
}

/// Result of resolving free text to an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a, T> {
    pub entity: &'a T,
    /// Present when the match fell back to the `Default` entity
    pub note: Option<String>,
}

/// Indel similarity of two char sequences, 0-100.
pub fn ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let distance = indel::distance(a.iter().copied(), b.iter().copied());
    100.0 * (total - distance) as f64 / total as f64
}

/// Best ratio of `needle` against every alignment within `haystack`,
/// including the partial windows hanging off either end.
fn best_alignment(needle: &[char], haystack: &[char]) -> f64 {
    let m = needle.len();
    let n = haystack.len();
    let mut best: f64 = 0.0;

    let windows = (1..m)
        .map(|i| &haystack[..i])
        .chain((0..=n - m).map(|i| &haystack[i..i + m]))
        .chain((n - m + 1..n).map(|i| &haystack[i..]));

    for window in windows {
        best = best.max(ratio(needle, window));
        if best >= 100.0 {
            break;
        }
    }

    best
}

/// Partial-ratio similarity of two strings, 0-100. Case-sensitive.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    let best = best_alignment(short, long);
    if short.len() == long.len() && best < 100.0 {
        return best.max(best_alignment(long, short));
    }
    best
}

/// Highest-scoring candidate over every name/input combination.
///
/// Ties keep the first candidate seen. Candidates that never score above
/// zero are never returned.
pub fn best_match<'a, T: Candidate>(candidates: &'a [T], inputs: &[&str]) -> Option<(&'a T, f64)> {
    let mut best: Option<(&'a T, f64)> = None;

    for candidate in candidates {
        for name in [Some(candidate.name()), candidate.alt_name()].into_iter().flatten() {
            for &input in inputs {
                let score = partial_ratio(name, input);
                tracing::debug!(name, input, score, "scoring candidate");
                if score > best.map_or(0.0, |(_, s)| s) {
                    best = Some((candidate, score));
                }
            }
        }
    }

    best
}

fn accept<'a, T: Candidate>(best: Option<(&'a T, f64)>) -> Option<&'a T> {
    best.filter(|(_, score)| *score > MATCH_THRESHOLD)
        .map(|(entity, _)| entity)
}

/// Resolve a calendar summary to a customer, falling back to `Default`.
pub fn find_customer<'a>(store: &'a Store, summary: &str) -> CalBillResult<Match<'a, Customer>> {
    if let Some(entity) = accept(best_match(store.customers(), &[summary])) {
        return Ok(Match { entity, note: None });
    }

    let entity = store
        .customer_named(DEFAULT_NAME)
        .ok_or(CalBillError::MissingDefault("customer"))?;
    tracing::warn!(summary, "no customer matched, using Default");

    Ok(Match {
        entity,
        note: Some(format!("Could not match customer (input was {summary:?})")),
    })
}

/// Resolve a calendar summary and description to an appointment type,
/// falling back to `Default`.
pub fn find_appointment_type<'a>(
    store: &'a Store,
    summary: &str,
    description: Option<&str>,
) -> CalBillResult<Match<'a, AppointmentType>> {
    let inputs: Vec<&str> = std::iter::once(summary).chain(description).collect();

    if let Some(entity) = accept(best_match(store.appointment_types(), &inputs)) {
        return Ok(Match { entity, note: None });
    }

    let entity = store
        .appointment_type_named(DEFAULT_NAME)
        .ok_or(CalBillError::MissingDefault("appointment type"))?;
    let input = description.unwrap_or(summary);
    tracing::warn!(input, "no appointment type matched, using Default");

    Ok(Match {
        entity,
        note: Some(format!(
            "Could not match appointment type (input was {input:?})"
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(&chars(""), &chars("")), 100.0);
        assert_eq!(ratio(&chars("abc"), &chars("abc")), 100.0);
        assert_eq!(ratio(&chars("abc"), &chars("xyz")), 0.0);
        // indel("fuzzy", "wuzzy") = 2 -> 8 / 10
        assert_eq!(ratio(&chars("fuzzy"), &chars("wuzzy")), 80.0);
    }

    #[test]
    fn test_partial_ratio_substring_is_perfect() {
        assert_eq!(partial_ratio("Test customer", "Noget der matcher Test customer"), 100.0);
        assert_eq!(partial_ratio("Noget der matcher Test customer", "Test customer"), 100.0);
        assert_eq!(partial_ratio("this is a test", "this is a test!"), 100.0);
    }

    #[test]
    fn test_partial_ratio_empty() {
        assert_eq!(partial_ratio("", ""), 100.0);
        assert_eq!(partial_ratio("", "abc"), 0.0);
        assert_eq!(partial_ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_partial_ratio_is_case_sensitive() {
        assert!(partial_ratio("massage", "MASSAGE") < MATCH_THRESHOLD);
    }

    #[test]
    fn test_partial_ratio_uses_edge_windows() {
        // best alignment is the one-char suffix "b", not a full-width window
        let score = partial_ratio("xb", "aaab");
        assert!((score - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_best_match_first_seen_wins_ties() {
        let mut store = Store::default();
        store.insert_customer("Anna", "1");
        store.insert_customer("Anna", "2");

        let (customer, score) = best_match(store.customers(), &["Anna Hansen"]).unwrap();
        assert_eq!(score, 100.0);
        assert_eq!(customer.contact_id, "1");
    }

    #[test]
    fn test_best_match_uses_alt_name() {
        let mut store = Store::default();
        store.insert_customer("Hansen ApS", "1");
        let id = store.insert_customer("Jensen Holding A/S", "2");
        store.customer_mut(id).unwrap().alt_name = Some("Jensen".into());

        let (customer, _) = best_match(store.customers(), &["Behandling Jensen"]).unwrap();
        assert_eq!(customer.id, id);
    }

    #[test]
    fn test_find_customer_falls_back_to_default() {
        let mut store = Store::default();
        store.insert_customer("Hansen ApS", "1");
        store.ensure_defaults("0", "0", 0.0).unwrap();

        let found = find_customer(&store, "zzzz").unwrap();
        assert_eq!(found.entity.name, DEFAULT_NAME);
        assert_eq!(
            found.note.as_deref(),
            Some("Could not match customer (input was \"zzzz\")")
        );
    }

    #[test]
    fn test_find_customer_threshold_is_exclusive() {
        let mut store = Store::default();
        store.insert_customer("abcdefghijklmnopqrst", "1");
        store.ensure_defaults("0", "0", 0.0).unwrap();

        let at_threshold = "abcXefghijkXmnopqXst";
        assert_eq!(partial_ratio("abcdefghijklmnopqrst", at_threshold), MATCH_THRESHOLD);
        let found = find_customer(&store, at_threshold).unwrap();
        assert_eq!(found.entity.name, DEFAULT_NAME);
        assert!(found.note.is_some());

        // 19-char prefix window: 2 * 17 / 39
        let above = "aXcdefghiXklmnopqrsX";
        assert!((partial_ratio("abcdefghijklmnopqrst", above) - 3400.0 / 39.0).abs() < 1e-9);
        let found = find_customer(&store, above).unwrap();
        assert_eq!(found.entity.contact_id, "1");
        assert_eq!(found.note, None);
    }

    #[test]
    fn test_find_customer_without_default_fails() {
        let mut store = Store::default();
        store.insert_customer("Hansen ApS", "1");

        assert!(matches!(
            find_customer(&store, "zzzz"),
            Err(CalBillError::MissingDefault("customer"))
        ));
    }

    #[test]
    fn test_find_customer_clean_match_has_no_note() {
        let mut store = Store::default();
        store.insert_customer("Hansen ApS", "1");

        let found = find_customer(&store, "Møde med Hansen ApS").unwrap();
        assert_eq!(found.entity.contact_id, "1");
        assert_eq!(found.note, None);
    }

    #[test]
    fn test_find_appointment_type_checks_description() {
        let mut store = Store::default();
        store.insert_appointment_type("Sports massage", "p-1", 100.0);
        store.insert_appointment_type("Consultation", "p-2", 50.0);

        let found =
            find_appointment_type(&store, "Hansen ApS", Some("First Consultation")).unwrap();
        assert_eq!(found.entity.product_id, "p-2");
        assert_eq!(found.note, None);
    }

    #[test]
    fn test_find_appointment_type_note_mentions_description() {
        let mut store = Store::default();
        store.insert_appointment_type("Sports massage", "p-1", 100.0);
        store.ensure_defaults("0", "0", 0.0).unwrap();

        let found = find_appointment_type(&store, "Hansen", Some("zzzz")).unwrap();
        assert_eq!(found.entity.name, DEFAULT_NAME);
        assert_eq!(
            found.note.as_deref(),
            Some("Could not match appointment type (input was \"zzzz\")")
        );
    }

    #[test]
    fn test_find_appointment_type_without_default_fails() {
        let store = Store::default();
        assert!(matches!(
            find_appointment_type(&store, "x", None),
            Err(CalBillError::MissingDefault("appointment type"))
        ));
    }
}
