//! Progress aggregation over a session's concept map.

use serde::Serialize;

use crate::registry::ConceptRegistry;
use crate::session::SessionKey;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub mastered: usize,
    pub unmastered: usize,
    pub total: usize,
}

/// Counts computed fresh from the registry. Missing and empty sessions both give zeros.
pub fn progress(registry: &ConceptRegistry, session: &SessionKey) -> ProgressSummary {
    registry
        .read(session, |map| {
            let total = map.len();
            let mastered = map.values().filter(|r| r.understanding).count();
            ProgressSummary {
                mastered,
                unmastered: total - mastered,
                total,
            }
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(s: &str) -> SessionKey {
        SessionKey::parse(s).unwrap()
    }

    #[test]
    fn test_unknown_session_is_all_zero() {
        let registry = ConceptRegistry::new();
        assert_eq!(progress(&registry, &key("nobody")), ProgressSummary::default());
    }

    #[test]
    fn test_counts_follow_mastery() {
        let registry = ConceptRegistry::new();
        let s = key("s1");
        let concepts: Vec<String> = ["Loops", "Recursion", "Closures"].iter().map(|c| c.to_string()).collect();
        registry.ingest(&s, "a.txt", &concepts);
        registry.mark_mastered(&s, "Recursion").unwrap();
        registry.mark_mastered(&s, "Recursion").unwrap();

        assert_eq!(
            progress(&registry, &s),
            ProgressSummary { mastered: 1, unmastered: 2, total: 3 }
        );
    }

    proptest! {
        #[test]
        fn prop_mastered_plus_unmastered_is_total(
            concepts in prop::collection::vec("[a-z]{1,6}", 0..20),
            marks in prop::collection::vec(any::<prop::sample::Index>(), 0..20),
        ) {
            let registry = ConceptRegistry::new();
            let s = key("prop");
            registry.ingest(&s, "doc.txt", &concepts);
            if !concepts.is_empty() {
                for index in &marks {
                    let name = index.get(&concepts);
                    prop_assert!(registry.mark_mastered(&s, name).is_ok());
                }
            }

            let summary = progress(&registry, &s);
            prop_assert_eq!(summary.mastered + summary.unmastered, summary.total);
            prop_assert_eq!(summary.total, registry.snapshot(&s).len());
        }
    }
}
