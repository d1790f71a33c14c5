//! Data-level counting and resolution.
//!
//! Counts come from the searchable text of every item, rendered or not, so
//! they never depend on the visible window. Absolute match numbers are 1-based
//! and ordered by item, then by occurrence inside the item.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::matching::TermMatcher;
use crate::transcript::{Entry, Transcript};

/// Owner of an absolute match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataLocation {
    pub item_index: usize,
    /// 1-based occurrence within the item's searchable text.
    pub occurrence: usize,
}

/// Per-item counts for one term on one epoch.
///
/// Items only ever get appended within an epoch, so a cache that covers a
/// prefix of the list is extended rather than rebuilt.
#[derive(Debug)]
struct CountCache {
    key: String,
    epoch: u64,
    counts: Vec<usize>,
    total: usize,
}

impl CountCache {
    fn is_for(&self, key: &str, epoch: u64, len: usize) -> bool {
        self.key == key && self.epoch == epoch && self.counts.len() <= len
    }
}

/// Counts and resolves matches over a whole transcript.
#[derive(Debug)]
pub struct DataLevelResolver {
    transcript: Transcript,
    cache: Mutex<Option<CountCache>>,
}

impl DataLevelResolver {
    pub fn new(transcript: Transcript) -> Self {
        Self {
            transcript,
            cache: Mutex::new(None),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Total matches of `term` across all items.
    pub fn count_all(&self, term: &str) -> usize {
        let Some(matcher) = TermMatcher::new(term) else {
            return 0;
        };
        self.transcript.with_entries(|entries, epoch| {
            let mut slot = self.lock_cache();
            let valid = slot
                .as_ref()
                .is_some_and(|cache| cache.is_for(matcher.key(), epoch, entries.len()));
            if !valid {
                *slot = Some(CountCache {
                    key: matcher.key().to_string(),
                    epoch,
                    counts: Vec::with_capacity(entries.len()),
                    total: 0,
                });
            }
            let Some(cache) = slot.as_mut() else {
                return 0;
            };

            let start = cache.counts.len();
            for entry in &entries[start..] {
                let n = matcher.count_segments(entry.text());
                cache.counts.push(n);
                cache.total += n;
            }
            if start < entries.len() {
                trace!(
                    term = matcher.key(),
                    counted = entries.len() - start,
                    total = cache.total,
                    "extended match counts"
                );
            }
            cache.total
        })
    }

    /// Maps the `k`th (1-based) match to its item and occurrence.
    ///
    /// Returns `None` for `k == 0` or `k` past the total. Stops at the owning
    /// item; a cold cache is not filled.
    pub fn resolve(&self, term: &str, k: usize) -> Option<DataLocation> {
        let matcher = TermMatcher::new(term)?;
        if k == 0 {
            return None;
        }
        self.walk(&matcher, |entries, counts| {
            let mut remaining = k;
            for (item_index, entry) in entries.iter().enumerate() {
                let n = item_count_with(&matcher, counts, item_index, entry);
                if remaining <= n {
                    return Some(DataLocation {
                        item_index,
                        occurrence: remaining,
                    });
                }
                remaining -= n;
            }
            None
        })
    }

    /// Matches of `term` in the item at `index` (0 when out of range).
    pub fn item_count(&self, term: &str, index: usize) -> usize {
        let Some(matcher) = TermMatcher::new(term) else {
            return 0;
        };
        self.walk(&matcher, |entries, counts| {
            entries
                .get(index)
                .map_or(0, |entry| item_count_with(&matcher, counts, index, entry))
        })
    }

    /// First item after `after` whose searchable text contains `term`.
    pub fn next_item_with_matches(&self, term: &str, after: usize) -> Option<usize> {
        let matcher = TermMatcher::new(term)?;
        self.walk(&matcher, |entries, counts| {
            entries
                .iter()
                .enumerate()
                .skip(after + 1)
                .find(|(index, entry)| item_count_with(&matcher, counts, *index, entry) > 0)
                .map(|(index, _)| index)
        })
    }

    /// Forgets cached counts.
    pub fn invalidate(&self) {
        *self.lock_cache() = None;
    }

    /// Runs `f` with the entries and whatever cached counts apply to `matcher`.
    fn walk<R>(&self, matcher: &TermMatcher, f: impl FnOnce(&[Arc<Entry>], &[usize]) -> R) -> R {
        self.transcript.with_entries(|entries, epoch| {
            let slot = self.lock_cache();
            let counts = slot
                .as_ref()
                .filter(|cache| cache.is_for(matcher.key(), epoch, entries.len()))
                .map_or(&[][..], |cache| cache.counts.as_slice());
            f(entries, counts)
        })
    }

    fn lock_cache(&self) -> MutexGuard<'_, Option<CountCache>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn item_count_with(matcher: &TermMatcher, counts: &[usize], index: usize, entry: &Entry) -> usize {
    counts
        .get(index)
        .copied()
        .unwrap_or_else(|| matcher.count_segments(entry.text()))
}

#[cfg(test)]
mod tests {
    use tfind_types::{ErrorDetail, Event};

    use super::*;

    fn input(text: &str) -> Event {
        Event::Input {
            input: text.into(),
        }
    }

    /// Items 2 and 7 hold "error" twice and three times.
    fn scenario() -> Transcript {
        Transcript::from_events((0..10).map(|i| match i {
            2 => input("error: first error"),
            7 => input("Error, error, ERROR"),
            _ => input("all good"),
        }))
    }

    #[test]
    fn test_scenario_count_and_resolve() {
        let resolver = DataLevelResolver::new(scenario());
        assert_eq!(resolver.count_all("error"), 5);
        assert_eq!(
            resolver.resolve("error", 1),
            Some(DataLocation {
                item_index: 2,
                occurrence: 1
            })
        );
        assert_eq!(
            resolver.resolve("error", 3),
            Some(DataLocation {
                item_index: 7,
                occurrence: 1
            })
        );
        assert_eq!(
            resolver.resolve("error", 5),
            Some(DataLocation {
                item_index: 7,
                occurrence: 3
            })
        );
        assert_eq!(resolver.resolve("error", 6), None);
        assert_eq!(resolver.resolve("error", 0), None);
    }

    #[test]
    fn test_resolve_cold_cache_matches_warm() {
        let cold = DataLevelResolver::new(scenario());
        let warm = DataLevelResolver::new(scenario());
        let total = warm.count_all("error");
        for k in 1..=total {
            assert_eq!(cold.resolve("error", k), warm.resolve("error", k));
        }
    }

    #[test]
    fn test_resolution_is_monotonic() {
        let resolver = DataLevelResolver::new(scenario());
        let total = resolver.count_all("error");
        let mut last = (0, 0);
        for k in 1..=total {
            let loc = resolver.resolve("error", k).unwrap();
            let here = (loc.item_index, loc.occurrence);
            if k > 1 {
                assert!(
                    here.0 > last.0 || (here.0 == last.0 && here.1 == last.1 + 1),
                    "{last:?} -> {here:?}"
                );
            }
            last = here;
        }
    }

    #[test]
    fn test_absent_term_counts_zero() {
        let resolver = DataLevelResolver::new(scenario());
        assert_eq!(resolver.count_all("warning"), 0);
        assert_eq!(resolver.resolve("warning", 1), None);
        assert_eq!(resolver.count_all(""), 0);
    }

    #[test]
    fn test_count_extends_on_append() {
        let transcript = scenario();
        let resolver = DataLevelResolver::new(transcript.clone());
        assert_eq!(resolver.count_all("error"), 5);

        transcript.append_events([input("late error")]);
        assert_eq!(resolver.count_all("error"), 6);
        assert_eq!(
            resolver.resolve("error", 6),
            Some(DataLocation {
                item_index: 10,
                occurrence: 1
            })
        );
    }

    #[test]
    fn test_reset_invalidates_counts() {
        let transcript = scenario();
        let resolver = DataLevelResolver::new(transcript.clone());
        assert_eq!(resolver.count_all("error"), 5);

        transcript.reset();
        transcript.append_events([Event::Error {
            error: ErrorDetail {
                message: "one".into(),
                traceback: String::new(),
            },
        }]);
        // Title "Error" is searchable too.
        assert_eq!(resolver.count_all("error"), 1);
    }

    #[test]
    fn test_term_change_recomputes() {
        let resolver = DataLevelResolver::new(scenario());
        assert_eq!(resolver.count_all("error"), 5);
        assert_eq!(resolver.count_all("good"), 8);
        assert_eq!(resolver.count_all("ERROR"), 5);
    }

    #[test]
    fn test_item_count_and_next_item() {
        let resolver = DataLevelResolver::new(scenario());
        assert_eq!(resolver.item_count("error", 2), 2);
        assert_eq!(resolver.item_count("error", 3), 0);
        assert_eq!(resolver.item_count("error", 99), 0);
        assert_eq!(resolver.next_item_with_matches("error", 2), Some(7));
        assert_eq!(resolver.next_item_with_matches("error", 0), Some(2));
        assert_eq!(resolver.next_item_with_matches("error", 7), None);
    }
}
