//! Filter state and its compiled query.
//!
//! `FilterState` is what the user edits; it is also the cache key of the query
//! layer. `AvaluoQuery` is the backend-neutral predicate derived from it. The
//! Postgres repository renders it to SQL and [`AvaluoQuery::matches`] evaluates
//! it in memory; both must agree.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::avaluo::Avaluo;

/// Filters of the tracker grid
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterState {
    /// Case-insensitive substring of `direccion`; empty means no constraint
    pub direccion: String,
    /// Case-insensitive substring of `folio_shit`; empty means no constraint
    pub folio_shit: String,
    pub show_in_progress: bool,
    pub show_closed: bool,
    pub show_cancelled: bool,
    pub show_sent: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            direccion: String::new(),
            folio_shit: String::new(),
            show_in_progress: true,
            show_closed: false,
            show_cancelled: false,
            show_sent: false,
        }
    }
}

impl FilterState {
    /// Clear both text filters. Toggles are left untouched.
    pub fn reset_text(&mut self) {
        self.direccion.clear();
        self.folio_shit.clear();
    }

    /// Compile to a backend-neutral query
    pub fn to_query(&self) -> AvaluoQuery {
        let mut closed_any_of = Vec::new();
        if self.show_in_progress {
            closed_any_of.push(false);
        }
        if self.show_closed {
            closed_any_of.push(true);
        }

        AvaluoQuery {
            direccion_contains: non_empty(&self.direccion),
            folio_shit_contains: non_empty(&self.folio_shit),
            closed_any_of,
            cancelled: self.show_cancelled,
            require_sent: self.show_sent,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Predicate over the records table, ordered ascending by `folio_shit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvaluoQuery {
    pub direccion_contains: Option<String>,
    pub folio_shit_contains: Option<String>,
    /// Accepted values of `cerrado`, OR-combined. Empty imposes no constraint.
    pub closed_any_of: Vec<bool>,
    /// Required value of `cancelado`; always applied.
    pub cancelled: bool,
    /// When set, `enviado` must be non-null.
    pub require_sent: bool,
}

impl AvaluoQuery {
    /// Evaluate the predicate against one record
    pub fn matches(&self, avaluo: &Avaluo) -> bool {
        if let Some(ref needle) = self.direccion_contains {
            if !contains_ignore_case(avaluo.address.as_deref(), needle) {
                return false;
            }
        }
        if let Some(ref needle) = self.folio_shit_contains {
            if !contains_ignore_case(avaluo.folio_shit.as_deref(), needle) {
                return false;
            }
        }
        if !self.closed_any_of.is_empty() && !self.closed_any_of.contains(&avaluo.closed) {
            return false;
        }
        if avaluo.cancelled != self.cancelled {
            return false;
        }
        if self.require_sent && !avaluo.is_sent() {
            return false;
        }
        true
    }

    /// Filter and sort an in-memory record set the way the database does
    pub fn apply<'a, I>(&self, records: I) -> Vec<Avaluo>
    where
        I: IntoIterator<Item = &'a Avaluo>,
    {
        let mut rows: Vec<Avaluo> = records
            .into_iter()
            .filter(|a| self.matches(a))
            .cloned()
            .collect();
        rows.sort_by(|a, b| compare_folio_shit(a.folio_shit.as_deref(), b.folio_shit.as_deref()));
        rows
    }
}

/// Ascending with NULLs last, matching the Postgres default for `ORDER BY .. ASC`
pub fn compare_folio_shit(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(
        id: i64,
        folio_shit: Option<&str>,
        closed: bool,
        cancelled: bool,
        sent: bool,
    ) -> Avaluo {
        let mut a = Avaluo::new(id);
        a.address = Some(format!("Calle Morelos {}", id));
        a.folio_shit = folio_shit.map(String::from);
        a.closed = closed;
        a.cancelled = cancelled;
        a.sent_at = if sent { Some(Utc::now()) } else { None };
        a
    }

    fn fixture() -> Vec<Avaluo> {
        let mut rows = Vec::new();
        let mut id = 0;
        for closed in [false, true] {
            for cancelled in [false, true] {
                for sent in [false, true] {
                    id += 1;
                    let folio = format!("F{:02}", 20 - id);
                    rows.push(record(id, Some(&folio), closed, cancelled, sent));
                }
            }
        }
        rows.push(record(100, None, false, false, false));
        rows
    }

    fn all_filter_states() -> Vec<FilterState> {
        let mut states = Vec::new();
        for mask in 0..16u8 {
            states.push(FilterState {
                direccion: String::new(),
                folio_shit: String::new(),
                show_in_progress: mask & 1 != 0,
                show_closed: mask & 2 != 0,
                show_cancelled: mask & 4 != 0,
                show_sent: mask & 8 != 0,
            });
        }
        states
    }

    #[test]
    fn test_default_filters() {
        let f = FilterState::default();
        assert!(f.show_in_progress);
        assert!(!f.show_closed && !f.show_cancelled && !f.show_sent);
        assert!(f.direccion.is_empty() && f.folio_shit.is_empty());
    }

    #[test]
    fn test_reset_text_keeps_toggles() {
        let mut f = FilterState {
            direccion: "juarez".to_string(),
            folio_shit: "ABC".to_string(),
            show_in_progress: false,
            show_closed: true,
            show_cancelled: true,
            show_sent: true,
        };
        f.reset_text();
        assert_eq!(f.direccion, "");
        assert_eq!(f.folio_shit, "");
        assert!(!f.show_in_progress && f.show_closed && f.show_cancelled && f.show_sent);
    }

    #[test]
    fn test_compile_status_layers() {
        let q = FilterState::default().to_query();
        assert_eq!(q.closed_any_of, vec![false]);
        assert!(!q.cancelled);
        assert!(!q.require_sent);

        let both = FilterState {
            show_closed: true,
            ..FilterState::default()
        }
        .to_query();
        assert_eq!(both.closed_any_of, vec![false, true]);

        let neither = FilterState {
            show_in_progress: false,
            ..FilterState::default()
        }
        .to_query();
        assert!(neither.closed_any_of.is_empty());
    }

    #[test]
    fn test_every_result_satisfies_every_active_constraint() {
        let rows = fixture();
        for state in all_filter_states() {
            let result = state.to_query().apply(&rows);
            for a in &result {
                if state.show_in_progress && !state.show_closed {
                    assert!(!a.closed);
                }
                if state.show_closed && !state.show_in_progress {
                    assert!(a.closed);
                }
                assert_eq!(a.cancelled, state.show_cancelled);
                if state.show_sent {
                    assert!(a.is_sent());
                }
            }
        }
    }

    #[test]
    fn test_cancelled_never_mixed() {
        let rows = fixture();
        for state in all_filter_states() {
            let result = state.to_query().apply(&rows);
            let cancelled = result.iter().filter(|a| a.cancelled).count();
            assert!(cancelled == 0 || cancelled == result.len());
        }
    }

    #[test]
    fn test_neither_status_toggle_imposes_no_closed_constraint() {
        let rows = fixture();
        let state = FilterState {
            show_in_progress: false,
            ..FilterState::default()
        };
        let result = state.to_query().apply(&rows);
        assert!(result.iter().any(|a| a.closed));
        assert!(result.iter().any(|a| !a.closed));
    }

    #[test]
    fn test_sorted_by_folio_shit_with_nulls_last() {
        let rows = fixture();
        let state = FilterState {
            show_closed: true,
            ..FilterState::default()
        };
        let result = state.to_query().apply(&rows);
        let folios: Vec<Option<&str>> = result.iter().map(|a| a.folio_shit.as_deref()).collect();
        let mut sorted = folios.clone();
        sorted.sort_by(|a, b| compare_folio_shit(*a, *b));
        assert_eq!(folios, sorted);
        assert_eq!(folios.last().copied().flatten(), None);
    }

    #[test]
    fn test_substring_filters_are_case_insensitive() {
        let mut a = record(1, Some("ABC123"), false, false, false);
        a.address = Some("Av. Juárez 10, Centro".to_string());
        let b = record(2, Some("XYZ9"), false, false, false);

        let state = FilterState {
            direccion: "JUÁREZ".to_string(),
            ..FilterState::default()
        };
        let result = state.to_query().apply([&a, &b]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 1);

        let state = FilterState {
            folio_shit: "bc1".to_string(),
            ..FilterState::default()
        };
        assert_eq!(state.to_query().apply([&a, &b]).len(), 1);
    }

    #[test]
    fn test_folio_filter_excludes_records_without_folio() {
        let a = record(1, None, false, false, false);
        let state = FilterState {
            folio_shit: "A".to_string(),
            ..FilterState::default()
        };
        assert!(!state.to_query().matches(&a));
    }
}
