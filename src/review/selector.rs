//! Per-record candidate cursor

use super::SessionError;
use crate::model::{RecordId, ReferenceRecord};
use std::collections::HashMap;

/// Integer cursor into each record's candidate list
///
/// A record with candidates always has a valid cursor (defaulting to 0, the
/// top-ranked candidate); a record without candidates has none.
#[derive(Debug, Default)]
pub struct CandidateSelector {
    cursors: HashMap<RecordId, usize>,
}

impl CandidateSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default the cursor for one record; called on every candidate
    /// replacement
    pub fn reset(&mut self, record: &ReferenceRecord) {
        if record.candidates.is_empty() {
            self.cursors.remove(&record.id);
        } else {
            self.cursors.insert(record.id.clone(), 0);
        }
    }

    /// Default every cursor; called on session initialization
    pub fn reset_all(&mut self, records: &[ReferenceRecord]) {
        self.cursors.clear();
        for record in records {
            self.reset(record);
        }
    }

    pub fn current(&self, id: &RecordId) -> Option<usize> {
        self.cursors.get(id).copied()
    }

    /// Advance the cursor, wrapping cyclically; no-op with fewer than two
    /// candidates
    pub fn next(&mut self, record: &ReferenceRecord) {
        let len = record.candidates.len();
        if len < 2 {
            return;
        }
        if let Some(cursor) = self.cursors.get_mut(&record.id) {
            *cursor = (*cursor + 1) % len;
        }
    }

    /// Step the cursor back, wrapping cyclically; no-op with fewer than two
    /// candidates
    pub fn previous(&mut self, record: &ReferenceRecord) {
        let len = record.candidates.len();
        if len < 2 {
            return;
        }
        if let Some(cursor) = self.cursors.get_mut(&record.id) {
            *cursor = (*cursor + len - 1) % len;
        }
    }

    /// Jump to an explicit index
    ///
    /// Out-of-range requests are rejected without mutating the cursor.
    pub fn select_index(
        &mut self,
        record: &ReferenceRecord,
        index: usize,
    ) -> Result<(), SessionError> {
        let len = record.candidates.len();
        if index >= len {
            return Err(SessionError::IndexOutOfRange { index, len });
        }
        self.cursors.insert(record.id.clone(), index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CandidateMatch, RecordStatus, ReferenceFields};

    fn record_with_candidates(id: &str, count: usize) -> ReferenceRecord {
        ReferenceRecord {
            id: RecordId::from(id),
            original_text: String::new(),
            format_type: None,
            extracted_fields: ReferenceFields::default(),
            candidates: (0..count)
                .map(|i| CandidateMatch {
                    fields: ReferenceFields::default(),
                    similarity_score: 1.0 - i as f64 * 0.1,
                    field_differences: Default::default(),
                    match_type: None,
                })
                .collect(),
            status: RecordStatus::Matched,
        }
    }

    #[test]
    fn test_reset_defaults_to_top_candidate() {
        let mut selector = CandidateSelector::new();
        let record = record_with_candidates("r", 3);
        selector.reset(&record);
        assert_eq!(selector.current(&record.id), Some(0));
    }

    #[test]
    fn test_empty_candidates_have_no_cursor() {
        let mut selector = CandidateSelector::new();
        let record = record_with_candidates("r", 0);
        selector.reset(&record);
        assert_eq!(selector.current(&record.id), None);
    }

    #[test]
    fn test_next_n_times_returns_to_start() {
        let mut selector = CandidateSelector::new();
        let record = record_with_candidates("r", 4);
        selector.reset(&record);

        for _ in 0..4 {
            selector.next(&record);
        }
        assert_eq!(selector.current(&record.id), Some(0));
    }

    #[test]
    fn test_previous_is_inverse_of_next() {
        let mut selector = CandidateSelector::new();
        let record = record_with_candidates("r", 3);
        selector.reset(&record);

        selector.next(&record);
        assert_eq!(selector.current(&record.id), Some(1));
        selector.previous(&record);
        assert_eq!(selector.current(&record.id), Some(0));

        // Wrap backwards from the start
        selector.previous(&record);
        assert_eq!(selector.current(&record.id), Some(2));
    }

    #[test]
    fn test_single_candidate_navigation_is_noop() {
        let mut selector = CandidateSelector::new();
        let record = record_with_candidates("r", 1);
        selector.reset(&record);

        selector.next(&record);
        selector.previous(&record);
        assert_eq!(selector.current(&record.id), Some(0));
    }

    #[test]
    fn test_out_of_range_select_rejected_without_mutation() {
        let mut selector = CandidateSelector::new();
        let record = record_with_candidates("r", 2);
        selector.reset(&record);
        selector.next(&record);

        let err = selector.select_index(&record, 2).unwrap_err();
        assert!(matches!(
            err,
            SessionError::IndexOutOfRange { index: 2, len: 2 }
        ));
        assert_eq!(selector.current(&record.id), Some(1));
    }

    #[test]
    fn test_select_index_in_range() {
        let mut selector = CandidateSelector::new();
        let record = record_with_candidates("r", 3);
        selector.reset(&record);
        selector.select_index(&record, 2).unwrap();
        assert_eq!(selector.current(&record.id), Some(2));
    }
}
