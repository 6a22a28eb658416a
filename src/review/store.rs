//! Authoritative record list for one review session

use crate::model::{CandidateMatch, RecordId, RecordStatus, ReferenceFields, ReferenceRecord};

/// Owns the list of reference records and their candidate arrays
///
/// Writes referencing an unknown id are silent no-ops: a stale id can
/// survive a UI event across a session reset, and that is tolerated rather
/// than reported.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<ReferenceRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole list; used once per submission
    pub fn initialize(&mut self, records: Vec<ReferenceRecord>) {
        self.records = records;
    }

    /// Atomically replace one record's candidates and status
    ///
    /// Returns false (and leaves everything untouched) when the id is not
    /// present.
    pub fn replace_candidates(
        &mut self,
        id: &RecordId,
        candidates: Vec<CandidateMatch>,
        status: RecordStatus,
    ) -> bool {
        match self.records.iter_mut().find(|r| r.id == *id) {
            Some(record) => {
                record.candidates = candidates;
                record.status = status;
                true
            }
            None => {
                tracing::debug!(record = %id, "replace_candidates on unknown record id");
                false
            }
        }
    }

    /// Replace one record's extracted fields (reverify success path)
    pub fn replace_fields(&mut self, id: &RecordId, fields: ReferenceFields) -> bool {
        match self.records.iter_mut().find(|r| r.id == *id) {
            Some(record) => {
                record.extracted_fields = fields;
                true
            }
            None => {
                tracing::debug!(record = %id, "replace_fields on unknown record id");
                false
            }
        }
    }

    pub fn get(&self, id: &RecordId) -> Option<&ReferenceRecord> {
        self.records.iter().find(|r| r.id == *id)
    }

    /// All records, in insertion order from `initialize`
    pub fn list(&self) -> &[ReferenceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
