//! Edit-mode state machine
//!
//! At most one record is in edit across the whole session: the single edit
//! slot is the global mutual-exclusion token. Transitions are synchronous
//! and explicit (`enter`, `begin_reverify`, `fail_reverify`, `close`) so the
//! async reverify driver holds no session state across await points and the
//! single-holder and single-flight invariants are enforced in one place.
//!
//! Per record: viewing -> editing -> verifying -> viewing on success, or
//! back to editing (buffer intact) on failure.

use super::SessionError;
use crate::model::{FieldName, FieldValue, RecordId, ReferenceFields, ReferenceRecord};

/// Where the active edit is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPhase {
    /// Buffer open for mutation
    Editing,
    /// A reverify call is in flight; further reverifies are rejected
    Verifying,
}

#[derive(Debug)]
struct ActiveEdit {
    id: RecordId,
    buffer: ReferenceFields,
    phase: EditPhase,
}

/// The single global edit slot
#[derive(Debug, Default)]
pub struct EditSession {
    active: Option<ActiveEdit>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record currently holding the edit slot, if any
    pub fn editing_id(&self) -> Option<&RecordId> {
        self.active.as_ref().map(|e| &e.id)
    }

    pub fn phase(&self) -> Option<EditPhase> {
        self.active.as_ref().map(|e| e.phase)
    }

    pub fn buffer(&self) -> Option<&ReferenceFields> {
        self.active.as_ref().map(|e| &e.buffer)
    }

    /// Open an edit buffer for a record, copying its extracted fields
    ///
    /// Rejected while any record holds the edit slot.
    pub fn enter(&mut self, record: &ReferenceRecord) -> Result<(), SessionError> {
        if let Some(active) = &self.active {
            return Err(SessionError::EditConflict {
                active: active.id.clone(),
            });
        }
        self.active = Some(ActiveEdit {
            id: record.id.clone(),
            buffer: record.extracted_fields.clone(),
            phase: EditPhase::Editing,
        });
        Ok(())
    }

    /// Mutate the buffer only; the record store is never touched here
    pub fn set_field(&mut self, name: FieldName, value: FieldValue) {
        match &mut self.active {
            Some(edit) if edit.phase == EditPhase::Editing => edit.buffer.set(name, value),
            _ => tracing::debug!(field = name.label(), "set_field outside an open edit"),
        }
    }

    pub fn delete_field(&mut self, name: FieldName) {
        match &mut self.active {
            Some(edit) if edit.phase == EditPhase::Editing => edit.buffer.clear(name),
            _ => tracing::debug!(field = name.label(), "delete_field outside an open edit"),
        }
    }

    /// Discard the buffer and release the edit slot
    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Move the active edit into the verifying phase, returning a snapshot
    /// of the buffer for the search request
    ///
    /// Rejected when the record does not hold the edit slot, or when a
    /// reverify is already in flight (single-flight; the second call is
    /// rejected, not queued).
    pub fn begin_reverify(&mut self, id: &RecordId) -> Result<ReferenceFields, SessionError> {
        let Some(edit) = &mut self.active else {
            return Err(SessionError::NotEditing { id: id.clone() });
        };
        if edit.id != *id {
            return Err(SessionError::EditConflict {
                active: edit.id.clone(),
            });
        }
        if edit.phase == EditPhase::Verifying {
            return Err(SessionError::ReverifyInFlight { id: id.clone() });
        }
        edit.phase = EditPhase::Verifying;
        Ok(edit.buffer.clone())
    }

    /// Return a failed reverify to the editing phase, buffer intact, so the
    /// user may retry
    pub fn fail_reverify(&mut self) {
        if let Some(edit) = &mut self.active {
            edit.phase = EditPhase::Editing;
        }
    }

    /// Release the edit slot after a successful reverify
    pub fn close(&mut self) {
        self.active = None;
    }
}
