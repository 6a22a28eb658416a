//! Review-session state container
//!
//! `ReviewSession` composes the record store, candidate cursors, the edit
//! slot, and the format cache behind one API so the invariants that span
//! them (single edit holder, cursor defaults on candidate replacement,
//! cache invalidation on source mutation) are enforced centrally instead of
//! at scattered call sites.

mod edit;
mod format;
mod selector;
mod store;

pub use edit::{EditPhase, EditSession};
pub use format::{FormatCache, RenderTicket};
pub use selector::CandidateSelector;
pub use store::RecordStore;

use crate::client::{ClientError, FormatService, SearchService};
use crate::diff::{self, CandidateView};
use crate::model::{
    CandidateMatch, FieldName, FieldValue, ORIGINAL_STYLE, ProcessedReference, RecordId,
    ReferenceRecord,
};
use std::time::Duration;
use thiserror::Error;

/// Failure taxonomy for review-core operations
///
/// Transport failures are retryable by the user; conflict and range
/// failures are contract violations by the caller and are rejected
/// synchronously with no partial mutation. Operations referencing an
/// unknown record id are silent no-ops and never reach this enum.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("record {active} is already being edited")]
    EditConflict { active: RecordId },

    #[error("record {id} is not in edit mode")]
    NotEditing { id: RecordId },

    #[error("a reverify is already in flight for record {id}")]
    ReverifyInFlight { id: RecordId },

    #[error("candidate index {index} out of range for {len} candidates")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Transport(#[from] ClientError),
}

/// All in-memory state for one review session
///
/// State lives only for the duration of the session; `initialize` resets
/// everything for a new submission.
#[derive(Debug)]
pub struct ReviewSession {
    store: RecordStore,
    selector: CandidateSelector,
    edit: EditSession,
    format: FormatCache,
}

impl ReviewSession {
    pub fn new() -> Self {
        Self {
            store: RecordStore::new(),
            selector: CandidateSelector::new(),
            edit: EditSession::new(),
            format: FormatCache::new(),
        }
    }

    /// Replace all session state with a freshly matched record set
    pub fn initialize(&mut self, records: Vec<ReferenceRecord>) {
        self.store.initialize(records);
        self.selector.reset_all(self.store.list());
        self.edit.cancel();
        self.format.seed(self.store.list());
    }

    pub fn records(&self) -> &[ReferenceRecord] {
        self.store.list()
    }

    pub fn record(&self, id: &RecordId) -> Option<&ReferenceRecord> {
        self.store.get(id)
    }

    pub fn processed(&self) -> &[ProcessedReference] {
        self.format.sources()
    }

    // --- candidate navigation ---

    /// Cursor position for a record, when it has candidates
    pub fn candidate_cursor(&self, id: &RecordId) -> Option<usize> {
        self.selector.current(id)
    }

    /// Currently selected candidate for a record
    pub fn current_candidate(&self, id: &RecordId) -> Option<(usize, &CandidateMatch)> {
        let record = self.store.get(id)?;
        let cursor = self.selector.current(id)?;
        record.candidates.get(cursor).map(|c| (cursor, c))
    }

    /// Diff-annotated view of the currently selected candidate
    pub fn current_candidate_view(&self, id: &RecordId) -> Option<CandidateView> {
        let record = self.store.get(id)?;
        let (_, candidate) = self.current_candidate(id)?;
        Some(diff::annotate_candidate(record, candidate))
    }

    pub fn next_candidate(&mut self, id: &RecordId) {
        if let Some(record) = self.store.get(id) {
            self.selector.next(record);
        } else {
            tracing::debug!(record = %id, "next_candidate for unknown record id");
        }
    }

    pub fn previous_candidate(&mut self, id: &RecordId) {
        if let Some(record) = self.store.get(id) {
            self.selector.previous(record);
        } else {
            tracing::debug!(record = %id, "previous_candidate for unknown record id");
        }
    }

    pub fn select_candidate(&mut self, id: &RecordId, index: usize) -> Result<(), SessionError> {
        match self.store.get(id) {
            Some(record) => self.selector.select_index(record, index),
            None => {
                tracing::debug!(record = %id, "select_candidate for unknown record id");
                Ok(())
            }
        }
    }

    /// Accept a candidate by index as the record's rendering source
    ///
    /// Updates the processed entry in place and invalidates cached
    /// renderings; the record itself keeps its candidates and status.
    pub fn accept_candidate(&mut self, id: &RecordId, index: usize) -> Result<(), SessionError> {
        let Some(record) = self.store.get(id) else {
            tracing::debug!(record = %id, "accept_candidate for unknown record id");
            return Ok(());
        };
        let Some(candidate) = record.candidates.get(index) else {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: record.candidates.len(),
            });
        };
        self.format.accept_candidate(record, candidate);
        Ok(())
    }

    /// Accept the candidate at the current cursor
    pub fn accept_current(&mut self, id: &RecordId) -> Result<(), SessionError> {
        match self.selector.current(id) {
            Some(index) => self.accept_candidate(id, index),
            None => Ok(()),
        }
    }

    // --- editing and reverify ---

    pub fn editing_id(&self) -> Option<&RecordId> {
        self.edit.editing_id()
    }

    pub fn edit_phase(&self) -> Option<EditPhase> {
        self.edit.phase()
    }

    pub fn edit_buffer(&self) -> Option<&crate::model::ReferenceFields> {
        self.edit.buffer()
    }

    /// Open an edit buffer for a record; unknown ids are silent no-ops
    pub fn begin_edit(&mut self, id: &RecordId) -> Result<(), SessionError> {
        match self.store.get(id) {
            Some(record) => self.edit.enter(record),
            None => {
                tracing::debug!(record = %id, "begin_edit for unknown record id");
                Ok(())
            }
        }
    }

    pub fn set_field(&mut self, name: FieldName, value: FieldValue) {
        self.edit.set_field(name, value);
    }

    pub fn delete_field(&mut self, name: FieldName) {
        self.edit.delete_field(name);
    }

    pub fn cancel_edit(&mut self) {
        self.edit.cancel();
    }

    /// Re-run the search collaborator with the edited field buffer
    ///
    /// On success the record's candidates, status, and extracted fields are
    /// replaced, its cursor defaults to the top candidate, cached renderings
    /// are invalidated, and after `observation_delay` the edit slot is
    /// released. On failure nothing changes and the buffer is kept so the
    /// user can retry.
    pub async fn reverify(
        &mut self,
        id: &RecordId,
        search: &dyn SearchService,
        use_smart_matching: bool,
        observation_delay: Duration,
    ) -> Result<(), SessionError> {
        let buffer = self.edit.begin_reverify(id)?;

        match search.search(id, &buffer, use_smart_matching).await {
            Ok(outcome) => {
                tracing::info!(
                    record = %id,
                    candidates = outcome.candidates.len(),
                    status = %outcome.status,
                    "reverify succeeded"
                );
                self.store.replace_candidates(id, outcome.candidates, outcome.status);
                self.store.replace_fields(id, buffer.clone());
                if let Some(record) = self.store.get(id) {
                    self.selector.reset(record);
                }
                self.format.update_fields(id, buffer);

                // Leave the detail view open briefly so the caller can
                // surface the result before the edit closes.
                if !observation_delay.is_zero() {
                    tokio::time::sleep(observation_delay).await;
                }
                self.edit.close();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(record = %id, error = %e, "reverify failed; edit preserved");
                self.edit.fail_reverify();
                Err(SessionError::Transport(e))
            }
        }
    }

    // --- output formatting ---

    pub fn active_style(&self) -> &str {
        self.format.active_style()
    }

    pub fn detected_style(&self) -> &str {
        self.format.detected_style()
    }

    /// The locally computed original-style rendering
    pub fn render_original(&self) -> String {
        self.format.render_original()
    }

    /// Switch the active style and return its rendered text
    ///
    /// "original" is served locally and synchronously. Other styles come
    /// from the render collaborator, cached per style until the source list
    /// changes; on collaborator failure the active style reverts to
    /// "original" and the error is surfaced for the caller to display.
    pub async fn set_style(
        &mut self,
        style: &str,
        renderer: &dyn FormatService,
    ) -> Result<String, SessionError> {
        if style == ORIGINAL_STYLE {
            self.format.set_active(style);
            return Ok(self.format.render_original());
        }

        self.format.set_active(style);
        if let Some(cached) = self.format.cached(style) {
            return Ok(cached.to_string());
        }

        let ticket = self.format.begin_render(style);
        match renderer.format(self.format.sources(), style).await {
            Ok(text) => {
                self.format.complete_render(ticket, text.clone());
                Ok(text)
            }
            Err(e) => {
                tracing::warn!(style, error = %e, "format conversion failed; reverting to original");
                self.format.revert_to_original();
                Err(SessionError::Transport(e))
            }
        }
    }
}
