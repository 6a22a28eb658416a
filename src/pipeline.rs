//! Submission pipeline
//!
//! Drives one end-to-end submission: split the raw text, fan out one search
//! call per extracted record, join on all of them, and initialize the review
//! session from the merged results. Progress is reported as ordered phase
//! labels; consumers may display them but only the ordering is contractual.

use crate::client::{SearchService, SplitService};
use crate::model::{RecordStatus, ReferenceRecord};
use crate::review::{ReviewSession, SessionError};
use futures_util::future::join_all;
use std::sync::Arc;

/// Pipeline phases, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Splitting,
    Extracting,
    Searching,
    Matched,
}

impl Phase {
    /// Human-readable label; wording is not contractual
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Splitting => "Splitting references",
            Phase::Extracting => "Extracting fields",
            Phase::Searching => "Searching for candidates",
            Phase::Matched => "Matching complete",
        }
    }
}

/// Consumer of pipeline progress notifications
pub trait ProgressSink: Send {
    fn phase(&mut self, phase: Phase);

    /// Dominant detected citation style, emitted once matching completes
    fn detected_style(&mut self, _style: &str) {}
}

/// Sink that drops all notifications
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn phase(&mut self, _phase: Phase) {}
}

/// One-submission orchestrator over the split and search collaborators
pub struct Pipeline {
    split: Arc<dyn SplitService>,
    search: Arc<dyn SearchService>,
    use_smart_matching: bool,
}

impl Pipeline {
    pub fn new(split: Arc<dyn SplitService>, search: Arc<dyn SearchService>) -> Self {
        Self {
            split,
            search,
            use_smart_matching: false,
        }
    }

    pub fn with_smart_matching(mut self, enabled: bool) -> Self {
        self.use_smart_matching = enabled;
        self
    }

    /// Run one submission to completion
    ///
    /// A split failure aborts the whole submission with nothing initialized.
    /// A search failure degrades only its own record to `not_found` with no
    /// candidates; sibling records are unaffected. No results are published
    /// until every per-record call has settled.
    pub async fn run(
        &self,
        text: &str,
        progress: &mut dyn ProgressSink,
    ) -> Result<ReviewSession, SessionError> {
        progress.phase(Phase::Splitting);
        let mut records = self.split.split(text).await?;
        tracing::info!(records = records.len(), "split submission into records");

        // Field extraction happens inside the split collaborator; the phase
        // is kept for progress-reporting parity with the external pipeline.
        progress.phase(Phase::Extracting);

        progress.phase(Phase::Searching);
        let searches = records.iter().map(|record| {
            let search = Arc::clone(&self.search);
            let id = record.id.clone();
            let keywords = record.extracted_fields.clone();
            let smart = self.use_smart_matching;
            async move { search.search(&id, &keywords, smart).await }
        });
        let results = join_all(searches).await;

        for (record, result) in records.iter_mut().zip(results) {
            match result {
                Ok(outcome) => {
                    record.candidates = outcome.candidates;
                    record.status = outcome.status;
                }
                Err(e) => {
                    tracing::warn!(record = %record.id, error = %e, "search failed; degrading record");
                    record.candidates = Vec::new();
                    record.status = RecordStatus::NotFound;
                }
            }
        }

        progress.phase(Phase::Matched);
        let mut session = ReviewSession::new();
        session.initialize(records);
        progress.detected_style(session.detected_style());

        tracing::info!(
            matched = count_status(session.records(), RecordStatus::Matched),
            not_found = count_status(session.records(), RecordStatus::NotFound),
            detected_style = session.detected_style(),
            "submission ready for review"
        );
        Ok(session)
    }
}

fn count_status(records: &[ReferenceRecord], status: RecordStatus) -> usize {
    records.iter().filter(|r| r.status == status).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, SearchOutcome};
    use crate::model::{CandidateMatch, RecordId, ReferenceFields};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::collections::HashMap;

    struct StubSplit {
        records: Option<Vec<ReferenceRecord>>,
    }

    #[async_trait]
    impl SplitService for StubSplit {
        async fn split(&self, _text: &str) -> Result<Vec<ReferenceRecord>, ClientError> {
            match &self.records {
                Some(records) => Ok(records.clone()),
                None => Err(ClientError::http(500, "split failed")),
            }
        }
    }

    /// Per-record canned search results; ids not listed fail
    struct StubSearch {
        outcomes: HashMap<String, SearchOutcome>,
    }

    #[async_trait]
    impl SearchService for StubSearch {
        async fn search(
            &self,
            id: &RecordId,
            _keywords: &ReferenceFields,
            _use_smart_matching: bool,
        ) -> Result<SearchOutcome, ClientError> {
            self.outcomes
                .get(id.as_str())
                .cloned()
                .ok_or_else(|| ClientError::network("search unreachable"))
        }
    }

    struct RecordingProgress {
        phases: Vec<Phase>,
        detected: Option<String>,
    }

    impl ProgressSink for RecordingProgress {
        fn phase(&mut self, phase: Phase) {
            self.phases.push(phase);
        }

        fn detected_style(&mut self, style: &str) {
            self.detected = Some(style.to_string());
        }
    }

    fn pending(id: &str, text: &str, style: Option<&str>) -> ReferenceRecord {
        ReferenceRecord {
            id: RecordId::from(id),
            original_text: text.to_string(),
            format_type: style.map(String::from),
            extracted_fields: ReferenceFields {
                title: Some(format!("title {}", id)),
                ..Default::default()
            },
            candidates: Vec::new(),
            status: RecordStatus::Pending,
        }
    }

    fn candidate(score: f64) -> CandidateMatch {
        CandidateMatch {
            fields: ReferenceFields::default(),
            similarity_score: score,
            field_differences: BTreeMap::new(),
            match_type: None,
        }
    }

    #[tokio::test]
    async fn test_two_citation_submission() {
        let split = Arc::new(StubSplit {
            records: Some(vec![
                pending("r1", "first citation", Some("apa")),
                pending("r2", "second citation", Some("apa")),
            ]),
        });
        let mut outcomes = HashMap::new();
        outcomes.insert(
            "r1".to_string(),
            SearchOutcome {
                candidates: vec![candidate(0.92), candidate(0.81)],
                status: RecordStatus::Matched,
            },
        );
        outcomes.insert(
            "r2".to_string(),
            SearchOutcome {
                candidates: Vec::new(),
                status: RecordStatus::NotFound,
            },
        );
        let search = Arc::new(StubSearch { outcomes });

        let pipeline = Pipeline::new(split, search);
        let mut progress = RecordingProgress {
            phases: Vec::new(),
            detected: None,
        };
        let session = pipeline.run("raw text", &mut progress).await.unwrap();

        assert_eq!(
            progress.phases,
            vec![
                Phase::Splitting,
                Phase::Extracting,
                Phase::Searching,
                Phase::Matched
            ]
        );
        assert_eq!(progress.detected.as_deref(), Some("apa"));

        let r1 = session.record(&RecordId::from("r1")).unwrap();
        assert_eq!(r1.status, RecordStatus::Matched);
        assert_eq!(r1.candidates.len(), 2);

        let r2 = session.record(&RecordId::from("r2")).unwrap();
        assert_eq!(r2.status, RecordStatus::NotFound);

        // Default cursor is the top-ranked (0.92) candidate
        assert_eq!(session.candidate_cursor(&RecordId::from("r1")), Some(0));
        assert!(
            (session
                .current_candidate(&RecordId::from("r1"))
                .unwrap()
                .1
                .similarity_score
                - 0.92)
                .abs()
                < f64::EPSILON
        );

        // Processed text stays the original until a candidate is accepted
        assert_eq!(session.processed()[0].text, "first citation");
    }

    #[tokio::test]
    async fn test_split_failure_aborts_submission() {
        let split = Arc::new(StubSplit { records: None });
        let search = Arc::new(StubSearch {
            outcomes: HashMap::new(),
        });

        let pipeline = Pipeline::new(split, search);
        let err = pipeline
            .run("raw text", &mut NullProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
    }

    #[tokio::test]
    async fn test_search_failure_degrades_only_its_record() {
        let split = Arc::new(StubSplit {
            records: Some(vec![pending("ok", "good", None), pending("bad", "bad", None)]),
        });
        let mut outcomes = HashMap::new();
        outcomes.insert(
            "ok".to_string(),
            SearchOutcome {
                candidates: vec![candidate(0.7)],
                status: RecordStatus::Matched,
            },
        );
        let search = Arc::new(StubSearch { outcomes });

        let pipeline = Pipeline::new(split, search);
        let session = pipeline.run("raw text", &mut NullProgress).await.unwrap();

        let ok = session.record(&RecordId::from("ok")).unwrap();
        assert_eq!(ok.status, RecordStatus::Matched);

        let bad = session.record(&RecordId::from("bad")).unwrap();
        assert_eq!(bad.status, RecordStatus::NotFound);
        assert!(bad.candidates.is_empty());
    }
}
