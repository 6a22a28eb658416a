//! Output-format cache over the processed reference list
//!
//! Holds the accepted rendering source for every record, a per-style cache
//! of collaborator-rendered text, and the monotonic render sequence numbers
//! that make overlapping conversions for the same style last-write-wins
//! without corrupting a cache entry with a stale response.

use crate::model::{
    CandidateMatch, ORIGINAL_STYLE, ProcessedReference, RecordId, ReferenceFields, ReferenceRecord,
};
use std::collections::HashMap;

/// Tag for one outstanding render request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTicket {
    style: String,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct FormatCache {
    /// One entry per record, same order as the record list
    sources: Vec<ProcessedReference>,
    /// Rendered text per non-original style
    cache: HashMap<String, String>,
    active_style: String,
    detected_style: String,
    /// Latest issued sequence number per style; stale completions are
    /// discarded
    latest_seq: HashMap<String, u64>,
    next_seq: u64,
}

impl FormatCache {
    pub fn new() -> Self {
        Self {
            active_style: ORIGINAL_STYLE.to_string(),
            detected_style: ORIGINAL_STYLE.to_string(),
            ..Default::default()
        }
    }

    /// Seed the source list from freshly matched records and pre-select the
    /// dominant detected style
    pub fn seed(&mut self, records: &[ReferenceRecord]) {
        self.sources = records
            .iter()
            .map(|record| ProcessedReference {
                id: record.id.clone(),
                text: record.original_text.clone(),
                data: record.extracted_fields.clone(),
                format_type: record.format_type.clone(),
            })
            .collect();

        self.detected_style = dominant_style(records);
        self.active_style = self.detected_style.clone();
        self.invalidate();
    }

    pub fn sources(&self) -> &[ProcessedReference] {
        &self.sources
    }

    pub fn active_style(&self) -> &str {
        &self.active_style
    }

    /// Most common declared format across the input records, ties broken by
    /// first-seen
    pub fn detected_style(&self) -> &str {
        &self.detected_style
    }

    /// Locally computed rendering: the source texts joined line by line.
    /// Never calls a collaborator, never fails.
    pub fn render_original(&self) -> String {
        self.sources
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace one record's source with an accepted candidate
    ///
    /// The replacement text is composed locally from the candidate's fields
    /// with the identifier removed. Order and list size are preserved; a
    /// stale id is a silent no-op.
    pub fn accept_candidate(&mut self, record: &ReferenceRecord, candidate: &CandidateMatch) -> bool {
        let Some(source) = self.sources.iter_mut().find(|s| s.id == record.id) else {
            tracing::debug!(record = %record.id, "accept_candidate for unknown record id");
            return false;
        };

        let data = candidate.fields.without_identifier();
        source.text = data.compose_text();
        source.data = data;
        source.format_type = record.format_type.clone();
        self.invalidate();
        true
    }

    /// Replace one record's backing field set (reverify completion); the
    /// displayed text is left as-is
    pub fn update_fields(&mut self, id: &RecordId, fields: ReferenceFields) -> bool {
        let Some(source) = self.sources.iter_mut().find(|s| s.id == *id) else {
            tracing::debug!(record = %id, "update_fields for unknown record id");
            return false;
        };
        source.data = fields;
        self.invalidate();
        true
    }

    /// Drop every cached non-original rendering; called on any mutation of
    /// the source list
    pub fn invalidate(&mut self) {
        if !self.cache.is_empty() {
            tracing::debug!(styles = self.cache.len(), "invalidating cached renderings");
        }
        self.cache.clear();
    }

    pub fn cached(&self, style: &str) -> Option<&str> {
        self.cache.get(style).map(String::as_str)
    }

    /// Mark a style active. "original" is always served locally; any other
    /// style needs a collaborator rendering when not cached.
    pub fn set_active(&mut self, style: &str) {
        self.active_style = style.to_string();
    }

    /// Revert the active style after a collaborator failure
    pub fn revert_to_original(&mut self) {
        self.active_style = ORIGINAL_STYLE.to_string();
    }

    /// Issue a sequence-tagged ticket for an outgoing render request
    pub fn begin_render(&mut self, style: &str) -> RenderTicket {
        self.next_seq += 1;
        self.latest_seq.insert(style.to_string(), self.next_seq);
        RenderTicket {
            style: style.to_string(),
            seq: self.next_seq,
        }
    }

    /// Store a completed rendering unless a newer request for the same style
    /// has been issued since; returns whether the response was applied
    pub fn complete_render(&mut self, ticket: RenderTicket, text: String) -> bool {
        if self.latest_seq.get(&ticket.style) != Some(&ticket.seq) {
            tracing::debug!(style = %ticket.style, seq = ticket.seq, "discarding stale render response");
            return false;
        }
        self.cache.insert(ticket.style, text);
        true
    }
}

fn dominant_style(records: &[ReferenceRecord]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for record in records {
        let style = record.style();
        match counts.iter_mut().find(|(s, _)| *s == style) {
            Some((_, n)) => *n += 1,
            None => counts.push((style, 1)),
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (style, n) in counts {
        match best {
            Some((_, top)) if n <= top => {}
            _ => best = Some((style, n)),
        }
    }
    best.map(|(s, _)| s.to_string())
        .unwrap_or_else(|| ORIGINAL_STYLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordStatus;
    use std::collections::BTreeMap;

    fn record(id: &str, text: &str, style: Option<&str>) -> ReferenceRecord {
        ReferenceRecord {
            id: RecordId::from(id),
            original_text: text.to_string(),
            format_type: style.map(String::from),
            extracted_fields: ReferenceFields::default(),
            candidates: Vec::new(),
            status: RecordStatus::Pending,
        }
    }

    fn candidate_with_fields(fields: ReferenceFields) -> CandidateMatch {
        CandidateMatch {
            fields,
            similarity_score: 0.9,
            field_differences: BTreeMap::new(),
            match_type: None,
        }
    }

    #[test]
    fn test_seed_uses_original_text() {
        let mut cache = FormatCache::new();
        cache.seed(&[record("a", "first", None), record("b", "second", None)]);

        assert_eq!(cache.sources().len(), 2);
        assert_eq!(cache.render_original(), "first\nsecond");
    }

    #[test]
    fn test_dominant_style_most_common() {
        let mut cache = FormatCache::new();
        cache.seed(&[
            record("a", "x", Some("apa")),
            record("b", "y", Some("mla")),
            record("c", "z", Some("apa")),
        ]);
        assert_eq!(cache.detected_style(), "apa");
        assert_eq!(cache.active_style(), "apa");
    }

    #[test]
    fn test_dominant_style_tie_breaks_first_seen() {
        let mut cache = FormatCache::new();
        cache.seed(&[
            record("a", "x", Some("mla")),
            record("b", "y", Some("apa")),
        ]);
        assert_eq!(cache.detected_style(), "mla");
    }

    #[test]
    fn test_dominant_style_empty_is_original() {
        let mut cache = FormatCache::new();
        cache.seed(&[]);
        assert_eq!(cache.detected_style(), ORIGINAL_STYLE);
    }

    #[test]
    fn test_accept_candidate_replaces_in_place_without_identifier() {
        let mut cache = FormatCache::new();
        let rec_a = record("a", "first", Some("apa"));
        let rec_b = record("b", "second", Some("apa"));
        cache.seed(&[rec_a.clone(), rec_b.clone()]);

        let candidate = candidate_with_fields(ReferenceFields {
            title: Some("New title".into()),
            authors: Some(vec!["Smith J".into()]),
            year: Some(2020),
            pmid: Some("99999".into()),
            ..Default::default()
        });

        assert!(cache.accept_candidate(&rec_b, &candidate));

        // Order and size preserved; only the accepted entry changed
        let sources = cache.sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].text, "first");
        assert_eq!(sources[1].id, RecordId::from("b"));
        assert_eq!(sources[1].text, "Smith J (2020). New title. ,");
        assert_eq!(sources[1].data.pmid, None);
    }

    #[test]
    fn test_accept_candidate_stale_id_noop() {
        let mut cache = FormatCache::new();
        cache.seed(&[record("a", "first", None)]);

        let ghost = record("ghost", "gone", None);
        let candidate = candidate_with_fields(ReferenceFields::default());
        assert!(!cache.accept_candidate(&ghost, &candidate));
        assert_eq!(cache.render_original(), "first");
    }

    #[test]
    fn test_mutation_invalidates_cached_renderings() {
        let mut cache = FormatCache::new();
        let rec = record("a", "first", None);
        cache.seed(&[rec.clone()]);

        let ticket = cache.begin_render("apa");
        assert!(cache.complete_render(ticket, "rendered".into()));
        assert_eq!(cache.cached("apa"), Some("rendered"));

        let candidate = candidate_with_fields(ReferenceFields {
            title: Some("T".into()),
            ..Default::default()
        });
        cache.accept_candidate(&rec, &candidate);
        assert_eq!(cache.cached("apa"), None);
    }

    #[test]
    fn test_stale_render_response_discarded() {
        let mut cache = FormatCache::new();
        cache.seed(&[record("a", "first", None)]);

        let first = cache.begin_render("apa");
        let second = cache.begin_render("apa");

        // The later request completes first; the earlier response must not
        // overwrite it.
        assert!(cache.complete_render(second, "newer".into()));
        assert!(!cache.complete_render(first, "older".into()));
        assert_eq!(cache.cached("apa"), Some("newer"));
    }

    #[test]
    fn test_sequence_numbers_are_per_style() {
        let mut cache = FormatCache::new();
        cache.seed(&[record("a", "first", None)]);

        let apa = cache.begin_render("apa");
        let mla = cache.begin_render("mla");

        assert!(cache.complete_render(apa, "apa text".into()));
        assert!(cache.complete_render(mla, "mla text".into()));
        assert_eq!(cache.cached("apa"), Some("apa text"));
        assert_eq!(cache.cached("mla"), Some("mla text"));
    }

    #[test]
    fn test_revert_to_original() {
        let mut cache = FormatCache::new();
        cache.seed(&[record("a", "x", Some("apa"))]);
        assert_eq!(cache.active_style(), "apa");

        cache.revert_to_original();
        assert_eq!(cache.active_style(), ORIGINAL_STYLE);
    }
}
