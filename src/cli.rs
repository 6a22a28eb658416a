//! Console presentation of review sessions
//!
//! Rendering only; all reconciliation decisions are made by the review core.

use crate::diff::{self, DiffToken};
use crate::model::{FieldDiff, FieldName, RecordStatus, ReferenceRecord};
use crate::pipeline::{Phase, ProgressSink};
use crate::review::ReviewSession;

const HIGHLIGHT: &str = "\x1b[31m";
const BADGE: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

/// Progress sink printing phase labels to stderr
pub struct ConsoleProgress {
    pub quiet: bool,
}

impl ProgressSink for ConsoleProgress {
    fn phase(&mut self, phase: Phase) {
        if !self.quiet {
            eprintln!("==> {}", phase.label());
        }
    }

    fn detected_style(&mut self, style: &str) {
        if !self.quiet {
            eprintln!("    detected style: {}", style);
        }
    }
}

/// Reassemble candidate tokens, wrapping novel ones in highlight codes
pub fn render_tokens(tokens: &[DiffToken], color: bool) -> String {
    let mut out = String::new();
    for token in tokens {
        if token.novel && color {
            out.push_str(HIGHLIGHT);
            out.push_str(&token.text);
            out.push_str(RESET);
        } else if token.novel {
            out.push('[');
            out.push_str(&token.text);
            out.push(']');
        } else {
            out.push_str(&token.text);
        }
    }
    out
}

fn status_note(record: &ReferenceRecord) -> &'static str {
    match record.status {
        RecordStatus::Pending => "pending",
        RecordStatus::Matched => "matched",
        RecordStatus::NotFound => "no match found (below the search service's threshold)",
        RecordStatus::Completed => "completed",
    }
}

/// Print every record with its extracted fields and annotated candidates
pub fn print_session(session: &ReviewSession, color: bool) {
    for record in session.records() {
        println!("--- {} [{}] ({})", record.id, record.style(), status_note(record));
        println!("  original: {}", record.original_text);

        for name in FieldName::ALL {
            if let Some(value) = record.extracted_fields.get(name) {
                println!("  {}: {}", name.label(), value);
            }
        }

        for (index, candidate) in record.candidates.iter().enumerate() {
            let view = diff::annotate_candidate(record, candidate);
            let cursor = session.candidate_cursor(&record.id) == Some(index);
            let marker = if cursor { ">" } else { " " };

            let badge = match view.match_type {
                Some(kind) if color => format!(" {}[{}]{}", BADGE, kind.label(), RESET),
                Some(kind) => format!(" [{}]", kind.label()),
                None => String::new(),
            };
            println!(
                "  {} candidate {}: similarity {:.1}%{}",
                marker,
                index + 1,
                view.similarity_score * 100.0,
                badge
            );

            for field in &view.fields {
                let rendered = render_tokens(&field.tokens, color);
                match &field.outcome {
                    FieldDiff::Same => {
                        println!("      {}: {}", field.name.label(), rendered);
                    }
                    FieldDiff::Different { original: Some(v) } => {
                        println!("      {}: {} (was: {})", field.name.label(), rendered, v);
                    }
                    FieldDiff::Different { original: None } => {
                        println!("      {}: {}", field.name.label(), rendered);
                    }
                    FieldDiff::Missing { .. } => {
                        println!("      {}: {} (not in original)", field.name.label(), rendered);
                    }
                    FieldDiff::Extra { value: Some(v) } => {
                        println!("      {}: (candidate omits; original has {})", field.name.label(), v);
                    }
                    FieldDiff::Extra { value: None } => {
                        println!("      {}: (candidate omits)", field.name.label());
                    }
                }
            }
        }
        println!();
    }
}
