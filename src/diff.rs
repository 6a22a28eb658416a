//! Word- and field-level difference computation
//!
//! Pure functions that align a candidate value against an original value and
//! classify each field as same or different. The scalar alignment is a
//! greedy, monotonic forward scan rather than a minimal edit distance: each
//! original token is consumed at most once, favoring speed and determinism
//! over optimality.

use crate::model::{CandidateMatch, FieldDiff, FieldName, FieldValue, MatchType, ReferenceRecord};

/// One candidate token with its highlight decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffToken {
    pub text: String,
    /// True when the token has no counterpart in the original value and
    /// should be visually distinguished
    pub novel: bool,
}

impl DiffToken {
    fn matched(text: &str) -> Self {
        Self {
            text: text.to_string(),
            novel: false,
        }
    }

    fn novel(text: &str) -> Self {
        Self {
            text: text.to_string(),
            novel: true,
        }
    }
}

/// One field of a candidate, annotated for display
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAnnotation {
    pub name: FieldName,
    pub outcome: FieldDiff,
    /// Highlight-annotated rendering of the candidate value; empty when the
    /// candidate has no value for this field
    pub tokens: Vec<DiffToken>,
}

/// A candidate fully annotated against its parent record
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateView {
    pub similarity_score: f64,
    /// Identifier-match tag; when present it takes display precedence over
    /// any per-field text diff
    pub match_type: Option<MatchType>,
    pub fields: Vec<FieldAnnotation>,
}

/// Split text into tokens, retaining whitespace runs as tokens
fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_whitespace: Option<bool> = None;

    for (i, ch) in text.char_indices() {
        let ws = ch.is_whitespace();
        match in_whitespace {
            None => in_whitespace = Some(ws),
            Some(prev) if prev != ws => {
                tokens.push(&text[start..i]);
                start = i;
                in_whitespace = Some(ws);
            }
            Some(_) => {}
        }
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

/// Align a scalar candidate value against the original value
///
/// Scans candidate tokens left to right; each non-whitespace token is matched
/// case-insensitively against the first equal original token at or after the
/// consumption cursor, which then advances past it. Unmatched tokens are
/// marked novel.
pub fn highlight_scalar(original: &str, candidate: &str) -> Vec<DiffToken> {
    let original_tokens: Vec<String> = tokenize(original)
        .into_iter()
        .map(|t| t.to_lowercase())
        .collect();
    let mut cursor = 0;

    tokenize(candidate)
        .into_iter()
        .map(|token| {
            if token.chars().all(char::is_whitespace) {
                return DiffToken::matched(token);
            }
            let lowered = token.to_lowercase();
            match original_tokens[cursor..].iter().position(|t| *t == lowered) {
                Some(offset) => {
                    cursor += offset + 1;
                    DiffToken::matched(token)
                }
                None => DiffToken::novel(token),
            }
        })
        .collect()
}

/// Align an author list as a set, case-insensitively
///
/// Each candidate author is matched if present anywhere in the original list
/// regardless of position; no positional alignment is attempted.
pub fn highlight_authors(original: &[String], candidate: &[String]) -> Vec<DiffToken> {
    candidate
        .iter()
        .map(|author| {
            let present = original
                .iter()
                .any(|o| o.to_lowercase() == author.to_lowercase());
            if present {
                DiffToken::matched(author)
            } else {
                DiffToken::novel(author)
            }
        })
        .collect()
}

/// Classify one field
///
/// The collaborator-supplied entry wins when present; otherwise direct
/// case-sensitive equality decides, with one-sided fields tagged missing
/// (candidate only) or extra (original only). Fields absent on both sides
/// are omitted from comparison entirely.
pub fn classify(
    original: Option<&FieldValue>,
    candidate: Option<&FieldValue>,
    supplied: Option<&FieldDiff>,
) -> Option<FieldDiff> {
    if original.is_none() && candidate.is_none() {
        return None;
    }
    if let Some(diff) = supplied {
        return Some(diff.clone());
    }
    match (original, candidate) {
        (None, Some(value)) => Some(FieldDiff::Missing {
            value: Some(value.clone()),
        }),
        (Some(value), None) => Some(FieldDiff::Extra {
            value: Some(value.clone()),
        }),
        (original, candidate) if original == candidate => Some(FieldDiff::Same),
        (original, _) => Some(FieldDiff::Different {
            original: original.cloned(),
        }),
    }
}

/// Annotate every populated field of a candidate against its parent record
pub fn annotate_candidate(record: &ReferenceRecord, candidate: &CandidateMatch) -> CandidateView {
    let mut fields = Vec::new();

    for name in FieldName::ALL {
        let original = record.extracted_fields.get(name);
        let value = candidate.fields.get(name);
        let Some(outcome) = classify(
            original.as_ref(),
            value.as_ref(),
            candidate.field_differences.get(&name),
        ) else {
            continue;
        };

        // Word-level highlighting applies only to fields classified as
        // different; same and one-sided fields render as plain text.
        let highlight = matches!(outcome, FieldDiff::Different { .. });
        let tokens = match (&value, highlight) {
            (None, _) => Vec::new(),
            (Some(FieldValue::List(authors)), true) if name == FieldName::Authors => {
                highlight_authors(
                    record.extracted_fields.authors.as_deref().unwrap_or(&[]),
                    authors,
                )
            }
            (Some(value), true) => {
                let original_text = original.map(|v| v.to_string()).unwrap_or_default();
                highlight_scalar(&original_text, &value.to_string())
            }
            (Some(value), false) => vec![DiffToken::matched(&value.to_string())],
        };

        fields.push(FieldAnnotation {
            name,
            outcome,
            tokens,
        });
    }

    CandidateView {
        similarity_score: candidate.similarity_score,
        match_type: candidate.match_type,
        fields,
    }
}
