//! Response parsing: recover flashcard drafts from free-form model output.
//!
//! Models are asked for a bare JSON array, but replies routinely arrive
//! wrapped in ` ```json ` fences, prefixed with chatter ("Sure! Here are your
//! cards:"), or followed by commentary. Each [`ParseStrategy`] looks for JSON
//! in one place; [`parse_cards`] runs them in [`ParseStrategy::CHAIN`] order
//! and returns the first one whose candidate both parses and validates.
//!
//! Validation is strict about shape and lenient about extras: every element
//! must be an object with non-blank `question` and `answer` strings; a
//! well-formed `tags` array of strings is kept; anything else is dropped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A validated card without identity or review metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDraft {
    pub question: String,
    pub answer: String,
    pub tags: Option<Vec<String>>,
}

impl CardDraft {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            tags: None,
        }
    }
}

/// One place in a model response where a JSON card array may be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    /// The whole (trimmed) response is the JSON document.
    WholeResponse,
    /// The body of a fenced block tagged `json`.
    JsonFence,
    /// The body of any fenced block, tagged or not.
    AnyFence,
    /// The first top-level `[ … ]` literal anywhere in the response.
    BareArray,
}

impl ParseStrategy {
    /// Strategies in the order they are attempted.
    pub const CHAIN: [ParseStrategy; 4] = [
        ParseStrategy::WholeResponse,
        ParseStrategy::JsonFence,
        ParseStrategy::AnyFence,
        ParseStrategy::BareArray,
    ];

    /// Candidate JSON texts this strategy finds in `raw`, in preference order.
    fn candidates<'a>(&self, raw: &'a str) -> Vec<&'a str> {
        match self {
            ParseStrategy::WholeResponse => vec![raw.trim()],
            ParseStrategy::JsonFence => fence_bodies(&RE_JSON_FENCE, raw),
            ParseStrategy::AnyFence => fence_bodies(&RE_ANY_FENCE, raw),
            ParseStrategy::BareArray => {
                let mut spans = balanced_arrays(raw);
                if let Some(greedy) = greedy_array(raw) {
                    if !spans.contains(&greedy) {
                        spans.push(greedy);
                    }
                }
                spans
            }
        }
    }

    /// Run this strategy alone against `raw`.
    pub fn attempt(&self, raw: &str) -> Result<Vec<CardDraft>, ParseFailure> {
        let candidates = self.candidates(raw);
        if candidates.is_empty() {
            return Err(ParseFailure::new(*self, "no candidate found"));
        }

        let mut last = None;
        for candidate in candidates {
            match parse_candidate(candidate) {
                Ok(drafts) => return Ok(drafts),
                Err(detail) => last = Some(detail),
            }
        }
        Err(ParseFailure::new(
            *self,
            last.unwrap_or_else(|| "no candidate found".to_string()),
        ))
    }
}

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseStrategy::WholeResponse => "whole response",
            ParseStrategy::JsonFence => "json fence",
            ParseStrategy::AnyFence => "any fence",
            ParseStrategy::BareArray => "bare array",
        };
        f.write_str(name)
    }
}

/// Why a single strategy could not produce cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub strategy: ParseStrategy,
    pub detail: String,
}

impl ParseFailure {
    fn new(strategy: ParseStrategy, detail: impl Into<String>) -> Self {
        Self {
            strategy,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.detail)
    }
}

/// Run every strategy in order; return the first success.
///
/// On total failure every strategy's reason is returned, in chain order.
pub fn parse_cards(raw: &str) -> Result<(ParseStrategy, Vec<CardDraft>), Vec<ParseFailure>> {
    let mut failures = Vec::with_capacity(ParseStrategy::CHAIN.len());
    for strategy in ParseStrategy::CHAIN {
        match strategy.attempt(raw) {
            Ok(drafts) => return Ok((strategy, drafts)),
            Err(failure) => failures.push(failure),
        }
    }
    Err(failures)
}

// ── Candidate discovery ─────────────────────────────────────────────────────

static RE_JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[ \t]*(?i:json)[ \t]*\r?\n(.*?)```").unwrap());

static RE_ANY_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[^\n`]*\r?\n(.*?)```").unwrap());

fn fence_bodies<'a>(re: &Regex, raw: &'a str) -> Vec<&'a str> {
    re.captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|body| !body.is_empty())
        .collect()
}

/// Top-level bracket-balanced `[ … ]` spans, skipping brackets inside JSON
/// string literals. An opener that is never closed is skipped and the scan
/// resumes right after it.
fn balanced_arrays(raw: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut offset = 0usize;

    while offset < raw.len() {
        match scan_arrays(&raw[offset..], &mut spans) {
            Some(unclosed) => offset += unclosed + 1,
            None => break,
        }
    }
    spans
}

/// Push complete spans of `text` into `spans`; return the byte index of an
/// unclosed top-level opener, if the text ends inside one.
fn scan_arrays<'a>(text: &'a str, spans: &mut Vec<&'a str>) -> Option<usize> {
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in text.bytes().enumerate() {
        if depth == 0 {
            if b == b'[' {
                depth = 1;
                start = i;
            }
            continue;
        }
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    spans.push(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    (depth > 0).then_some(start)
}

/// First `[` to last `]`, tried after the balanced spans.
fn greedy_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    (end > start).then(|| &raw[start..=end])
}

// ── Validation ──────────────────────────────────────────────────────────────

fn parse_candidate(candidate: &str) -> Result<Vec<CardDraft>, String> {
    let value: Value =
        serde_json::from_str(candidate).map_err(|e| format!("invalid JSON: {e}"))?;
    validate_cards(&value)
}

fn validate_cards(value: &Value) -> Result<Vec<CardDraft>, String> {
    let items = value
        .as_array()
        .ok_or_else(|| format!("expected a JSON array, got {}", json_kind(value)))?;
    if items.is_empty() {
        return Err("array is empty".to_string());
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| validate_card(item).map_err(|e| format!("element {i}: {e}")))
        .collect()
}

fn validate_card(item: &Value) -> Result<CardDraft, String> {
    let obj = item
        .as_object()
        .ok_or_else(|| format!("expected an object, got {}", json_kind(item)))?;

    let field = |name: &str| -> Result<String, String> {
        match obj.get(name) {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
            Some(Value::String(_)) => Err(format!("\"{name}\" is blank")),
            Some(other) => Err(format!("\"{name}\" is {}, not a string", json_kind(other))),
            None => Err(format!("missing \"{name}\"")),
        }
    };

    let question = field("question")?;
    let answer = field("answer")?;

    let tags = obj.get("tags").and_then(Value::as_array).and_then(|arr| {
        arr.iter()
            .map(|t| t.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
    });

    Ok(CardDraft {
        question,
        answer,
        tags,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
