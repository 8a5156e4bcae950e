//! Deterministic fallback: build flashcards from sentences, no AI involved.
//!
//! This is the pipeline's liveness guarantee. It never performs I/O, never
//! fails, and always returns exactly the requested number of cards: one card
//! per usable sentence, then numbered placeholder cards to make up the count.
//!
//! Given the same text and count it always produces the same question/answer
//! content; only the card ids differ between runs.

use super::parse::CardDraft;
use once_cell::sync::Lazy;
use regex::Regex;

/// Question prefix of padding cards; the 1-based card position follows.
pub const PLACEHOLDER_QUESTION_PREFIX: &str = "Auto-generated question";

/// Answer text of padding cards.
pub const PLACEHOLDER_ANSWER: &str = "This card was generated automatically because the source \
did not contain enough complete sentences. Edit it or delete it.";

/// Sentences shorter than this many characters (after trimming) are skipped.
pub const MIN_SENTENCE_CHARS: usize = 10;

/// Upper bound on the words copied from a sentence into its question.
pub const MAX_QUESTION_WORDS: usize = 5;

/// A sentence body followed by one or more terminal marks.
static RE_SENTENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?]*[.!?]+").unwrap());

/// Split `text` into trimmed sentences of at least [`MIN_SENTENCE_CHARS`].
///
/// Terminal punctuation stays attached to its sentence. Text after the last
/// terminal mark counts as a final fragment.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut fragments: Vec<&str> = Vec::new();
    let mut consumed = 0;
    for m in RE_SENTENCE.find_iter(text) {
        fragments.push(m.as_str());
        consumed = m.end();
    }
    fragments.push(&text[consumed..]);

    fragments
        .into_iter()
        .map(str::trim)
        .filter(|s| s.chars().count() >= MIN_SENTENCE_CHARS)
        .map(str::to_string)
        .collect()
}

/// Question stem: the first `min(5, words / 2)` words followed by `...?`.
pub fn question_from_sentence(sentence: &str) -> String {
    let words: Vec<&str> = sentence.split_whitespace().collect();
    let take = MAX_QUESTION_WORDS.min(words.len() / 2);
    format!("{}...?", words[..take].join(" "))
}

/// Padding card for 1-based position `n`.
pub fn placeholder_draft(n: usize) -> CardDraft {
    CardDraft::new(
        format!("{PLACEHOLDER_QUESTION_PREFIX} {n}"),
        PLACEHOLDER_ANSWER,
    )
}

/// Exactly `count` drafts: sentence cards first, placeholders after.
pub fn fallback_drafts(text: &str, count: usize) -> Vec<CardDraft> {
    let mut drafts: Vec<CardDraft> = split_sentences(text)
        .into_iter()
        .take(count)
        .map(|sentence| CardDraft::new(question_from_sentence(&sentence), sentence))
        .collect();

    while drafts.len() < count {
        drafts.push(placeholder_draft(drafts.len() + 1));
    }
    drafts
}
