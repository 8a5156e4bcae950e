//! Integration tests for the generation pipeline.
//!
//! The AI service is replaced by a scripted [`TextGenerator`], so these run
//! offline and deterministically. Run with:
//!   cargo test --test pipeline

use async_trait::async_trait;
use edgequake_flashcards::pipeline::extract::IMAGE_PLACEHOLDER_TEXT;
use edgequake_flashcards::pipeline::fallback::PLACEHOLDER_ANSWER;
use edgequake_flashcards::{
    CardOrigin, FallbackReason, FlashcardError, FlashcardGenerator, FlashcardStore,
    GenerationConfig, MemoryStore, ParseStrategy, SourceDocument, SourceKind, TextGenerator,
};
use std::collections::HashSet;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

const PARIS: &str = "Paris is the capital of France. It has a population of over two million.";

/// Answers every prompt with a fixed reply and records what it was asked.
struct Scripted {
    reply: Result<String, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl Scripted {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    fn failing(error: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(error.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok("[]".to_string()),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_prompt(&self) -> String {
        self.last_prompt.lock().unwrap().clone().unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for Scripted {
    async fn generate_text(&self, prompt: &str) -> Result<String, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone()
    }
}

/// Route pipeline logs to the test harness; `RUST_LOG=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn generator_with(text_generator: Arc<dyn TextGenerator>) -> FlashcardGenerator {
    init_tracing();
    let config = GenerationConfig::builder()
        .text_generator(text_generator)
        .api_timeout_secs(5)
        .build()
        .unwrap();
    FlashcardGenerator::new(config)
}

fn fallback_reason(origin: &CardOrigin) -> &FallbackReason {
    match origin {
        CardOrigin::Fallback { reason } => reason,
        CardOrigin::Ai { strategy } => panic!("expected fallback, got AI cards via {strategy}"),
    }
}

// ── AI path ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fenced_json_reply() {
    let reply = "Here are your flashcards:\n```json\n[\
        {\"question\": \"What is the capital of France?\", \"answer\": \"Paris\"},\
        {\"question\": \"How many people live in Paris?\", \"answer\": \"Over two million\"}\
        ]\n```\nLet me know if you need more!";
    let scripted = Scripted::replying(reply);
    let output = generator_with(scripted.clone())
        .generate(PARIS, 2)
        .await
        .unwrap();

    assert_eq!(
        output.origin,
        CardOrigin::Ai {
            strategy: ParseStrategy::JsonFence
        }
    );
    assert_eq!(output.count, 2);
    assert_eq!(output.flashcards.len(), 2);
    assert_eq!(output.flashcards[0].question, "What is the capital of France?");
    assert_eq!(output.flashcards[0].answer, "Paris");
    assert_eq!(output.flashcards[1].answer, "Over two million");
    assert_eq!(scripted.calls(), 1);
}

#[tokio::test]
async fn test_ai_cards_are_fresh() {
    let reply = r#"[{"question":"q1","answer":"a1","difficulty":3,"reviewCount":7},
                    {"question":"q2","answer":"a2","id":"keep-me"},
                    {"question":"q3","answer":"a3"}]"#;
    let output = generator_with(Scripted::replying(reply))
        .generate(PARIS, 3)
        .await
        .unwrap();

    let ids: HashSet<_> = output.flashcards.iter().map(|c| c.id).collect();
    assert_eq!(ids.len(), 3, "ids must be pairwise distinct");
    for card in &output.flashcards {
        assert_eq!(card.difficulty, 0);
        assert_eq!(card.review_count, 0);
        assert!(card.last_reviewed.is_none());
        assert!(card.next_review.is_none());
    }
}

#[tokio::test]
async fn test_ai_count_not_padded() {
    let reply = r#"[{"question":"Only one?","answer":"Yes."}]"#;
    let output = generator_with(Scripted::replying(reply))
        .generate(PARIS, 5)
        .await
        .unwrap();
    assert!(!output.is_fallback());
    assert_eq!(output.count, 5);
    assert_eq!(output.flashcards.len(), 1);
}

#[tokio::test]
async fn test_ai_tags_kept() {
    let reply = r#"[
        {"question": "Capital of France?", "answer": "Paris", "tags": ["geography", "europe"]}
    ]"#;
    let output = generator_with(Scripted::replying(reply))
        .generate(PARIS, 1)
        .await
        .unwrap();
    assert_eq!(
        output.flashcards[0].tags,
        Some(vec!["geography".to_string(), "europe".to_string()])
    );
}

#[tokio::test]
async fn test_prompt_asks_for_count_and_carries_text() {
    let scripted = Scripted::replying(r#"[{"question":"q","answer":"a"}]"#);
    generator_with(scripted.clone())
        .generate(PARIS, 7)
        .await
        .unwrap();
    let prompt = scripted.last_prompt();
    assert!(prompt.contains("exactly 7"), "prompt: {prompt}");
    assert!(prompt.contains(PARIS));
}

#[tokio::test]
async fn test_long_text_truncated_by_characters() {
    let scripted = Scripted::replying(r#"[{"question":"q","answer":"a"}]"#);
    let config = GenerationConfig::builder()
        .text_generator(scripted.clone())
        .max_input_chars(100)
        .build()
        .unwrap();

    let text = format!("{}TAIL-MARKER", "é".repeat(100));
    FlashcardGenerator::new(config)
        .generate(&text, 1)
        .await
        .unwrap();

    let prompt = scripted.last_prompt();
    assert!(prompt.contains(&"é".repeat(100)));
    assert!(!prompt.contains("TAIL-MARKER"));
}

// ── Fallback path ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unavailable_service_uses_sentences() {
    let output = generator_with(Scripted::failing("connection refused"))
        .generate(PARIS, 2)
        .await
        .unwrap();

    assert!(matches!(
        fallback_reason(&output.origin),
        FallbackReason::Unavailable { detail } if detail.contains("connection refused")
    ));
    assert_eq!(output.flashcards.len(), 2);
    assert_eq!(output.flashcards[0].question, "Paris is the...?");
    assert_eq!(output.flashcards[0].answer, "Paris is the capital of France.");
    assert_eq!(output.flashcards[1].question, "It has a population...?");
    assert_eq!(
        output.flashcards[1].answer,
        "It has a population of over two million."
    );
}

#[tokio::test]
async fn test_unconfigured_provider_falls_back() {
    let config = GenerationConfig::builder()
        .provider_name("no-such-provider")
        .api_timeout_secs(2)
        .build()
        .unwrap();
    let output = FlashcardGenerator::new(config)
        .generate(PARIS, 2)
        .await
        .unwrap();

    assert!(output.is_fallback());
    assert_eq!(output.flashcards[0].question, "Paris is the...?");
    assert_eq!(output.flashcards[1].question, "It has a population...?");
}

#[tokio::test]
async fn test_not_json_at_all() {
    let reply = "I'm sorry, I can't help with that request.";
    let output = generator_with(Scripted::replying(reply))
        .generate(PARIS, 4)
        .await
        .unwrap();

    match fallback_reason(&output.origin) {
        FallbackReason::MalformedOutput { excerpt, .. } => assert_eq!(excerpt, reply),
        other => panic!("expected MalformedOutput, got {other:?}"),
    }
    assert_eq!(output.flashcards.len(), 4);
    assert!(!output.flashcards[1].is_placeholder());
    assert!(output.flashcards[2].is_placeholder());
    assert!(output.flashcards[3].is_placeholder());
}

#[tokio::test]
async fn test_malformed_excerpt_is_truncated() {
    let reply = "x".repeat(1000);
    let output = generator_with(Scripted::replying(&reply))
        .generate(PARIS, 1)
        .await
        .unwrap();
    match fallback_reason(&output.origin) {
        FallbackReason::MalformedOutput { excerpt, .. } => assert_eq!(excerpt.len(), 200),
        other => panic!("expected MalformedOutput, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_array_falls_back() {
    let output = generator_with(Scripted::replying("[]"))
        .generate(PARIS, 2)
        .await
        .unwrap();
    assert!(matches!(
        fallback_reason(&output.origin),
        FallbackReason::MalformedOutput { .. }
    ));
    assert_eq!(output.flashcards.len(), 2);
}

#[tokio::test]
async fn test_zero_sentences_all_placeholders() {
    let output = generator_with(Scripted::failing("offline"))
        .generate("tiny. bits!", 3)
        .await
        .unwrap();

    let questions: Vec<&str> = output
        .flashcards
        .iter()
        .map(|c| c.question.as_str())
        .collect();
    assert_eq!(
        questions,
        vec![
            "Auto-generated question 1",
            "Auto-generated question 2",
            "Auto-generated question 3"
        ]
    );
    assert!(output
        .flashcards
        .iter()
        .all(|c| c.answer == PLACEHOLDER_ANSWER));
}

#[tokio::test]
async fn test_empty_text_skips_ai_call() {
    let scripted = Scripted::replying(r#"[{"question":"q","answer":"a"}]"#);
    let output = generator_with(scripted.clone())
        .generate("  \n\t ", 2)
        .await
        .unwrap();

    assert_eq!(fallback_reason(&output.origin), &FallbackReason::EmptySource);
    assert_eq!(scripted.calls(), 0);
    assert_eq!(output.flashcards.len(), 2);
}

#[tokio::test]
async fn test_timeout_falls_back() {
    let config = GenerationConfig::builder()
        .text_generator(Scripted::slow(Duration::from_secs(30)))
        .api_timeout_secs(1)
        .build()
        .unwrap();
    let output = FlashcardGenerator::new(config)
        .generate(PARIS, 2)
        .await
        .unwrap();

    assert_eq!(
        fallback_reason(&output.origin),
        &FallbackReason::Timeout { secs: 1 }
    );
    assert_eq!(output.flashcards.len(), 2);
}

#[tokio::test]
async fn test_fallback_exact_count_and_distinct_ids() {
    let generator = generator_with(Scripted::failing("offline"));
    for count in [1, 2, 5, 13] {
        let output = generator.generate(PARIS, count).await.unwrap();
        assert_eq!(output.flashcards.len(), count);
        let ids: HashSet<_> = output.flashcards.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), count);
    }
}

#[tokio::test]
async fn test_fallback_deterministic_content() {
    let generator = generator_with(Scripted::failing("offline"));
    let a = generator.generate(PARIS, 4).await.unwrap();
    let b = generator.generate(PARIS, 4).await.unwrap();

    let content = |o: &edgequake_flashcards::GenerationOutput| {
        o.flashcards
            .iter()
            .map(|c| (c.question.clone(), c.answer.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(content(&a), content(&b));
    assert_ne!(a.flashcards[0].id, b.flashcards[0].id);
}

#[tokio::test]
async fn test_zero_count_rejected() {
    let generator = generator_with(Scripted::failing("unused"));
    let err = generator.generate(PARIS, 0).await.unwrap_err();
    assert!(matches!(err, FlashcardError::InvalidCount { count: 0 }));
}

// ── Sources and inputs ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_image_source_uses_placeholder_text() {
    let scripted = Scripted::failing("offline");
    let source = SourceDocument::from_bytes("diagram.png", vec![0x89, b'P', b'N', b'G']).unwrap();
    assert_eq!(source.kind, SourceKind::Image);

    let output = generator_with(scripted)
        .generate_from_source(&source, 2)
        .await
        .unwrap();
    assert_eq!(output.flashcards[0].answer, IMAGE_PLACEHOLDER_TEXT);
    assert!(output.flashcards[1].is_placeholder());
}

#[tokio::test]
async fn test_unreadable_pdf_counts_as_empty() {
    let scripted = Scripted::replying(r#"[{"question":"q","answer":"a"}]"#);
    let source =
        SourceDocument::from_bytes("broken.pdf", b"definitely not a pdf".to_vec()).unwrap();

    let output = generator_with(scripted.clone())
        .generate_from_source(&source, 3)
        .await
        .unwrap();
    assert_eq!(fallback_reason(&output.origin), &FallbackReason::EmptySource);
    assert_eq!(output.flashcards.len(), 3);
    assert_eq!(scripted.calls(), 0);
}

#[tokio::test]
async fn test_input_file_to_stored_set() {
    let mut file = tempfile::Builder::new()
        .prefix("geography")
        .suffix(".txt")
        .tempfile()
        .unwrap();
    file.write_all(PARIS.as_bytes()).unwrap();

    let reply = r#"[{"question":"What is the capital of France?","answer":"Paris"}]"#;
    let generator = generator_with(Scripted::replying(reply));
    let (source, output) = generator
        .generate_from_input(file.path().to_str().unwrap(), 1)
        .await
        .unwrap();
    assert_eq!(source.kind, SourceKind::PlainText);
    assert!(source.title().starts_with("geography"));

    let store = MemoryStore::new();
    let set = store
        .create_set(output.into_set(source.title(), source.name.clone()))
        .await
        .unwrap();
    let listed = store.list_sets().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, set.id);
    assert_eq!(listed[0].count, 1);
    assert_eq!(set.source, source.name);
}

#[tokio::test]
async fn test_missing_input_is_an_error() {
    let generator = generator_with(Scripted::failing("unused"));
    let err = generator
        .generate_from_input("/no/such/dir/notes.txt", 3)
        .await
        .unwrap_err();
    assert!(matches!(err, FlashcardError::FileNotFound { .. }));
}

#[test]
fn test_generate_sync() {
    let generator = generator_with(Scripted::failing("offline"));
    let output = generator.generate_sync(PARIS, 2).unwrap();
    assert_eq!(output.flashcards.len(), 2);
    assert!(output.is_fallback());
}
