//! Prompts for AI flashcard generation.
//!
//! Every prompt lives here so unit tests can inspect them without a model and
//! so the wording can change without touching the call or parse stages.
//!
//! Callers can override the system prompt via
//! [`crate::config::GenerationConfig::system_prompt`]; the user prompt is
//! always built by [`flashcard_prompt`] because the parser depends on its
//! output contract.

/// Default system prompt for flashcard generation.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an experienced teacher who writes study flashcards.

Rules:
1. Each flashcard tests one fact, definition, or idea from the provided text.
2. Questions are self-contained and answerable without seeing the text.
3. Answers are short, precise, and taken from the text; never invent facts.
4. Prefer the most important concepts over trivia.
5. Output ONLY a JSON array. No prose, no explanations, no Markdown fences."#;

/// Build the user message asking for exactly `count` cards about `text`.
///
/// `text` should already be truncated to the configured character budget.
pub fn flashcard_prompt(text: &str, count: usize) -> String {
    format!(
        "Create exactly {count} flashcards from the text below.\n\
         Respond with a JSON array of exactly {count} objects and nothing else.\n\
         Each object must have a \"question\" string and an \"answer\" string, \
         and may have a \"tags\" array of short strings.\n\
         Example: [{{\"question\": \"What is the capital of France?\", \
         \"answer\": \"Paris\", \"tags\": [\"geography\"]}}]\n\n\
         Text:\n\"\"\"\n{text}\n\"\"\""
    )
}
