//! Few-shot prompt composition for email summarization.

use mailrag_types::email::{EmailRecord, RankedEmail};

/// Instruction that opens every prompt.
pub const INSTRUCTION: &str = "You are an assistant that summarizes the following email and extracts action items. Use the examples in 'context_examples' to inform style.";

/// Answer format the model is asked to follow.
pub const RESPONSE_FORMAT: &str = r#"Respond in JSON: { "summary": "...", "actions": ["..."] }"#;

/// Marker that starts each worked example.
pub const EXAMPLE_MARKER: &str = "Example subject:";

/// A composed prompt and the number of worked examples it embeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub text: String,
    pub example_count: usize,
}

/// Build the prompt for one new email from its retrieved neighbours.
///
/// Examples appear nearest first. With no examples the context section is
/// left out entirely.
pub fn compose_prompt(examples: &[RankedEmail], subject: &str, body: &str) -> ComposedPrompt {
    let mut text = String::with_capacity(512);
    text.push_str(INSTRUCTION);
    text.push_str("\n\n");

    if !examples.is_empty() {
        text.push_str("Context examples:\n");
        for example in examples {
            write_example(&mut text, &example.email);
        }
    }

    text.push_str(&format!(
        "Email Subject: {subject}\nEmail Body: {body}\n\n{RESPONSE_FORMAT}"
    ));

    ComposedPrompt {
        text,
        example_count: examples.len(),
    }
}

fn write_example(out: &mut String, email: &EmailRecord) {
    let actions = serde_json::to_string(&email.actions).unwrap_or_else(|_| "[]".to_string());
    out.push_str(&format!(
        "{EXAMPLE_MARKER} {}\nExample body: {}\nExample summary: {}\nExample actions: {}\n\n",
        email.subject, email.body, email.summary, actions
    ));
}
