//! Completion response parsing.
//!
//! Turns a raw chat-completion payload into a [`SummarizationResult`] in two
//! stages: a structured JSON decode, and a heuristic paragraph/bullet decode
//! when the model did not answer in JSON. The parser as a whole never fails.

use serde::Deserialize;
use serde::de::Error as _;
use serde_json::Value;

use mailrag_types::email::SummarizationResult;

/// Which decoding stage produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Structured,
    Heuristic,
}

impl std::fmt::Display for ParseStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseStage::Structured => write!(f, "structured"),
            ParseStage::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// A parsed completion together with the stage that decoded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCompletion {
    pub result: SummarizationResult,
    pub stage: ParseStage,
}

/// The JSON shape the prompt asks the model to answer in.
#[derive(Debug, Deserialize)]
struct StructuredReply {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    actions: Option<Vec<String>>,
}

/// Parse a raw completion payload. Total: malformed input degrades to the
/// heuristic decode, and an empty completion yields an empty result.
pub fn parse_completion(payload: &Value) -> ParsedCompletion {
    let text = extract_text(payload);
    match decode_structured(&text) {
        Ok(result) => ParsedCompletion {
            result,
            stage: ParseStage::Structured,
        },
        Err(e) => {
            tracing::debug!(error = %e, "completion is not structured JSON; using heuristic decode");
            ParsedCompletion {
                result: decode_heuristic(&text),
                stage: ParseStage::Heuristic,
            }
        }
    }
}

/// Text of the first generated message, or the payload's JSON text when the
/// payload does not have the expected shape.
pub fn extract_text(payload: &Value) -> String {
    payload
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|content| content.trim().to_string())
        .unwrap_or_else(|| payload.to_string())
}

/// Decode `{"summary": ..., "actions": [...]}`, optionally wrapped in a
/// Markdown code fence. A missing summary falls back to the full text, a
/// missing action list to an empty one.
pub fn decode_structured(text: &str) -> Result<SummarizationResult, serde_json::Error> {
    let value: Value = serde_json::from_str(strip_code_fence(text))?;
    if !value.is_object() {
        return Err(serde_json::Error::custom("reply is not a JSON object"));
    }
    let reply: StructuredReply = serde_json::from_value(value)?;
    Ok(SummarizationResult {
        summary: reply.summary.unwrap_or_else(|| text.to_string()),
        actions: reply.actions.unwrap_or_default(),
    })
}

/// First paragraph is the summary; bullet (`-`, `*`) and `action`-prefixed
/// lines in later paragraphs are the action items.
pub fn decode_heuristic(text: &str) -> SummarizationResult {
    let normalized = text.replace("\r\n", "\n");
    let mut blocks = normalized.split("\n\n");
    let summary = blocks.next().unwrap_or_default().trim().to_string();
    let actions = blocks.flat_map(str::lines).filter_map(action_item).collect();
    SummarizationResult { summary, actions }
}

fn action_item(line: &str) -> Option<String> {
    let line = line.trim();
    let item = if line.starts_with(['-', '*']) {
        line.trim_start_matches(['-', '*', ' '])
    } else {
        strip_action_prefix(line)?
    };
    let item = item.trim();
    (!item.is_empty()).then(|| item.to_string())
}

/// Strip a case-insensitive `action` word, a plural `s`, and a `:`/`-`
/// separator. A longer word such as "Actionable" is kept whole. `None` when
/// the line does not start with the prefix.
fn strip_action_prefix(line: &str) -> Option<&str> {
    const PREFIX: &str = "action";
    let head = line.get(..PREFIX.len())?;
    if !head.eq_ignore_ascii_case(PREFIX) {
        return None;
    }
    let mut rest = &line[PREFIX.len()..];
    if rest.starts_with(['s', 'S']) {
        rest = &rest[1..];
    }
    if rest.starts_with(char::is_alphanumeric) {
        return Some(line);
    }
    Some(rest.trim_start_matches(|c: char| c == ':' || c == '-' || c.is_whitespace()))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    match inner.find('\n') {
        Some(idx) => inner[idx + 1..].trim(),
        None => inner.trim(),
    }
}
