//! Chat-completion payload sanitization.
//!
//! Some chat templates (gpt-oss via llama.cpp among them) raise a render
//! error when an assistant turn carries tool calls together with both a
//! `content` string and a reasoning field (`thinking` or `reasoning_content`).
//! The reasoning text in such a turn is prior chain-of-thought the model does
//! not need for continued generation, so the proxy drops it and keeps
//! `content`. A reasoning field alongside an *empty* content renders fine and
//! is left alone.

use serde_json::Value;
use tracing::debug;

/// Alternate serializations of chain-of-thought text.
const REASONING_FIELDS: [&str; 2] = ["thinking", "reasoning_content"];

/// Drop conflicting reasoning fields from tool-calling assistant messages.
///
/// Mutates `payload.messages` in place and returns the number of messages
/// scrubbed. Payloads without a `messages` array, messages of other roles,
/// and assistant messages without tool calls are never touched. Re-applying
/// the function to its own output is a no-op.
pub fn sanitize_messages(payload: &mut Value) -> usize {
    let Some(messages) = payload.get_mut("messages").and_then(Value::as_array_mut) else {
        return 0;
    };

    let mut scrubbed = 0;
    for (index, message) in messages.iter_mut().enumerate() {
        let Some(message) = message.as_object_mut() else {
            continue;
        };
        if message.get("role").and_then(Value::as_str) != Some("assistant") {
            continue;
        }
        if !has_tool_calls(message.get("tool_calls")) {
            continue;
        }

        let has_reasoning = REASONING_FIELDS
            .iter()
            .any(|f| message.get(*f).is_some_and(|v| !v.is_null()));
        if !has_reasoning {
            continue;
        }

        // Empty content is not a conflict: the template accepts a lone
        // reasoning field, so the message passes through untouched.
        let content = message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if content.is_empty() {
            continue;
        }

        for field in REASONING_FIELDS {
            message.remove(field);
        }
        scrubbed += 1;
        debug!(index, "dropped reasoning fields from tool-calling assistant message");
    }

    scrubbed
}

fn has_tool_calls(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Array(calls)) => !calls.is_empty(),
        Some(_) => true,
    }
}
