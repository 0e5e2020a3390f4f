//! Pulls continuation ids and the reply text out of a merged stream.

use serde_json::Value;
use tracing::trace;

use super::frame::{self, Frame};
use super::record::PatchRecord;

/// Path at which the backend appends the reply text.
pub const REPLY_PATH: &str = "/message/content/parts/0";

/// Operation used for reply text.
pub const APPEND_OP: &str = "append";

/// Ids needed to continue a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    pub conversation_id: String,
    pub last_assistant_message_id: String,
}

fn data_payloads(merged: &str) -> impl Iterator<Item = &str> {
    frame::lines(merged).filter_map(|line| match frame::classify(line) {
        Frame::Data(payload) => Some(payload),
        _ => None,
    })
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Id of an assistant-authored message carried in a record's value object.
fn assistant_message_id(value: &Value) -> Option<&str> {
    let message = value.get("message")?;
    let role = message.get("author")?.get("role")?.as_str()?;
    if role != "assistant" {
        return None;
    }
    non_empty_str(message, "id")
}

/// Scan for the conversation id and latest assistant message id.
///
/// Both are last-write-wins in stream order.
pub fn extract_conversation(merged: &str) -> ConversationState {
    let mut state = ConversationState::default();

    for payload in data_payloads(merged) {
        let data: Value = match serde_json::from_str(payload) {
            Ok(v) => v,
            Err(e) => {
                trace!("skipping undecodable payload: {}", e);
                continue;
            }
        };
        let Some(value) = data.get("v").or_else(|| data.get("value")) else {
            continue;
        };

        if let Some(id) = assistant_message_id(value) {
            state.last_assistant_message_id = id.to_string();
        }
        if let Some(id) = non_empty_str(value, "conversation_id") {
            state.conversation_id = id.to_string();
        }
    }

    state
}

/// Final reply text: the last textual append at [`REPLY_PATH`].
pub fn extract_reply(merged: &str) -> String {
    let mut reply = String::new();

    for payload in data_payloads(merged) {
        let record = match PatchRecord::decode(payload) {
            Ok(r) => r,
            Err(e) => {
                trace!("skipping undecodable payload: {}", e);
                continue;
            }
        };
        if record.path() == Some(REPLY_PATH)
            && record.operation() == Some(APPEND_OP)
            && let Some(text) = record.text_value()
        {
            reply = text.to_string();
        }
    }

    reply
}
