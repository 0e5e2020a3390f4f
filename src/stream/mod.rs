//! Stream reassembly engine
//!
//! Raw event-stream text goes through two stages:
//!
//! 1. [`merge`] classifies each line, decodes patch records and folds text
//!    continuations into the record that opened them.
//! 2. [`extract_conversation`] and [`extract_reply`] read the merged stream for the
//!    continuation ids and the final reply text.
//!
//! The engine is total: malformed input is passed through, never reported as an error.

pub mod extract;
pub mod frame;
pub mod merge;
pub mod record;

pub use extract::{ConversationState, REPLY_PATH, extract_conversation, extract_reply};
pub use merge::{Merger, merge};
pub use record::{PatchRecord, PatchValue};

use tracing::debug;

/// Everything a single reassembly pass produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reassembly {
    /// The merged stream, one line per record or passthrough.
    pub merged: String,
    pub conversation_id: String,
    pub message_id: String,
    pub reply: String,
}

/// Merge a raw stream and extract ids and reply text from the result.
pub fn reassemble(raw: &str) -> Reassembly {
    let merged = merge(raw);
    let ConversationState {
        conversation_id,
        last_assistant_message_id,
    } = extract_conversation(&merged);
    let reply = extract_reply(&merged);

    debug!(
        conversation_id = %conversation_id,
        message_id = %last_assistant_message_id,
        reply_chars = reply.chars().count(),
        "stream reassembled"
    );

    Reassembly {
        merged,
        conversation_id,
        message_id: last_assistant_message_id,
        reply,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassemble_runs_both_stages() {
        let raw = concat!(
            "event: delta_encoding\n",
            "data: \"v1\"\n",
            "\n",
            "event: delta\n",
            "data: {\"p\":\"\",\"o\":\"add\",\"v\":{\"message\":{\"id\":\"m-9\",\"author\":{\"role\":\"assistant\"}},\"conversation_id\":\"c-9\"}}\n",
            "\n",
            "event: delta\n",
            "data: {\"p\":\"/message/content/parts/0\",\"o\":\"append\",\"v\":\"Hi\"}\n",
            "\n",
            "event: delta\n",
            "data: {\"v\":\" there\"}\n",
            "\n",
            "data: [DONE]\n",
        );

        let out = reassemble(raw);
        assert_eq!(out.conversation_id, "c-9");
        assert_eq!(out.message_id, "m-9");
        assert_eq!(out.reply, "Hi there");
        assert_eq!(out.merged.lines().count(), 2);
    }

    #[test]
    fn reassemble_of_nothing_is_empty() {
        assert_eq!(reassemble(""), Reassembly::default());
    }
}
