//! Body of the next conversation request.
//!
//! Sending it (headers, auth, retries) is the transport's job; this only shapes the
//! JSON from the stored session and the user's message.

use serde::Serialize;

use crate::config::Session;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub content_type: String,
    pub parts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMessage {
    pub author: Author,
    pub content: Content,
}

/// `action: "next"` request continuing (or starting) a conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextMessage {
    pub action: String,
    pub messages: Vec<OutgoingMessage>,
    pub conversation_id: String,
    pub parent_message_id: String,
    pub model: String,
}

impl NextMessage {
    /// Build the request for `message`, continuing the session's conversation.
    ///
    /// Empty ids are sent as empty strings, which the backend reads as "new conversation".
    pub fn from_session(session: &Session, message: &str) -> Self {
        Self {
            action: "next".to_string(),
            messages: vec![OutgoingMessage {
                author: Author {
                    role: "user".to_string(),
                },
                content: Content {
                    content_type: "text".to_string(),
                    parts: vec![message.to_string()],
                },
            }],
            conversation_id: session.conversation_id.clone(),
            parent_message_id: session.parent_message_id.clone(),
            model: session.model.clone(),
        }
    }
}
