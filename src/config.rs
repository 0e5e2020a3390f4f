//! Persistence for the conversation session (`session.json`).
//!
//! The session carries the credentials handed over by the external login flow and
//! the two ids needed to continue a conversation. It lives in the platform config
//! directory unless a path is given explicitly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::stream::Reassembly;

/// Model requested when none is configured.
pub const DEFAULT_MODEL: &str = "auto";

/// Continuation state and credentials (persisted to session.json).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "usertoken", default)]
    pub user_token: String,
    #[serde(default)]
    pub cookie: String,
    /// Id of the last assistant message; the parent of the next user message.
    #[serde(rename = "parentMessageID", default)]
    pub parent_message_id: String,
    #[serde(rename = "conversationID", default)]
    pub conversation_id: String,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for Session {
    fn default() -> Self {
        Self {
            user_token: String::new(),
            cookie: String::new(),
            parent_message_id: String::new(),
            conversation_id: String::new(),
            model: default_model(),
        }
    }
}

impl Session {
    /// Take the continuation ids from a finished exchange.
    ///
    /// Empty ids leave the stored value alone. Returns whether anything changed.
    pub fn apply(&mut self, reassembly: &Reassembly) -> bool {
        let mut changed = false;
        if !reassembly.message_id.is_empty() && reassembly.message_id != self.parent_message_id {
            self.parent_message_id = reassembly.message_id.clone();
            changed = true;
        }
        if !reassembly.conversation_id.is_empty()
            && reassembly.conversation_id != self.conversation_id
        {
            self.conversation_id = reassembly.conversation_id.clone();
            changed = true;
        }
        changed
    }

    /// Start a fresh conversation on the default model.
    pub fn reset(&mut self) {
        self.parent_message_id.clear();
        self.conversation_id.clear();
        self.model = default_model();
    }

    /// Drop the cookie so the login flow runs again.
    pub fn clear_cookie(&mut self) {
        self.cookie.clear();
    }

    pub fn has_credentials(&self) -> bool {
        !self.user_token.is_empty()
    }

    /// Copy safe for display: secrets replaced by a marker.
    pub fn redacted(&self) -> Self {
        fn mask(s: &str) -> String {
            if s.is_empty() {
                String::new()
            } else {
                "<redacted>".to_string()
            }
        }
        Self {
            user_token: mask(&self.user_token),
            cookie: mask(&self.cookie),
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Directory helpers
// ---------------------------------------------------------------------------

/// Patchwire config directory (e.g. `~/.config/patchwire/`).
fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("patchwire"))
}

/// Default location of session.json.
pub fn default_session_path() -> Result<PathBuf> {
    config_dir()
        .map(|d| d.join("session.json"))
        .ok_or(Error::ConfigDirNotFound)
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load a session, returning defaults if the file does not exist.
///
/// An unreadable or malformed file is an error rather than a silent reset, since
/// saving over it would discard the stored credentials.
pub fn load_session(path: &Path) -> Result<Session> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no session at {}, using defaults", path.display());
            return Ok(Session::default());
        }
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&contents).map_err(|e| Error::Session {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Save a session, creating parent directories as needed.
pub fn save_session(session: &Session, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(session)?;
    atomic_write(path, json.as_bytes())?;
    debug!("session saved to {}", path.display());
    Ok(())
}

/// Write bytes to a file atomically: write to a temp file in the same
/// directory, then rename over the target. Prevents partial JSON on crash.
fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    use std::io::Write;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn reassembly(conversation_id: &str, message_id: &str) -> Reassembly {
        Reassembly {
            conversation_id: conversation_id.to_string(),
            message_id: message_id.to_string(),
            ..Reassembly::default()
        }
    }

    #[test]
    fn session_default_values() {
        let session = Session::default();
        assert_eq!(session.model, "auto");
        assert!(session.conversation_id.is_empty());
        assert!(!session.has_credentials());
    }

    #[test]
    fn session_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let session = Session {
            user_token: "tok".to_string(),
            cookie: "a=b".to_string(),
            parent_message_id: "m1".to_string(),
            conversation_id: "c1".to_string(),
            model: "gpt-4o".to_string(),
        };
        save_session(&session, &path).unwrap();
        assert_eq!(load_session(&path).unwrap(), session);
    }

    #[test]
    fn wire_field_names() {
        let session = Session {
            user_token: "tok".to_string(),
            parent_message_id: "m1".to_string(),
            conversation_id: "c1".to_string(),
            ..Session::default()
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["usertoken"], "tok");
        assert_eq!(json["parentMessageID"], "m1");
        assert_eq!(json["conversationID"], "c1");
        assert_eq!(json["cookie"], "");
        assert_eq!(json["model"], "auto");
    }

    #[test]
    fn load_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let session = load_session(&dir.path().join("session.json")).unwrap();
        assert_eq!(session, Session::default());
    }

    #[test]
    fn load_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not valid json!!!").unwrap();

        match load_session(&path) {
            Err(Error::Session { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected session error, got {other:?}"),
        }
    }

    #[test]
    fn session_extra_fields_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"usertoken":"t","conversationID":"c","unknown_field":42}"#).unwrap();

        let session = load_session(&path).unwrap();
        assert_eq!(session.user_token, "t");
        assert_eq!(session.conversation_id, "c");
        assert_eq!(session.model, "auto");
    }

    #[test]
    fn apply_updates_non_empty_ids() {
        let mut session = Session::default();
        assert!(session.apply(&reassembly("c1", "m1")));
        assert_eq!(session.conversation_id, "c1");
        assert_eq!(session.parent_message_id, "m1");

        assert!(session.apply(&reassembly("", "m2")));
        assert_eq!(session.conversation_id, "c1");
        assert_eq!(session.parent_message_id, "m2");
    }

    #[test]
    fn apply_without_ids_changes_nothing() {
        let mut session = Session {
            conversation_id: "c1".to_string(),
            parent_message_id: "m1".to_string(),
            ..Session::default()
        };
        assert!(!session.apply(&reassembly("", "")));
        assert!(!session.apply(&reassembly("c1", "m1")));
        assert_eq!(session.parent_message_id, "m1");
    }

    #[test]
    fn reset_clears_ids_and_model() {
        let mut session = Session {
            user_token: "tok".to_string(),
            conversation_id: "c1".to_string(),
            parent_message_id: "m1".to_string(),
            model: "gpt-4o".to_string(),
            ..Session::default()
        };
        session.reset();
        assert!(session.conversation_id.is_empty());
        assert!(session.parent_message_id.is_empty());
        assert_eq!(session.model, "auto");
        assert_eq!(session.user_token, "tok");
    }

    #[test]
    fn clear_cookie_keeps_token() {
        let mut session = Session {
            user_token: "tok".to_string(),
            cookie: "a=b".to_string(),
            ..Session::default()
        };
        session.clear_cookie();
        assert!(session.cookie.is_empty());
        assert!(session.has_credentials());
    }

    #[test]
    fn redacted_hides_secrets_only() {
        let session = Session {
            user_token: "tok".to_string(),
            cookie: String::new(),
            conversation_id: "c1".to_string(),
            ..Session::default()
        };
        let shown = session.redacted();
        assert_eq!(shown.user_token, "<redacted>");
        assert_eq!(shown.cookie, "");
        assert_eq!(shown.conversation_id, "c1");
    }
}
