//! Common types shared by the client and its transports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A user returned by a name lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier used as the mention recipient
    pub uid: String,
    /// Display name
    pub name: String,
}

impl User {
    pub fn new(uid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
        }
    }
}

/// Kind of thread a message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ThreadType {
    /// One-to-one conversation with a user
    User,
    /// Group conversation
    Group,
}

/// A message event received by the listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub thread_id: String,
    pub thread_type: ThreadType,
    pub text: String,
    pub mentions: Vec<crate::mention::MentionSpan>,
    pub received_at: DateTime<Utc>,
}
