//! Outbound message construction and addressing.

use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};
use crate::mention::{self, MentionSpan};
use crate::transport::Transport;
use crate::types::ThreadType;

/// A message body together with its resolved mentions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedMessage {
    text: String,
    mentions: Vec<MentionSpan>,
}

impl ComposedMessage {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn mentions(&self) -> &[MentionSpan] {
        &self.mentions
    }
}

/// The single recipient of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Destination {
    User(String),
    Group(String),
}

impl Destination {
    /// Builds a destination from an optional user id and an optional group id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDestination` unless exactly one id is given.
    pub fn from_ids(user_id: Option<&str>, group_id: Option<&str>) -> Result<Self> {
        match (user_id, group_id) {
            (Some(user_id), None) => Ok(Destination::User(user_id.to_string())),
            (None, Some(group_id)) => Ok(Destination::Group(group_id.to_string())),
            (None, None) => Err(ClientError::InvalidDestination(
                "must provide a user id or a group id".to_string(),
            )),
            (Some(_), Some(_)) => Err(ClientError::InvalidDestination(
                "must only provide one of a user id or a group id".to_string(),
            )),
        }
    }

    #[must_use]
    pub fn thread_type(&self) -> ThreadType {
        match self {
            Destination::User(_) => ThreadType::User,
            Destination::Group(_) => ThreadType::Group,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Destination::User(id) | Destination::Group(id) => id,
        }
    }
}

/// Builds messages from raw text and hands them to the transport.
pub struct MessageComposer<T: Transport> {
    transport: Arc<T>,
}

impl<T: Transport> MessageComposer<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Builds a [`ComposedMessage`], resolving mentions through the transport's user search.
    ///
    /// # Errors
    ///
    /// Propagates errors from the user search.
    pub fn compose(&self, text: &str) -> Result<ComposedMessage> {
        let mentions = mention::resolve(text, |name| self.transport.search_for_users(name))?;
        debug!("Composed message with {} mention(s)", mentions.len());
        Ok(ComposedMessage {
            text: text.to_string(),
            mentions,
        })
    }

    /// Composes `text` and sends it to `destination`.
    ///
    /// # Errors
    ///
    /// Propagates errors from the user search and from the transport.
    pub fn send(&self, text: &str, destination: &Destination) -> Result<()> {
        let message = self.compose(text)?;
        let thread_type = destination.thread_type();
        info!("Sending message to {thread_type} {}", destination.id());
        self.transport.send(&message, thread_type, destination.id())
    }

    /// Validates the id pair, then composes and sends.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDestination` before touching the transport if the ids
    /// don't name exactly one destination.
    pub fn send_message(
        &self,
        text: &str,
        user_id: Option<&str>,
        group_id: Option<&str>,
    ) -> Result<()> {
        let destination = Destination::from_ids(user_id, group_id)?;
        self.send(text, &destination)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::transport::MessageHandler;
    use crate::types::User;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(ComposedMessage, ThreadType, String)>>,
        searches: Mutex<Vec<String>>,
    }

    impl Transport for RecordingTransport {
        fn search_for_users(&self, name: &str) -> Result<Vec<User>> {
            self.searches.lock().unwrap().push(name.to_string());
            Ok(if name == "Bob" {
                vec![User::new("U1", "Bob")]
            } else {
                Vec::new()
            })
        }

        fn send(
            &self,
            message: &ComposedMessage,
            thread_type: ThreadType,
            thread_id: &str,
        ) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((message.clone(), thread_type, thread_id.to_string()));
            Ok(())
        }

        fn do_one_listen(&self, _handler: &dyn MessageHandler) -> Result<bool> {
            Ok(false)
        }
    }

    fn composer() -> (Arc<RecordingTransport>, MessageComposer<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        (Arc::clone(&transport), MessageComposer::new(transport))
    }

    #[test]
    fn compose_keeps_text_and_mentions() -> Result<()> {
        let (_, composer) = composer();
        let message = composer.compose("hello @Bob how are you")?;
        assert_eq!(message.text(), "hello @Bob how are you");
        assert_eq!(message.mentions().len(), 1);
        assert_eq!(message.mentions()[0].offset, 6);
        Ok(())
    }

    #[test]
    fn compose_accepts_empty_text() -> Result<()> {
        let (_, composer) = composer();
        let message = composer.compose("")?;
        assert!(message.mentions().is_empty());
        Ok(())
    }

    #[test]
    fn send_to_user_uses_user_thread() -> Result<()> {
        let (transport, composer) = composer();
        composer.send_message("hi", Some("U9"), None)?;
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, ThreadType::User);
        assert_eq!(sent[0].2, "U9");
        Ok(())
    }

    #[test]
    fn send_to_group_uses_group_thread() -> Result<()> {
        let (transport, composer) = composer();
        composer.send("hi @Bob", &Destination::Group("G1".to_string()))?;
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].1, ThreadType::Group);
        assert_eq!(sent[0].2, "G1");
        assert_eq!(sent[0].0.mentions()[0].recipient_id, "U1");
        Ok(())
    }

    #[test]
    fn send_rejects_both_ids_before_any_transport_call() {
        let (transport, composer) = composer();
        let result = composer.send_message("hi @Bob", Some("U9"), Some("G1"));
        assert!(matches!(result, Err(ClientError::InvalidDestination(_))));
        assert!(transport.sent.lock().unwrap().is_empty());
        assert!(transport.searches.lock().unwrap().is_empty());
    }

    #[test]
    fn send_rejects_missing_ids() {
        let (transport, composer) = composer();
        let result = composer.send_message("hi", None, None);
        assert!(matches!(result, Err(ClientError::InvalidDestination(_))));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn destination_serializes_as_tagged_pair() -> std::result::Result<(), serde_json::Error> {
        let json = serde_json::to_string(&Destination::Group("G1".to_string()))?;
        assert_eq!(json, r#"{"type":"group","id":"G1"}"#);
        Ok(())
    }
}
