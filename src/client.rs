//! Client facade tying message composition and listening to one transport.

use std::sync::Arc;

use crate::error::Result;
use crate::listener::{ListenerController, ListenerState};
use crate::message::{ComposedMessage, Destination, MessageComposer};
use crate::transport::{MessageHandler, Transport};

/// A messaging client over an already authenticated session.
pub struct Client<T: Transport> {
    transport: Arc<T>,
    composer: MessageComposer<T>,
    listener: ListenerController<T>,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        let transport = Arc::new(transport);
        Self {
            composer: MessageComposer::new(Arc::clone(&transport)),
            listener: ListenerController::new(Arc::clone(&transport)),
            transport,
        }
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Builds a message from raw text, resolving `@name` mentions.
    ///
    /// # Errors
    ///
    /// Propagates errors from the transport's user search.
    pub fn compose(&self, text: &str) -> Result<ComposedMessage> {
        self.composer.compose(text)
    }

    /// Sends `text` to `destination`.
    ///
    /// # Errors
    ///
    /// Propagates user search and transport errors.
    pub fn send(&self, text: &str, destination: &Destination) -> Result<()> {
        self.composer.send(text, destination)
    }

    /// Sends `text` to exactly one of `user_id` or `group_id`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDestination` if neither or both ids are given.
    pub fn send_message(
        &self,
        text: &str,
        user_id: Option<&str>,
        group_id: Option<&str>,
    ) -> Result<()> {
        self.composer.send_message(text, user_id, group_id)
    }

    /// Starts the background receive loop.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyListening` if the client is already listening.
    pub fn start_listen<H: MessageHandler>(&self, handler: H) -> Result<()> {
        self.listener.start(handler)
    }

    /// Stops the receive loop and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns `NotListening` if the client was not listening.
    pub fn stop_listen(&self) -> Result<()> {
        self.listener.stop()
    }

    #[must_use]
    pub fn listener_state(&self) -> ListenerState {
        self.listener.state()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;
    use crate::directory::UserDirectory;
    use crate::error::ClientError;
    use crate::loopback::LoopbackTransport;
    use crate::mention::MentionSpan;
    use crate::types::{IncomingMessage, User};

    fn client() -> Client<LoopbackTransport> {
        let directory = UserDirectory::new(vec![User::new("U1", "Bob"), User::new("U2", "Alice")]);
        Client::new(LoopbackTransport::new(directory, Duration::from_millis(5)))
    }

    #[test]
    fn sent_messages_reach_the_listener() -> Result<()> {
        let client = client();
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        client.start_listen(move |message: &IncomingMessage| {
            tx.lock().unwrap().send(message.clone()).unwrap();
        })?;

        client.send_message("hello @Bob how are you", Some("U9"), None)?;
        let received = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(received.thread_id, "U9");
        assert_eq!(
            received.mentions,
            vec![MentionSpan {
                recipient_id: "U1".to_string(),
                offset: 6,
                length: 4,
            }]
        );

        client.stop_listen()?;
        assert_eq!(client.listener_state(), ListenerState::Idle);
        Ok(())
    }

    #[test]
    fn lifecycle_misuse_is_reported() -> Result<()> {
        let client = client();
        assert!(matches!(client.stop_listen(), Err(ClientError::NotListening)));
        client.start_listen(|_: &IncomingMessage| {})?;
        assert!(matches!(
            client.start_listen(|_: &IncomingMessage| {}),
            Err(ClientError::AlreadyListening)
        ));
        client.stop_listen()?;
        Ok(())
    }

    #[test]
    fn closing_the_session_stops_the_listener() -> Result<()> {
        let client = client();
        client.start_listen(|_: &IncomingMessage| {})?;
        client.transport().close();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while client.listener_state() != ListenerState::Stopped {
            assert!(std::time::Instant::now() < deadline);
            std::thread::sleep(Duration::from_millis(2));
        }
        assert!(matches!(client.stop_listen(), Err(ClientError::NotListening)));
        Ok(())
    }

    #[test]
    fn handler_can_stop_the_listener() -> Result<()> {
        let client = Arc::new(client());
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let inner = Arc::clone(&client);
        client.start_listen(move |message: &IncomingMessage| {
            if message.text == "quit" {
                let stopped = inner.stop_listen().is_ok();
                tx.lock().unwrap().send(stopped).unwrap();
            }
        })?;

        client.send_message("quit", Some("U9"), None)?;
        assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while client.listener_state() != ListenerState::Stopped {
            assert!(std::time::Instant::now() < deadline);
            std::thread::sleep(Duration::from_millis(2));
        }
        assert!(matches!(client.stop_listen(), Err(ClientError::NotListening)));
        assert_eq!(client.listener_state(), ListenerState::Idle);
        Ok(())
    }

    #[test]
    fn compose_without_mentions() -> Result<()> {
        let message = client().compose("no mentions here")?;
        assert!(message.mentions().is_empty());
        Ok(())
    }
}
