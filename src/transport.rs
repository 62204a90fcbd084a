//! Collaborator traits implemented by the surrounding system.
//!
//! The client never talks to the network itself. Session handling, the wire
//! protocol and user search all live behind [`Transport`].

use log::error;

use crate::error::{ClientError, Result};
use crate::message::ComposedMessage;
use crate::types::{IncomingMessage, ThreadType, User};

/// An authenticated session with a messaging service.
///
/// Implementations are shared between the caller's thread and the listener
/// thread, so every method takes `&self`.
pub trait Transport: Send + Sync + 'static {
    /// Returns candidate users for a name fragment, best candidate first.
    ///
    /// # Errors
    ///
    /// Returns `Lookup` (or any other error) if the search itself fails.
    fn search_for_users(&self, name: &str) -> Result<Vec<User>>;

    /// Sends a message to a thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be delivered.
    fn send(
        &self,
        message: &ComposedMessage,
        thread_type: ThreadType,
        thread_id: &str,
    ) -> Result<()>;

    /// Prepares the session for receiving. Called once on the listener thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot start receiving.
    fn start_listening(&self) -> Result<()> {
        Ok(())
    }

    /// Performs one blocking receive step and dispatches every received
    /// event to `handler`.
    ///
    /// Returns `Ok(false)` when the session has ended and the loop should stop.
    ///
    /// # Errors
    ///
    /// Returns an error if receiving failed. The loop stops on error.
    fn do_one_listen(&self, handler: &dyn MessageHandler) -> Result<bool>;

    /// Tears down whatever `start_listening` set up. Called once on the
    /// listener thread, however the loop ended.
    fn stop_listening(&self) {}

    /// Receives errors raised by `start_listening` or `do_one_listen`.
    fn on_listen_error(&self, err: &ClientError) {
        error!("Listener error: {err}");
    }
}

/// Callbacks invoked from the listener thread.
pub trait MessageHandler: Send + Sync + 'static {
    /// Called for each received message.
    fn on_message(&self, message: &IncomingMessage);

    /// Called once the transport has started receiving.
    fn on_listening(&self) {}
}

impl<F> MessageHandler for F
where
    F: Fn(&IncomingMessage) + Send + Sync + 'static,
{
    fn on_message(&self, message: &IncomingMessage) {
        self(message);
    }
}
