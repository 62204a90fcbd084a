//! In-process transport that delivers every sent message back to the listener.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use log::debug;

use crate::directory::UserDirectory;
use crate::error::{ClientError, Result};
use crate::message::ComposedMessage;
use crate::transport::{MessageHandler, Transport};
use crate::types::{IncomingMessage, ThreadType, User};

pub struct LoopbackTransport {
    directory: UserDirectory,
    poll_interval: Duration,
    outbox: Mutex<Option<Sender<IncomingMessage>>>,
    inbox: Mutex<Receiver<IncomingMessage>>,
}

impl LoopbackTransport {
    #[must_use]
    pub fn new(directory: UserDirectory, poll_interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            directory,
            poll_interval,
            outbox: Mutex::new(Some(tx)),
            inbox: Mutex::new(rx),
        }
    }

    /// Ends the session. Queued messages are still delivered, after which
    /// the receive loop stops and further sends fail.
    pub fn close(&self) {
        debug!("Closing loopback session");
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl Transport for LoopbackTransport {
    fn search_for_users(&self, name: &str) -> Result<Vec<User>> {
        Ok(self.directory.search(name))
    }

    fn send(
        &self,
        message: &ComposedMessage,
        thread_type: ThreadType,
        thread_id: &str,
    ) -> Result<()> {
        let outbox = self.outbox.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = outbox
            .as_ref()
            .ok_or_else(|| ClientError::Transport("session closed".to_string()))?;

        sender
            .send(IncomingMessage {
                thread_id: thread_id.to_string(),
                thread_type,
                text: message.text().to_string(),
                mentions: message.mentions().to_vec(),
                received_at: Utc::now(),
            })
            .map_err(|_| ClientError::Transport("session closed".to_string()))
    }

    fn do_one_listen(&self, handler: &dyn MessageHandler) -> Result<bool> {
        let received = self
            .inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv_timeout(self.poll_interval);

        match received {
            Ok(message) => {
                handler.on_message(&message);
                Ok(true)
            }
            Err(RecvTimeoutError::Timeout) => Ok(true),
            Err(RecvTimeoutError::Disconnected) => Ok(false),
        }
    }
}
