pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod listener;
pub mod loopback;
pub mod mention;
pub mod message;
pub mod transport;
pub mod types;

pub use client::Client;
pub use error::{ClientError, Result};
pub use listener::{ListenerController, ListenerState};
pub use mention::MentionSpan;
pub use message::{ComposedMessage, Destination, MessageComposer};
pub use transport::{MessageHandler, Transport};
pub use types::{IncomingMessage, ThreadType, User};
