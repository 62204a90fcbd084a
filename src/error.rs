use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    #[error("Called start_listen when client is already listening")]
    AlreadyListening,

    #[error("Called stop_listen when client was not listening")]
    NotListening,

    #[error("User lookup error: {0}")]
    Lookup(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Listener thread panicked")]
    ListenerPanicked,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Returns true when the error is caused by misuse of the client API
    /// rather than by a collaborator failing.
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidDestination(_)
                | ClientError::AlreadyListening
                | ClientError::NotListening
        )
    }

    /// Returns a short message suitable for showing to someone at a terminal
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ClientError::InvalidDestination(_) => {
                "Provide exactly one of a user id or a group id.".to_string()
            }
            ClientError::AlreadyListening => "The client is already listening.".to_string(),
            ClientError::NotListening => "The client is not listening.".to_string(),
            ClientError::Lookup(_) => {
                "Sorry, I couldn't look up the people mentioned in that message.".to_string()
            }
            ClientError::Transport(_) => {
                "Sorry, I'm having trouble talking to the messaging service.".to_string()
            }
            ClientError::ListenerPanicked => {
                "The listener stopped unexpectedly. Check the logs for details.".to_string()
            }
            ClientError::Config(_) | ClientError::EnvVar(_) => {
                "There's a configuration issue. Check your environment or .env file.".to_string()
            }
            ClientError::Io(_) | ClientError::Json(_) => {
                "Couldn't read the user directory. Check the file path and contents.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_and_destination_errors_are_usage_errors() {
        assert!(ClientError::AlreadyListening.is_usage_error());
        assert!(ClientError::NotListening.is_usage_error());
        assert!(ClientError::InvalidDestination("both".to_string()).is_usage_error());
    }

    #[test]
    fn collaborator_errors_are_not_usage_errors() {
        assert!(!ClientError::Lookup("down".to_string()).is_usage_error());
        assert!(!ClientError::Transport("closed".to_string()).is_usage_error());
        assert!(!ClientError::ListenerPanicked.is_usage_error());
    }
}
