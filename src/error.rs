//! Error types for everything that talks to the backend.
//!
//! Every network boundary returns [`ClientResult`].  None of these errors are
//! retried automatically: the UI shows them and waits for the user to
//! re-trigger the action.  The real-time channel is the only caller that
//! reconnects on its own (see [`crate::realtime`]).

use thiserror::Error;

/// Failure of a single backend request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection refused, timeout, TLS failure, body read failure, ...
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The body was not the JSON shape we expected.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Non-2xx status whose body could not be read as an envelope.
    #[error("HTTP error, status {status}")]
    Http { status: u16 },

    /// The backend answered with `status != "success"`.
    #[error("{message}")]
    Application { message: String },

    /// WebSocket failure on the parser log channel.
    #[error("realtime channel: {0}")]
    Realtime(#[from] tokio_tungstenite::tungstenite::Error),
}

impl ClientError {
    pub fn application(message: impl Into<String>) -> Self {
        Self::Application {
            message: message.into(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
