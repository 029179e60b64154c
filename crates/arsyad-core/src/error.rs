use thiserror::Error;

/// Description shown when a backend failure carries no message of its own.
pub const GENERIC_ERROR_DESCRIPTION: &str = "Terjadi kesalahan sistem.";

/// Failure of the response collaborator (backend, network or quota).
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("request failed: {0}")]
    Http(reqwest::Error),

    #[error("{provider} API error {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} returned an empty response")]
    Empty(&'static str),

    #[error("{0}")]
    Backend(String),
}

impl From<reqwest::Error> for ResponseError {
    /// Request URLs can carry credentials, so they never reach the message.
    fn from(err: reqwest::Error) -> Self {
        ResponseError::Http(err.without_url())
    }
}

impl ResponseError {
    /// Human-readable description for the error banner.
    pub fn description(&self) -> String {
        let text = self.to_string();
        if text.trim().is_empty() {
            GENERIC_ERROR_DESCRIPTION.to_string()
        } else {
            text
        }
    }
}

/// Rejections raised by the conversation controller itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("a message is already being answered")]
    SendInFlight,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API key configured for {0}; set GEMINI_API_KEY or add it to the config file")]
    MissingApiKey(&'static str),

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),
}
