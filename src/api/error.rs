use thiserror::Error;

/// Failure talking to the Discovery API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Upstream answered with a non-2xx status.
    #[error("request failed with status {0}")]
    Status(u16),

    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// A response arrived but its body was not the expected JSON.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Message suitable for showing to the user in place of the results.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status(code) => format!("Request failed with status {}", code),
            ApiError::Transport(message) if !message.is_empty() => message.clone(),
            _ => "Something went wrong.".to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        // the request URL carries the API key in its query string
        let err = err.without_url();
        if let Some(status) = err.status() {
            ApiError::Status(status.as_u16())
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}
