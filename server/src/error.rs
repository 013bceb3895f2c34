use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;

use crate::access_token::AccessTokenError;

#[derive(Debug, thiserror::Error)]
pub enum AudioCallError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Access token error: {0}")]
    Token(#[from] AccessTokenError),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

impl ResponseError for AudioCallError {
    fn status_code(&self) -> StatusCode {
        match self {
            AudioCallError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AudioCallError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AudioCallError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_response = ErrorResponse {
            success: false,
            error: self.to_string(),
        };

        HttpResponse::build(status).json(error_response)
    }
}

pub type Result<T> = std::result::Result<T, AudioCallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            AudioCallError::RateLimitExceeded.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AudioCallError::Token(AccessTokenError::InvalidSignature).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AudioCallError::Config("missing key".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
