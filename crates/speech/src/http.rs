//! Response classification shared by the HTTP adapters.

use reqwest::StatusCode;

use crate::error::SpeechError;

/// Return the response unchanged on a 2xx, otherwise classify the status
/// into a [`SpeechError`] carrying the body text.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, SpeechError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(classify_status(status, body))
}

/// Parse a successful JSON response body into the expected type.
pub(crate) async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, SpeechError> {
    let response = ensure_success(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| SpeechError::InvalidResponse(e.to_string()))
}

pub(crate) fn classify_status(status: StatusCode, body: String) -> SpeechError {
    let code = status.as_u16();
    match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::PAYMENT_REQUIRED => {
            SpeechError::Quota { status: code, body }
        }
        // Some providers report exhausted credits as 401 with a
        // `quota_exceeded` detail.
        StatusCode::UNAUTHORIZED if body.contains("quota_exceeded") => {
            SpeechError::Quota { status: code, body }
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SpeechError::Auth { status: code, body },
        s if s.is_client_error() => SpeechError::InvalidRequest { status: code, body },
        _ => SpeechError::Transport(format!("HTTP {code}: {body}")),
    }
}
