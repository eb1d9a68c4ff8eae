//! Interpretation of management API responses.
//!
//! A 200 carries the typed payload, a 401 is fatal, and every other status is
//! reduced to the message the server put under the call site's error tag.

use anyhow::anyhow;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::client::{CliError, CliResult, RawResponse};

/// Key under which the management API reports failures.
pub(crate) const ERROR_TAG: &str = "Error";

/// Outcome of a call that reached the server and was not rejected as
/// unauthenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Envelope<T> {
    Success(T),
    Failure { status: StatusCode, message: String },
}

impl<T> Envelope<T> {
    /// Convert a failure into a printable domain error.
    pub(crate) fn into_result(self) -> CliResult<T> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure { message, .. } => Err(CliError::domain(message)),
        }
    }
}

/// Decode a 200 body into `T`.
pub(crate) fn decode_json<T: DeserializeOwned>(
    raw: &RawResponse,
    error_tag: &str,
) -> CliResult<Envelope<T>> {
    match raw.status {
        StatusCode::OK => serde_json::from_slice(&raw.body)
            .map(Envelope::Success)
            .map_err(|err| CliError::failure(anyhow!("invalid JSON response: {err}"))),
        StatusCode::UNAUTHORIZED => Err(CliError::Unauthorized),
        status => Ok(Envelope::Failure {
            status,
            message: server_message(status, &raw.body, error_tag),
        }),
    }
}

/// Decode a mutation response, returning the text under `message_tag` on
/// success.
pub(crate) fn decode_message(
    raw: &RawResponse,
    message_tag: &str,
    error_tag: &str,
) -> CliResult<Envelope<String>> {
    match decode_json::<Map<String, Value>>(raw, error_tag)? {
        Envelope::Success(map) => {
            let message = map.get(message_tag).map_or_else(
                || String::from_utf8_lossy(&raw.body).trim().to_string(),
                value_text,
            );
            Ok(Envelope::Success(message))
        }
        Envelope::Failure { status, message } => Ok(Envelope::Failure { status, message }),
    }
}

/// Hand back the raw body of a successful download.
pub(crate) fn decode_bytes(raw: &RawResponse, error_tag: &str) -> CliResult<Envelope<Vec<u8>>> {
    match raw.status {
        StatusCode::OK => Ok(Envelope::Success(raw.body.clone())),
        StatusCode::UNAUTHORIZED => Err(CliError::Unauthorized),
        status => Ok(Envelope::Failure {
            status,
            message: server_message(status, &raw.body, error_tag),
        }),
    }
}

/// Status line in the `404 Not Found` form.
pub(crate) fn status_line(status: StatusCode) -> String {
    status.canonical_reason().map_or_else(
        || status.as_str().to_string(),
        |reason| format!("{} {reason}", status.as_str()),
    )
}

fn server_message(status: StatusCode, body: &[u8], error_tag: &str) -> String {
    if body.iter().all(u8::is_ascii_whitespace) {
        return status_line(status);
    }
    serde_json::from_slice::<Map<String, Value>>(body)
        .ok()
        .and_then(|map| map.get(error_tag).map(value_text))
        .unwrap_or_else(|| status_line(status))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status: StatusCode::from_u16(status).expect("valid status"),
            body: body.as_bytes().to_vec(),
        }
    }

    #[derive(Debug, Deserialize, PartialEq, Eq)]
    struct Count {
        count: u32,
    }

    #[test]
    fn ok_body_decodes_into_target() {
        let decoded = decode_json::<Count>(&raw(200, r#"{"count":3}"#), ERROR_TAG).expect("decodes");
        assert_eq!(decoded, Envelope::Success(Count { count: 3 }));
    }

    #[test]
    fn malformed_ok_body_is_fatal() {
        let err = decode_json::<Count>(&raw(200, "{not json"), ERROR_TAG).expect_err("fatal");
        assert!(matches!(err, CliError::Failure(_)));
        assert!(err.display_message().contains("invalid JSON response"));
    }

    #[test]
    fn unauthorized_is_fatal() {
        let err = decode_json::<Count>(&raw(401, ""), ERROR_TAG).expect_err("fatal");
        assert!(matches!(err, CliError::Unauthorized));
    }

    #[test]
    fn error_tag_text_is_returned_verbatim() {
        let decoded = decode_json::<Count>(&raw(404, r#"{"Error":"role not found"}"#), ERROR_TAG)
            .expect("domain failure");
        assert_eq!(
            decoded,
            Envelope::Failure {
                status: StatusCode::NOT_FOUND,
                message: "role not found".to_string()
            }
        );
    }

    #[test]
    fn empty_body_yields_status_line() {
        let decoded = decode_json::<Count>(&raw(404, ""), ERROR_TAG).expect("domain failure");
        let err = decoded.into_result().expect_err("failure");
        assert!(matches!(err, CliError::Domain(message) if message == "404 Not Found"));
    }

    #[test]
    fn unparseable_error_body_falls_back_to_status_line() {
        let decoded =
            decode_json::<Count>(&raw(500, "<html>oops</html>"), ERROR_TAG).expect("failure");
        assert!(matches!(
            decoded,
            Envelope::Failure { message, .. } if message == "500 Internal Server Error"
        ));
    }

    #[test]
    fn mutation_message_is_taken_from_tag() {
        let decoded =
            decode_message(&raw(200, r#"{"Message":"done"}"#), "Message", ERROR_TAG).expect("ok");
        assert_eq!(decoded, Envelope::Success("done".to_string()));

        let decoded = decode_message(&raw(200, r#"{"status":true}"#), "status", ERROR_TAG)
            .expect("ok");
        assert_eq!(decoded, Envelope::Success("true".to_string()));
    }

    #[test]
    fn download_failure_uses_status_line() {
        let decoded = decode_bytes(&raw(404, ""), ERROR_TAG).expect("failure");
        assert!(matches!(
            decoded,
            Envelope::Failure { message, .. } if message == "404 Not Found"
        ));
        let decoded = decode_bytes(&raw(200, "line\n"), ERROR_TAG).expect("bytes");
        assert_eq!(decoded, Envelope::Success(b"line\n".to_vec()));
    }
}
