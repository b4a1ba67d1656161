//! Middleware for logging requests and responses.

use axum::{extract::Request, middleware::Next, response::Response};

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and the full body logged at the `debug` level. Password and token fields
/// are redacted before anything is written.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body_text) = extract_parts_and_body_text_from_request(request).await;

    let display_text = redact_json_field(&body_text, "password");
    log_request(&parts, &display_text);

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body_text) = extract_parts_and_body_text_from_response(response).await;
    let display_text = redact_json_field(&body_text, "access_token");
    log_response(&parts, &display_text);

    Response::from_parts(parts, body_text.into())
}

/// Replace the string value of a JSON field with asterisks.
///
/// Works on the serialized text rather than a parsed value so malformed
/// bodies still get logged (and still get redacted when the field appears).
fn redact_json_field(body_text: &str, field_name: &str) -> String {
    let needle = format!("\"{field_name}\"");
    let Some(key_start) = body_text.find(&needle) else {
        return body_text.to_string();
    };

    let after_key = key_start + needle.len();
    let Some(colon_offset) = body_text[after_key..].find(':') else {
        return body_text.to_string();
    };
    let Some(quote_offset) = body_text[after_key + colon_offset..].find('"') else {
        return body_text.to_string();
    };

    let value_start = after_key + colon_offset + quote_offset + 1;
    let mut value_end = value_start;
    let bytes = body_text.as_bytes();
    while value_end < bytes.len() && !(bytes[value_end] == b'"' && bytes[value_end - 1] != b'\\') {
        value_end += 1;
    }

    format!(
        "{}********{}",
        &body_text[..value_start],
        &body_text[value_end..]
    )
}

async fn extract_parts_and_body_text_from_request(
    request: Request,
) -> (axum::http::request::Parts, String) {
    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    (parts, String::from_utf8_lossy(&body_bytes).to_string())
}

async fn extract_parts_and_body_text_from_response(
    response: Response,
) -> (axum::http::response::Parts, String) {
    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    (parts, String::from_utf8_lossy(&body_bytes).to_string())
}

/// The maximum number of characters of a request or response body that will
/// be included in INFO level logs. Bodies are logged in full at DEBUG level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {:}...",
            parts.method,
            parts.uri,
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        );
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {:}...",
            parts.status,
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", parts.status);
    }
}

#[cfg(test)]
mod redaction_tests {
    use super::redact_json_field;

    #[test]
    fn password_value_is_replaced() {
        let body = r#"{"email":"alice@example.com","password":"hunter2"}"#;

        let redacted = redact_json_field(body, "password");

        assert_eq!(
            redacted,
            r#"{"email":"alice@example.com","password":"********"}"#
        );
    }

    #[test]
    fn bodies_without_the_field_are_unchanged() {
        let body = r#"{"name":"Groceries"}"#;

        assert_eq!(redact_json_field(body, "password"), body);
    }

    #[test]
    fn non_json_bodies_are_passed_through() {
        assert_eq!(redact_json_field("not json", "password"), "not json");
    }
}
