use std::time::Duration;

use rag_core::error::AppError;
use serde::de::DeserializeOwned;

const MAX_ERROR_BODY_CHARS: usize = 512;

pub(crate) fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(5))
        .build()
}

/// Map a ureq outcome onto `code`: HTTP status failures carry the status and
/// the (bounded) response body, transport failures are retryable.
pub(crate) fn check_status(
    result: Result<ureq::Response, ureq::Error>,
    code: &str,
    what: &str,
) -> Result<ureq::Response, AppError> {
    match result {
        Ok(r) => Ok(r),
        Err(ureq::Error::Status(status, r)) => {
            let body = r.into_string().unwrap_or_default();
            Err(AppError::new(code, format!("{what} request failed"))
                .with_details(format!("status={status}; body={}", bounded(&body)))
                .with_retryable(status == 429 || status >= 500))
        }
        Err(ureq::Error::Transport(t)) => Err(AppError::new(
            code,
            format!("Failed to call {what} endpoint"),
        )
        .with_details(t.to_string())
        .with_retryable(true)),
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(
    resp: ureq::Response,
    code: &str,
    what: &str,
) -> Result<T, AppError> {
    resp.into_json::<T>().map_err(|e| {
        AppError::new(code, format!("Failed to decode {what} response")).with_details(e.to_string())
    })
}

pub(crate) fn encode_json<T: serde::Serialize>(
    value: &T,
    code: &str,
    what: &str,
) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| {
        AppError::new(code, format!("Failed to encode {what} request")).with_details(e.to_string())
    })
}

/// Percent-encode a single URL path segment (model ids contain `:`).
pub(crate) fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn bounded(body: &str) -> String {
    let mut out: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    if body.chars().count() > MAX_ERROR_BODY_CHARS {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_model_ids_for_paths() {
        assert_eq!(
            encode_path_segment("anthropic.claude-3-sonnet-20240229-v1:0"),
            "anthropic.claude-3-sonnet-20240229-v1%3A0"
        );
        assert_eq!(encode_path_segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn bounds_long_error_bodies() {
        let long = "x".repeat(600);
        let out = bounded(&long);
        assert_eq!(out.len(), MAX_ERROR_BODY_CHARS + 3);
        assert_eq!(bounded("short"), "short");
    }
}
