//! Request/response logging with sensitive-field masking.
//!
//! One structured line per outbound call and one per inbound result, plus
//! optional verbose dumps of headers and bodies. Anything that looks like
//! a credential is masked before it reaches the log stream, keeping a
//! short prefix/suffix for debugging. Body dumps are pretty-printed and
//! capped so a large payload cannot flood the log.

use crate::logging::{log_debug, log_error, log_info, log_warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::HeaderMap;
use std::time::Duration;

/// Cap for logged bodies; anything longer is cut with a marker.
pub(crate) const MAX_LOGGED_BODY: usize = 1000;

/// Cap for the short error excerpt used in retry warnings.
const MAX_ERROR_EXCERPT: usize = 100;

// Masking patterns applied to body dumps, with safe fallback on
// compilation failure.
static BODY_MASKS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    let mut masks = Vec::new();
    if let Ok(re) = Regex::new(r#"("password"\s*:\s*")[^"]+""#) {
        masks.push((re, r#"$1***""#));
    }
    if let Ok(re) = Regex::new(r#"("secret"\s*:\s*")[^"]+""#) {
        masks.push((re, r#"$1***""#));
    }
    if let Ok(re) = Regex::new(r#"("jwt"\s*:\s*")[^"]{20}[^"]*""#) {
        masks.push((re, r#"$1[TOKEN_MASKED]...""#));
    }
    if let Ok(re) = Regex::new(r#"("token"\s*:\s*")[^"]{20}[^"]*""#) {
        masks.push((re, r#"$1[TOKEN_MASKED]...""#));
    }
    masks
});

/// Log the outbound side of a call: always one structured line, plus a
/// redacted header/body dump when verbose logging is enabled.
pub(crate) fn log_request(
    correlation_id: &str,
    method: &str,
    path: &str,
    headers: &HeaderMap,
    body: Option<&serde_json::Value>,
    verbose: bool,
) {
    log_info!(
        correlation_id = %correlation_id,
        method = %method,
        path = %path,
        "Outbound request"
    );

    if !verbose {
        return;
    }

    let rendered_headers: Vec<String> = headers
        .iter()
        .map(|(name, value)| {
            let value = value.to_str().unwrap_or("<non-ascii>");
            format!("{}: {}", name, mask_header(name.as_str(), value))
        })
        .collect();
    let rendered_body = body.map(|b| truncate_body(&mask_body(&pretty_json(b))));

    log_debug!(
        correlation_id = %correlation_id,
        method = %method,
        path = %path,
        headers = %rendered_headers.join("; "),
        body = %rendered_body.unwrap_or_default(),
        "Request detail"
    );
}

/// Log the inbound side of a call: always one structured line, plus a
/// redacted body dump (level chosen by status) when verbose logging is
/// enabled.
pub(crate) fn log_response(
    correlation_id: &str,
    status: u16,
    duration: Duration,
    body: &str,
    verbose: bool,
) {
    log_info!(
        correlation_id = %correlation_id,
        status = status,
        duration_ms = duration.as_millis() as u64,
        size = %format_size(body.len()),
        "Inbound response"
    );

    if !verbose || body.is_empty() {
        return;
    }

    let rendered = truncate_body(&mask_body(&pretty_body(body)));
    if status >= 500 {
        log_error!(correlation_id = %correlation_id, body = %rendered, "Response detail");
    } else if status >= 400 {
        log_warn!(correlation_id = %correlation_id, body = %rendered, "Response detail");
    } else {
        log_debug!(correlation_id = %correlation_id, body = %rendered, "Response detail");
    }
}

/// Warn about a scheduled retry after a server error.
pub(crate) fn log_retry(
    correlation_id: &str,
    operation: &str,
    attempt: u32,
    max_attempts: u32,
    status: u16,
    reason: &str,
) {
    log_warn!(
        correlation_id = %correlation_id,
        operation = %operation,
        attempt = attempt,
        max_attempts = max_attempts,
        status = status,
        reason = %reason,
        "Retrying after server error"
    );
}

/// Record an attempt that produced no response at all.
pub(crate) fn log_transport_failure(correlation_id: &str, operation: &str, error: &dyn std::fmt::Display) {
    log_error!(
        correlation_id = %correlation_id,
        operation = %operation,
        error = %error,
        "Request failed without a response"
    );
}

/// Mask a header value when its name suggests a credential, keeping a
/// short prefix and suffix for long values.
pub(crate) fn mask_header(name: &str, value: &str) -> String {
    let lower = name.to_lowercase();
    let sensitive = lower.contains("authorization")
        || lower.contains("token")
        || lower.contains("api-key")
        || lower.contains("secret");
    if !sensitive {
        return value.to_string();
    }

    match (value.get(..15), value.get(value.len().saturating_sub(5)..)) {
        (Some(prefix), Some(suffix)) if value.len() > 20 => {
            format!("{prefix}...{suffix} [MASKED]")
        }
        _ => "***[MASKED]***".to_string(),
    }
}

/// Mask credential-bearing JSON fields inside a body dump.
pub(crate) fn mask_body(text: &str) -> String {
    let mut masked = text.to_string();
    for (pattern, replacement) in BODY_MASKS.iter() {
        masked = pattern.replace_all(&masked, *replacement).into_owned();
    }
    masked
}

/// Cut a dump at [`MAX_LOGGED_BODY`] characters with an explicit marker.
pub(crate) fn truncate_body(text: &str) -> String {
    if text.len() <= MAX_LOGGED_BODY {
        return text.to_string();
    }
    let cut = (0..=MAX_LOGGED_BODY)
        .rev()
        .find(|i| text.is_char_boundary(*i))
        .unwrap_or(0);
    format!(
        "{}... [TRUNCATED - {} chars total]",
        &text[..cut],
        text.len()
    )
}

/// Pretty-print a raw body when it parses as JSON; pass it through
/// otherwise.
pub(crate) fn pretty_body(raw: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => pretty_json(&value),
        Err(_) => raw.to_string(),
    }
}

fn pretty_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Human-readable byte count for response-size fields.
pub(crate) fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Pull a short, human-meaningful reason out of an error body: a JSON
/// `message` or `error` field when present, otherwise a capped excerpt.
pub(crate) fn extract_error_message(status: u16, body: &str) -> String {
    if body.is_empty() {
        return format!("Status {status}");
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["message", "error"] {
            if let Some(message) = value.get(field).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }
    if body.len() > MAX_ERROR_EXCERPT {
        let cut = (0..=MAX_ERROR_EXCERPT)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}
