//! multipart/mixed batch codec
//!
//! Google's batch endpoint takes up to 100 HTTP requests in one
//! `multipart/mixed` body and answers with one part per request. Each request
//! part carries `Content-ID: <item-N>`; the matching response part carries
//! `Content-ID: <response-item-N>`.

use anyhow::{Context, Result, bail};

/// One HTTP request inside a batch
#[derive(Debug, Clone)]
pub struct BatchPart {
    pub method: &'static str,
    /// Path and query, e.g. `/drive/v3/files/ID/permissions?transferOwnership=true`
    pub path: String,
    /// JSON body, if any
    pub body: Option<String>,
}

/// One response extracted from a batch response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItemResponse {
    /// Position of the matching request in the batch
    pub index: usize,
    pub status: u16,
    pub body: String,
}

/// Encode `parts` as a multipart/mixed body delimited by `boundary`
pub fn encode_batch_request(boundary: &str, parts: &[BatchPart]) -> String {
    let mut out = String::new();
    for (index, part) in parts.iter().enumerate() {
        out.push_str(&format!("--{boundary}\r\n"));
        out.push_str("Content-Type: application/http\r\n");
        out.push_str(&format!("Content-ID: <item-{index}>\r\n\r\n"));
        out.push_str(&format!("{} {}\r\n", part.method, part.path));
        match &part.body {
            Some(body) => {
                out.push_str("Content-Type: application/json; charset=UTF-8\r\n\r\n");
                out.push_str(body);
                out.push_str("\r\n");
            }
            None => out.push_str("\r\n"),
        }
    }
    out.push_str(&format!("--{boundary}--\r\n"));
    out
}

/// Extract the boundary parameter from a multipart Content-Type header
fn boundary_from_content_type(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("boundary="))
        .map(|b| b.trim_matches('"'))
        .filter(|b| !b.is_empty())
}

/// Split a header block from the content following the first blank line
fn split_headers(section: &str) -> (&str, &str) {
    match section.find("\n\n") {
        Some(pos) => (&section[..pos], &section[pos + 2..]),
        None => (section, ""),
    }
}

fn header_value<'a>(headers: &'a str, name: &str) -> Option<&'a str> {
    headers.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

/// Parse `<response-item-N>` into N
fn index_from_content_id(content_id: &str) -> Option<usize> {
    content_id
        .trim_matches(|c| c == '<' || c == '>')
        .rsplit('-')
        .next()
        .and_then(|n| n.parse().ok())
}

/// Decode a batch response body
///
/// `content_type` is the outer response's Content-Type header, which names
/// the boundary. Parts without a usable Content-ID are indexed by position.
pub fn decode_batch_response(content_type: &str, body: &str) -> Result<Vec<BatchItemResponse>> {
    let boundary = boundary_from_content_type(content_type)
        .with_context(|| format!("No boundary in batch Content-Type: {}", content_type))?;
    let delimiter = format!("--{boundary}");
    let body = body.replace("\r\n", "\n");

    let mut responses = Vec::new();
    // The first segment is the preamble before the first delimiter
    for (position, segment) in body.split(delimiter.as_str()).skip(1).enumerate() {
        if segment.starts_with("--") {
            break;
        }
        let segment = segment.trim_start_matches('\n');
        let (outer_headers, http) = split_headers(segment);

        let index = header_value(outer_headers, "Content-ID")
            .and_then(index_from_content_id)
            .unwrap_or(position);

        let (status_and_headers, item_body) = split_headers(http);
        let status_line = status_and_headers
            .lines()
            .next()
            .context("Batch response part without a status line")?;
        let status = status_line
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse::<u16>().ok())
            .with_context(|| format!("Invalid status line in batch response: {}", status_line))?;

        responses.push(BatchItemResponse {
            index,
            status,
            body: item_body.trim().to_string(),
        });
    }

    if responses.is_empty() && !body.trim().is_empty() {
        bail!("Batch response contained no parts");
    }

    Ok(responses)
}
