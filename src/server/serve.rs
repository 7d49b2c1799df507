//! File body responses with conditional and range handling.

use axum::{
    body::Body,
    http::{
        header::{
            ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, IF_MODIFIED_SINCE,
            LAST_MODIFIED, RANGE,
        },
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::mime::sniff_mime;
use crate::transform::Served;

/// How much of the body is sniffed when the name gives no content type.
const SNIFF_LEN: usize = 512;

/// Respond with `served`, honouring `If-Modified-Since` and a single
/// `Range: bytes=` request.
pub fn serve_content(headers: &HeaderMap, served: Served) -> Response {
    let content_type = content_type(&served.name, &served.body);
    let modified = truncate_to_secs(served.modified);
    let last_modified = httpdate::fmt_http_date(modified);

    if not_modified_since(headers, modified) {
        return Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header(LAST_MODIFIED, last_modified)
            .body(Body::empty())
            .unwrap_or_else(|_| StatusCode::NOT_MODIFIED.into_response());
    }

    let size = served.body.len();
    let builder = Response::builder()
        .header(CONTENT_TYPE, content_type)
        .header(LAST_MODIFIED, last_modified)
        .header(ACCEPT_RANGES, "bytes");

    let range = headers.get(RANGE).and_then(|v| v.to_str().ok());
    let response = match range.map(|r| parse_range(r, size)) {
        None | Some(RangeRequest::Multiple) => builder
            .status(StatusCode::OK)
            .header(CONTENT_LENGTH, size)
            .body(Body::from(served.body)),
        Some(RangeRequest::Single(start, end)) => builder
            .status(StatusCode::PARTIAL_CONTENT)
            .header(CONTENT_RANGE, format!("bytes {start}-{end}/{size}"))
            .header(CONTENT_LENGTH, end - start + 1)
            .body(Body::from(served.body.slice(start..=end))),
        Some(RangeRequest::Unsatisfiable) => builder
            .status(StatusCode::RANGE_NOT_SATISFIABLE)
            .header(CONTENT_RANGE, format!("bytes */{size}"))
            .body(Body::from("invalid range")),
    };

    response.unwrap_or_else(|e| {
        tracing::error!("Failed to build file response: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}

/// Content type from the name's extension, otherwise sniffed from the body.
pub fn content_type(name: &str, body: &[u8]) -> String {
    match mime_guess::from_path(name).first() {
        Some(mime) => mime.to_string(),
        None => sniff_mime(&body[..body.len().min(SNIFF_LEN)]),
    }
}

fn not_modified_since(headers: &HeaderMap, modified: SystemTime) -> bool {
    if modified <= UNIX_EPOCH {
        return false;
    }
    headers
        .get(IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| httpdate::parse_http_date(v).ok())
        .is_some_and(|since| modified <= since)
}

fn truncate_to_secs(time: SystemTime) -> SystemTime {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => UNIX_EPOCH + Duration::from_secs(d.as_secs()),
        Err(_) => UNIX_EPOCH,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum RangeRequest {
    /// Inclusive byte range.
    Single(usize, usize),
    /// Several ranges; answered with the whole body.
    Multiple,
    Unsatisfiable,
}

fn parse_range(header: &str, size: usize) -> RangeRequest {
    let Some(ranges) = header.trim().strip_prefix("bytes=") else {
        return RangeRequest::Unsatisfiable;
    };
    if ranges.contains(',') {
        return RangeRequest::Multiple;
    }
    let Some((start, end)) = ranges.trim().split_once('-') else {
        return RangeRequest::Unsatisfiable;
    };

    let (start, end) = (start.trim(), end.trim());
    let range = if start.is_empty() {
        // Suffix range: the last `end` bytes.
        match end.parse::<usize>() {
            Ok(0) | Err(_) => None,
            Ok(n) if size > 0 => Some((size.saturating_sub(n), size - 1)),
            Ok(_) => None,
        }
    } else {
        match (start.parse::<usize>(), end) {
            (Ok(s), "") if s < size => Some((s, size - 1)),
            (Ok(s), e) if s < size => e
                .parse::<usize>()
                .ok()
                .filter(|&e| e >= s)
                .map(|e| (s, e.min(size - 1))),
            _ => None,
        }
    };

    match range {
        Some((s, e)) => RangeRequest::Single(s, e),
        None => RangeRequest::Unsatisfiable,
    }
}
