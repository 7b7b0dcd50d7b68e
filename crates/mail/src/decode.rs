//! Message decoding for display
//!
//! Pure functions turning provider headers and part trees into summaries and
//! body text.

use base64::prelude::*;
use chrono::{DateTime, NaiveDateTime};

use crate::error::DecodeError;
use crate::models::{Header, MessageBody, MessageId, MessagePart, MessageSummary, RawMessage};

pub const NO_SUBJECT: &str = "No Subject";
pub const NO_SENDER: &str = "No Sender";
pub const NO_DATE: &str = "No Date";
pub const INVALID_DATE: &str = "Invalid Date";

/// Display format for summary dates
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Accepted after the strict RFC 2822 parse fails, weekday already removed
const ZONED_FORMATS: &[&str] = &["%d %b %Y %H:%M:%S %z", "%d %b %Y %H:%M %z"];
const LOCAL_FORMATS: &[&str] = &["%d %b %Y %H:%M:%S", "%d %b %Y %H:%M"];

/// Build the inbox row for a message from its headers
pub fn summarize(id: MessageId, headers: &[Header]) -> MessageSummary {
    let subject = find_header(headers, "Subject").unwrap_or(NO_SUBJECT);
    let sender = find_header(headers, "From").unwrap_or(NO_SENDER);
    // The placeholder goes through the same parser, so a missing header
    // and a malformed one both end up as INVALID_DATE.
    let date = find_header(headers, "Date").unwrap_or(NO_DATE);

    MessageSummary {
        id,
        sender: sender.to_string(),
        subject: subject.to_string(),
        date: format_date(date),
    }
}

/// Find a header value by name (case-insensitive, first match wins)
pub fn find_header<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Reformat an RFC 2822 date as `YYYY-MM-DD HH:MM` in its own offset
///
/// Dates without a zone, with single-digit hours, or with a weekday that
/// does not match the date are still accepted.
pub fn format_date(value: &str) -> String {
    parse_date(strip_trailing_comment(value))
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

fn parse_date(value: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.naive_local());
    }

    let value = strip_weekday(value);
    ZONED_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(value, format).ok())
        .map(|date| date.naive_local())
        .or_else(|| {
            LOCAL_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        })
}

/// Drop a leading `Tue,`-style day name
fn strip_weekday(value: &str) -> &str {
    match value.split_once(',') {
        Some((day, rest)) if day.trim().chars().all(|c| c.is_ascii_alphabetic()) => rest.trim(),
        _ => value,
    }
}

/// Drop a trailing `(UTC)`-style zone comment
fn strip_trailing_comment(value: &str) -> &str {
    let value = value.trim();
    match value.rfind('(') {
        Some(start) if value.ends_with(')') => value[..start].trim_end(),
        _ => value,
    }
}

/// Extract display text from a part tree
///
/// A leaf is decoded directly. For a multipart, only the direct children are
/// inspected and the first `text/plain` leaf with data is used.
pub fn extract_body(tree: &MessagePart) -> Result<MessageBody, DecodeError> {
    match tree {
        MessagePart::Leaf { data: Some(data), .. } => decode_base64_body(data).map(MessageBody::Text),
        MessagePart::Leaf { data: None, .. } => Ok(MessageBody::NoTextContent),
        MessagePart::Multipart { children, .. } => {
            let first_plain = children.iter().find_map(|child| match child {
                MessagePart::Leaf {
                    mime_type,
                    data: Some(data),
                } if mime_type == "text/plain" => Some(data),
                _ => None,
            });
            match first_plain {
                Some(data) => decode_base64_body(data).map(MessageBody::Text),
                None => Ok(MessageBody::NoTextContent),
            }
        }
    }
}

/// Extract display text from a fetched message
pub fn extract_message_body(message: &RawMessage) -> Result<MessageBody, DecodeError> {
    let tree = message.payload.as_ref().ok_or(DecodeError::MalformedPartTree)?;
    extract_body(tree)
}

/// Decode base64url body data as UTF-8, replacing invalid sequences
///
/// Gmail omits padding on some parts and includes it on others. CRLF line
/// endings come back as LF.
pub fn decode_base64_body(data: &str) -> Result<String, DecodeError> {
    let decoders: &[&base64::engine::GeneralPurpose] = &[&BASE64_URL_SAFE_NO_PAD, &BASE64_URL_SAFE];

    decoders
        .iter()
        .find_map(|decoder| decoder.decode(data.trim()).ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).replace("\r\n", "\n"))
        .ok_or(DecodeError::BadEncoding)
}
