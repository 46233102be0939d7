//! Server-sent-event framing for the chat stream.
//!
//! The backend pushes one JSON object per SSE `data:` line.  This module
//! provides:
//! - [`drain_data_lines`] -- pull complete `data:` payloads from an SSE buffer
//! - [`parse_event_data`] -- map one payload to a [`ServerEvent`]
//! - [`sse_event_stream`] -- build a `BoxStream` of events from raw body chunks

use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tutor_domain::error::{Error, Result};
use tutor_domain::{BoxStream, ServerEvent};

/// Event separators, earliest match wins.
const SEPARATORS: [&[u8]; 3] = [b"\r\n\r\n", b"\n\n", b"\r\r"];

fn next_separator(buffer: &[u8]) -> Option<(usize, usize)> {
    SEPARATORS
        .iter()
        .filter_map(|sep| {
            buffer
                .windows(sep.len())
                .position(|w| w == *sep)
                .map(|pos| (pos, sep.len()))
        })
        .min_by_key(|(pos, _)| *pos)
}

/// Extract complete `data:` payloads from an SSE byte buffer.
///
/// SSE events are delimited by a blank line (`\n\n`, `\r\n\r\n` or
/// `\r\r`).  Each event block may contain `event:`, `data:`, `id:`, or
/// `retry:` lines.  We only care about `data:` lines.
///
/// The buffer is drained in-place: consumed bytes are removed and any
/// trailing partial event remains for the next call.  Blocks are decoded
/// only once complete, so a character split across network chunks is
/// never mangled; a complete block that is not UTF-8 is an
/// `Error::Stream`.
pub fn drain_data_lines(buffer: &mut Vec<u8>) -> Result<Vec<String>> {
    let mut data_lines = Vec::new();

    while let Some((pos, len)) = next_separator(buffer) {
        let block: Vec<u8> = buffer.drain(..pos + len).take(pos).collect();
        let block = std::str::from_utf8(&block)
            .map_err(|e| Error::Stream(format!("invalid UTF-8 in event stream: {e}")))?;

        for line in block.split(|c| c == '\r' || c == '\n') {
            let line = line.trim();
            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim();
                if !data.is_empty() {
                    data_lines.push(data.to_string());
                }
            }
        }
    }

    Ok(data_lines)
}

/// Interpret one `data:` payload.
///
/// Accepted shapes (either bare keys or a `type` tag):
/// - `{"connected": true}` / `{"type": "connected"}`
/// - `{"text": "..."}` / `{"type": "text", "text": "..."}`
/// - `{"done": true, "full_response": "..."}` / `{"type": "done", ...}`
///
/// Anything else, including non-JSON payloads, yields `None` and is
/// skipped by the consumer.
pub fn parse_event_data(data: &str) -> Option<ServerEvent> {
    let value: serde_json::Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, payload = data, "ignoring non-JSON stream payload");
            return None;
        }
    };

    let tag = value.get("type").and_then(|t| t.as_str());

    if tag == Some("done") || value.get("done").and_then(|d| d.as_bool()) == Some(true) {
        let full_response = value
            .get("full_response")
            .or_else(|| value.get("fullResponse"))
            .and_then(|f| f.as_str())
            .map(str::to_owned);
        return Some(ServerEvent::Done { full_response });
    }

    if let Some(text) = value.get("text").and_then(|t| t.as_str()) {
        return Some(ServerEvent::Text {
            text: text.to_owned(),
        });
    }

    if tag == Some("connected") || value.get("connected").is_some() {
        return Some(ServerEvent::Connected);
    }

    None
}

/// Build a [`BoxStream`] of [`ServerEvent`]s from raw SSE body chunks.
///
/// The stream:
/// 1. Buffers incoming chunks and drains complete SSE events
/// 2. Ends right after the first `Done` event
/// 3. Yields `Error::Stream` if the body closes before `Done`, or if no
///    chunk arrives within `idle_timeout`
/// 4. Forwards chunk-level errors (and undecodable event blocks) once
///    and then ends
pub fn sse_event_stream<S, B>(chunks: S, idle_timeout: Duration) -> BoxStream<'static, Result<ServerEvent>>
where
    S: Stream<Item = Result<B>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut chunks = Box::pin(chunks);
        let mut buffer: Vec<u8> = Vec::new();

        'outer: loop {
            let next = match tokio::time::timeout(idle_timeout, chunks.next()).await {
                Ok(next) => next,
                Err(_) => {
                    yield Err(Error::Stream(format!(
                        "no data for {}ms",
                        idle_timeout.as_millis()
                    )));
                    break;
                }
            };

            match next {
                Some(Ok(bytes)) => {
                    buffer.extend_from_slice(bytes.as_ref());
                    let lines = match drain_data_lines(&mut buffer) {
                        Ok(lines) => lines,
                        Err(e) => {
                            yield Err(e);
                            break;
                        }
                    };
                    for data in lines {
                        if let Some(event) = parse_event_data(&data) {
                            let done = matches!(event, ServerEvent::Done { .. });
                            yield Ok(event);
                            if done {
                                break 'outer;
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    yield Err(e);
                    break;
                }
                None => {
                    // Body closed; flush any unterminated final event.
                    if !buffer.iter().all(u8::is_ascii_whitespace) {
                        buffer.extend_from_slice(b"\n\n");
                        let lines = match drain_data_lines(&mut buffer) {
                            Ok(lines) => lines,
                            Err(e) => {
                                yield Err(e);
                                break;
                            }
                        };
                        for data in lines {
                            if let Some(event) = parse_event_data(&data) {
                                let done = matches!(event, ServerEvent::Done { .. });
                                yield Ok(event);
                                if done {
                                    break 'outer;
                                }
                            }
                        }
                    }
                    yield Err(Error::Stream("event stream closed before done".into()));
                    break;
                }
            }
        }
    };

    Box::pin(stream)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
