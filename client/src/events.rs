//! Server-sent event decoding
//!
//! The server frames each broadcast event as `event: <name>` followed by
//! `data: <json>` and a blank line. Comment lines (keep-alives, the connect
//! greeting) and `retry:` fields carry no event and are skipped.

use std::collections::VecDeque;

use futures_util::stream::{self, Stream, StreamExt};

use cn_core::domain::events::BroadcastEvent;

use crate::error::{ClientError, ClientResult};

/// Incremental decoder fed with raw chunks as they arrive
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every event completed by it
    ///
    /// A frame split across chunks is held until its terminating blank line
    /// arrives.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<ClientResult<BroadcastEvent>> {
        self.buffer.extend_from_slice(chunk);

        let mut decoded = Vec::new();
        while let Some((end, separator_len)) = find_frame_end(&self.buffer) {
            let frame: Vec<u8> = self.buffer.drain(..end + separator_len).take(end).collect();
            if let Some(result) = decode_frame(&frame) {
                decoded.push(result);
            }
        }
        decoded
    }
}

fn find_frame_end(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn decode_frame(frame: &[u8]) -> Option<ClientResult<BroadcastEvent>> {
    let text = match std::str::from_utf8(frame) {
        Ok(text) => text,
        Err(e) => return Some(Err(ClientError::Transport(format!("invalid UTF-8 in event stream: {}", e)))),
    };

    let mut name = None;
    let mut data: Vec<&str> = Vec::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => name = Some(value),
            "data" => data.push(value),
            _ => {}
        }
    }

    if data.is_empty() {
        return None;
    }

    let event = match serde_json::from_str::<BroadcastEvent>(&data.join("\n")) {
        Ok(event) => event,
        Err(e) => return Some(Err(e.into())),
    };
    if let Some(name) = name {
        if name != event.name() {
            tracing::warn!(frame_event = name, payload_event = event.name(), "Event name does not match payload");
        }
    }
    Some(Ok(event))
}

/// Turn a byte stream into a stream of decoded events
pub fn decode_stream<S, B, E>(bytes: S) -> impl Stream<Item = ClientResult<BroadcastEvent>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<ClientError>,
{
    let pending: VecDeque<ClientResult<BroadcastEvent>> = VecDeque::new();
    let state = (Box::pin(bytes), SseDecoder::new(), pending);

    stream::unfold(state, |(mut bytes, mut decoder, mut pending)| async move {
        loop {
            if let Some(item) = pending.pop_front() {
                return Some((item, (bytes, decoder, pending)));
            }
            match bytes.next().await {
                Some(Ok(chunk)) => pending.extend(decoder.push(chunk.as_ref())),
                Some(Err(e)) => return Some((Err(e.into()), (bytes, decoder, pending))),
                None => return None,
            }
        }
    })
}
