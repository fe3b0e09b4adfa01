//! Incremental decoder for chat-completions server-sent events.
//!
//! Bytes arrive in arbitrary chunks; only complete lines are decoded, so a
//! UTF-8 sequence or JSON payload split across chunks is reassembled first.
//! A body that closes before `[DONE]` is a failed reply, not a short one.

use std::fmt::Display;
use futures::future;
use futures::stream::{self, Stream, StreamExt};
use scout_core::ports::LlmStreamEvent;
use serde_json::Value;

pub const TRUNCATED_STREAM: &str = "response stream closed before [DONE]";

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    finished: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once `[DONE]` or an error payload has been seen.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed one chunk and return the events of every completed line.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<LlmStreamEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if self.finished {
                continue;
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.decode_line(line.trim_end_matches(['\r', '\n'])) {
                events.push(event);
            }
        }
        events
    }

    /// Stop decoding with an error; later input is ignored.
    pub fn fail(&mut self, message: impl Into<String>) -> LlmStreamEvent {
        self.finished = true;
        LlmStreamEvent::Error(message.into())
    }

    /// Called when the body ends. Any unterminated reply is an error.
    pub fn end(&mut self) -> Option<LlmStreamEvent> {
        if self.finished {
            return None;
        }
        if !self.buffer.is_empty() {
            log::debug!("dropping {} bytes of an unterminated line", self.buffer.len());
        }
        Some(self.fail(TRUNCATED_STREAM))
    }

    fn decode_line(&mut self, line: &str) -> Option<LlmStreamEvent> {
        // Comments and event/id fields carry nothing for us
        let data = line.strip_prefix("data:")?.trim();
        if data == "[DONE]" {
            self.finished = true;
            return Some(LlmStreamEvent::Done);
        }

        let event = parse_chunk(data);
        if matches!(event, Some(LlmStreamEvent::Error(_))) {
            self.finished = true;
        }
        event
    }
}

/// Turn a chunked response body into stream events. The last event is always
/// `Done` or `Error`.
pub fn decode_stream<S, B, E>(body: S) -> impl Stream<Item = LlmStreamEvent>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    body.map(Some)
        .chain(stream::once(future::ready(None)))
        .scan(SseDecoder::new(), |decoder, chunk| {
            let events = match chunk {
                _ if decoder.is_finished() => Vec::new(),
                Some(Ok(bytes)) => decoder.push(bytes.as_ref()),
                Some(Err(e)) => vec![decoder.fail(e.to_string())],
                None => decoder.end().into_iter().collect(),
            };
            future::ready(Some(stream::iter(events)))
        })
        .flatten()
}

/// Decode one `data:` payload into a delta, or an error if the provider sent one.
pub fn parse_chunk(data: &str) -> Option<LlmStreamEvent> {
    let value: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            log::debug!("skipping undecodable stream chunk: {}", e);
            return None;
        }
    };

    if let Some(error) = value.get("error") {
        let message = error["message"]
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| error.to_string());
        return Some(LlmStreamEvent::Error(message));
    }

    value["choices"][0]["delta"]["content"]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(|s| LlmStreamEvent::Delta(s.to_string()))
}
