//! Streaming chat transport.
//!
//! [`ModelClient`] is the seam between the turn pipeline and the model server.
//! [`OllamaClient`] speaks Ollama's `/api/chat`, which answers a streaming
//! request with newline-delimited JSON objects until one carries `"done": true`.

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use memchr::memchr;
use tracing::debug;

use crate::api::{construct_api_url, ChatChunk, ChatMessage, ChatRequest};

/// One fragment of model output in transport order.
///
/// `content` is `None` when the server sent a line without usable message text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawChunk {
    pub content: Option<String>,
}

impl RawChunk {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
        }
    }

    pub fn malformed() -> Self {
        Self { content: None }
    }
}

pub type ChunkStream = BoxStream<'static, Result<RawChunk, InvocationError>>;

/// A model invocation that could not be completed.
#[derive(Debug)]
pub enum InvocationError {
    /// The request never reached the server.
    Connect(reqwest::Error),
    /// The server answered with a non-success status.
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    /// The response body broke off while streaming.
    Stream(reqwest::Error),
    /// The server reported an error inside the stream.
    Server(String),
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationError::Connect(source) => {
                write!(f, "could not reach the model server: {source}")
            }
            InvocationError::Status { status, body } => {
                let body = body.trim();
                if body.is_empty() {
                    write!(f, "model server responded with {status}")
                } else {
                    write!(f, "model server responded with {status}: {body}")
                }
            }
            InvocationError::Stream(source) => write!(f, "response stream interrupted: {source}"),
            InvocationError::Server(message) => write!(f, "{message}"),
        }
    }
}

impl StdError for InvocationError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            InvocationError::Connect(source) | InvocationError::Stream(source) => Some(source),
            InvocationError::Status { .. } | InvocationError::Server(_) => None,
        }
    }
}

/// Streaming chat capability of a model server.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Start a streamed chat completion for `messages` on `model`.
    async fn chat_stream(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<ChunkStream, InvocationError>;
}

#[derive(Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn chat_stream(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<ChunkStream, InvocationError> {
        let request = ChatRequest {
            model: model.to_string(),
            messages,
            stream: true,
        };

        let chat_url = construct_api_url(&self.base_url, "api/chat");
        debug!(url = %chat_url, model, "sending chat request");

        let response = self
            .http
            .post(chat_url)
            .json(&request)
            .send()
            .await
            .map_err(InvocationError::Connect)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(InvocationError::Status {
                status,
                body: extract_error_message(&body).unwrap_or(body),
            });
        }

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();

        Ok(decode_ndjson(bytes))
    }
}

struct DecodeState {
    bytes: BoxStream<'static, Result<Vec<u8>, reqwest::Error>>,
    decoder: NdjsonDecoder,
    pending: VecDeque<Result<RawChunk, InvocationError>>,
}

fn decode_ndjson(bytes: BoxStream<'static, Result<Vec<u8>, reqwest::Error>>) -> ChunkStream {
    let state = DecodeState {
        bytes,
        decoder: NdjsonDecoder::default(),
        pending: VecDeque::new(),
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.decoder.is_finished() {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(bytes)) => state.pending.extend(state.decoder.push(&bytes)),
                Some(Err(err)) => {
                    state.decoder.finished = true;
                    state.pending.push_back(Err(InvocationError::Stream(err)));
                }
                None => state.pending.extend(state.decoder.finish()),
            }
        }
    })
    .boxed()
}

/// Incremental splitter for newline-delimited JSON chat chunks.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
    finished: bool,
}

impl NdjsonDecoder {
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed raw bytes; returns every chunk completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Result<RawChunk, InvocationError>> {
        let mut out = Vec::new();
        if self.finished {
            return out;
        }
        self.buffer.extend_from_slice(bytes);

        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            self.handle_line(&line[..newline_pos], &mut out);
            if self.finished {
                self.buffer.clear();
                break;
            }
        }
        out
    }

    /// Signal end of body; a trailing line without newline is still decoded.
    pub fn finish(&mut self) -> Vec<Result<RawChunk, InvocationError>> {
        let mut out = Vec::new();
        if !self.finished && !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.handle_line(&line, &mut out);
        }
        self.finished = true;
        out
    }

    fn handle_line(&mut self, line: &[u8], out: &mut Vec<Result<RawChunk, InvocationError>>) {
        let line = match std::str::from_utf8(line) {
            Ok(line) => line.trim(),
            Err(e) => {
                debug!("skipping chunk with invalid UTF-8: {e}");
                out.push(Ok(RawChunk::malformed()));
                return;
            }
        };
        if line.is_empty() {
            return;
        }

        match serde_json::from_str::<ChatChunk>(line) {
            Ok(chunk) => {
                if let Some(message) = chunk.error {
                    out.push(Err(InvocationError::Server(message)));
                    self.finished = true;
                    return;
                }
                let content = chunk.message.and_then(|message| message.content);
                if content.is_some() || !chunk.done {
                    out.push(Ok(RawChunk { content }));
                }
                if chunk.done {
                    self.finished = true;
                }
            }
            Err(e) => {
                debug!("skipping undecodable chunk: {e}");
                out.push(Ok(RawChunk::malformed()));
            }
        }
    }
}

/// Pull the `error` text out of an Ollama error body such as `{"error":"model not found"}`.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body.trim()).ok()?;
    let message = value
        .get("error")
        .and_then(|error| match error {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(map) => map
                .get("message")
                .and_then(|m| m.as_str().map(str::to_owned)),
            _ => None,
        })?;
    Some(message.split_whitespace().collect::<Vec<_>>().join(" "))
}
