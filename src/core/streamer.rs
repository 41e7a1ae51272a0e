//! Drives one streamed model reply from request to cleaned text.

use std::io::Write;

use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::api::ChatMessage;
use crate::core::chat_stream::{InvocationError, ModelClient};
use crate::core::message::ROLE_USER;
use crate::core::reasoning::strip_reasoning;
use crate::core::session::ModelDescriptor;

/// Prefix of the text shown in place of a reply when the invocation failed.
pub const DIAGNOSTIC_PREFIX: &str = "Error:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    Streaming,
    Filtering,
    Done,
    Failed,
}

/// Receives every raw chunk as soon as it arrives.
///
/// Sinks are for live feedback only; what they do never changes the reply.
pub trait ChunkSink: Send {
    fn emit(&mut self, chunk: &str);
}

impl<F> ChunkSink for F
where
    F: FnMut(&str) + Send,
{
    fn emit(&mut self, chunk: &str) {
        self(chunk)
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ChunkSink for NullSink {
    fn emit(&mut self, _chunk: &str) {}
}

/// Echoes chunks to a writer, flushing after each one.
pub struct EchoSink<'a, W: Write + Send> {
    out: &'a mut W,
}

impl<'a, W: Write + Send> EchoSink<'a, W> {
    pub fn new(out: &'a mut W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> ChunkSink for EchoSink<'_, W> {
    fn emit(&mut self, chunk: &str) {
        let _ = write!(self.out, "{chunk}");
        let _ = self.out.flush();
    }
}

/// Turn a failed invocation into the text the interfaces display.
pub fn diagnostic(err: &InvocationError) -> String {
    format!("{DIAGNOSTIC_PREFIX} {err}")
}

pub struct ResponseStreamer<'a> {
    client: &'a dyn ModelClient,
    phase: StreamPhase,
}

impl<'a> ResponseStreamer<'a> {
    pub fn new(client: &'a dyn ModelClient) -> Self {
        Self {
            client,
            phase: StreamPhase::Idle,
        }
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    fn enter(&mut self, phase: StreamPhase) {
        debug!(from = ?self.phase, to = ?phase, "response streamer transition");
        self.phase = phase;
    }

    /// Send `prompt` as the only user message, accumulate the streamed reply
    /// and return it with reasoning spans removed.
    pub async fn run(
        &mut self,
        model: &ModelDescriptor,
        prompt: &str,
        sink: &mut dyn ChunkSink,
    ) -> Result<String, InvocationError> {
        let messages = vec![ChatMessage {
            role: ROLE_USER.to_string(),
            content: prompt.to_string(),
        }];

        self.enter(StreamPhase::Streaming);
        let mut stream = match self.client.chat_stream(model.as_str(), messages).await {
            Ok(stream) => stream,
            Err(err) => {
                self.enter(StreamPhase::Failed);
                return Err(err);
            }
        };

        let mut accumulated = String::new();
        let mut skipped = 0usize;
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => match chunk.content {
                    Some(content) => {
                        accumulated.push_str(&content);
                        sink.emit(&content);
                    }
                    None => skipped += 1,
                },
                Err(err) => {
                    self.enter(StreamPhase::Failed);
                    return Err(err);
                }
            }
        }
        if skipped > 0 {
            debug!(skipped, "ignored chunks without message content");
        }

        self.enter(StreamPhase::Filtering);
        let cleaned = strip_reasoning(&accumulated);
        self.enter(StreamPhase::Done);
        Ok(cleaned)
    }

    /// Like [`run`](Self::run), but a failure becomes an `Error: ...` reply.
    pub async fn run_to_text(
        &mut self,
        model: &ModelDescriptor,
        prompt: &str,
        sink: &mut dyn ChunkSink,
    ) -> String {
        match self.run(model, prompt, sink).await {
            Ok(text) => text,
            Err(err) => {
                warn!("model invocation failed: {err}");
                diagnostic(&err)
            }
        }
    }
}
