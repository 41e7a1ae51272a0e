//! Turn lifecycle: prompt, stream, record.
//!
//! The coordinator owns the [`ConversationLog`]. In line mode [`TurnCoordinator::submit`]
//! runs the whole turn inline. In windowed mode [`TurnCoordinator::submit_async`]
//! spawns one worker task; the worker only produces a [`TurnCompletion`], and the
//! log is updated when the UI loop hands that completion back through
//! [`TurnCoordinator::complete`]. At most one turn is in flight at a time.

use std::borrow::Cow;
use std::fmt;

use tracing::{debug, warn};

use crate::core::chat_stream::InvocationError;
use crate::core::conversation::ConversationLog;
use crate::core::message::Turn;
use crate::core::prompt::build_prompt;
use crate::core::session::SessionContext;
use crate::core::streamer::{diagnostic, ChunkSink, ResponseStreamer};

/// Result of a worker's model invocation, waiting to be recorded.
#[derive(Debug)]
pub struct TurnCompletion {
    pub question: String,
    pub outcome: Result<String, InvocationError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRejected {
    /// Another turn is still waiting for its reply.
    TurnInFlight,
    /// The question was empty or whitespace.
    EmptyQuestion,
}

impl fmt::Display for TurnRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRejected::TurnInFlight => f.write_str("a reply is still pending"),
            TurnRejected::EmptyQuestion => f.write_str("nothing to send"),
        }
    }
}

impl std::error::Error for TurnRejected {}

pub struct TurnCoordinator {
    session: SessionContext,
    log: ConversationLog,
    in_flight: bool,
}

impl TurnCoordinator {
    pub fn new(session: SessionContext) -> Self {
        Self {
            session,
            log: ConversationLog::new(),
            in_flight: false,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight
    }

    fn prompt_for(&self, question: &str) -> String {
        let context = if self.session.include_failed_turns {
            Cow::Borrowed(&self.log)
        } else {
            Cow::Owned(self.log.without_failed_exchanges())
        };
        build_prompt(&context, question)
    }

    /// Run one turn to completion and return the text to display.
    ///
    /// Failures come back as `Error: ...` text and are recorded like any reply.
    pub async fn submit(&mut self, question: &str, sink: &mut dyn ChunkSink) -> String {
        let prompt = self.prompt_for(question);
        let outcome = ResponseStreamer::new(self.session.client.as_ref())
            .run(&self.session.model, &prompt, sink)
            .await;
        self.record(question.to_string(), outcome)
    }

    /// Start a turn on a background task.
    ///
    /// `on_complete` is called from the worker with the finished [`TurnCompletion`];
    /// it should forward the value to the thread that owns this coordinator, which
    /// then calls [`complete`](Self::complete).
    pub fn submit_async<S, F>(
        &mut self,
        question: &str,
        sink: S,
        on_complete: F,
    ) -> Result<(), TurnRejected>
    where
        S: ChunkSink + 'static,
        F: FnOnce(TurnCompletion) + Send + 'static,
    {
        if self.in_flight {
            debug!("submission ignored while a turn is pending");
            return Err(TurnRejected::TurnInFlight);
        }
        if question.trim().is_empty() {
            return Err(TurnRejected::EmptyQuestion);
        }
        self.in_flight = true;

        let prompt = self.prompt_for(question);
        let client = self.session.client.clone();
        let model = self.session.model.clone();
        let question = question.to_string();

        tokio::spawn(async move {
            let mut sink = sink;
            let outcome = ResponseStreamer::new(client.as_ref())
                .run(&model, &prompt, &mut sink)
                .await;
            debug!(ok = outcome.is_ok(), "turn worker finished");
            on_complete(TurnCompletion { question, outcome });
        });
        Ok(())
    }

    /// Record a worker's result and reopen the coordinator for the next turn.
    pub fn complete(&mut self, completion: TurnCompletion) -> String {
        self.in_flight = false;
        self.record(completion.question, completion.outcome)
    }

    fn record(&mut self, question: String, outcome: Result<String, InvocationError>) -> String {
        self.log.append(Turn::user(question));
        match outcome {
            Ok(reply) => {
                self.log.append(Turn::assistant(reply.clone()));
                reply
            }
            Err(err) => {
                warn!("model invocation failed: {err}");
                let text = diagnostic(&err);
                self.log.append(Turn::assistant_failed(text.clone()));
                text
            }
        }
    }
}
