use std::fmt;
use std::sync::Arc;

use crate::core::chat_stream::ModelClient;

/// Model used when discovery fails or the user makes no usable choice.
pub const DEFAULT_MODEL: &str = "deepseek-r1";

/// Name of the server-side model answering this session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelDescriptor(String);

impl ModelDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_MODEL
    }
}

impl Default for ModelDescriptor {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl fmt::Display for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything fixed for the lifetime of one chat session.
#[derive(Clone)]
pub struct SessionContext {
    pub client: Arc<dyn ModelClient>,
    pub model: ModelDescriptor,
    /// Whether exchanges that ended in a diagnostic are replayed to the model.
    pub include_failed_turns: bool,
}

impl SessionContext {
    pub fn new(client: Arc<dyn ModelClient>, model: ModelDescriptor) -> Self {
        Self {
            client,
            model,
            include_failed_turns: true,
        }
    }

    pub fn with_failed_turns(mut self, include: bool) -> Self {
        self.include_failed_turns = include;
        self
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("model", &self.model)
            .field("include_failed_turns", &self.include_failed_turns)
            .finish_non_exhaustive()
    }
}
