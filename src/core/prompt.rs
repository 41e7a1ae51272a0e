//! Prompt assembly.
//!
//! Models tuned for this client expect the running history verbatim followed by
//! `User: <question>\nAssistant:`. The trailing marker is consumed by the model,
//! never parsed here, so the format has to stay byte-for-byte stable.

use crate::core::conversation::ConversationLog;
use crate::core::message::Speaker;

/// Render `log` plus the new `question` into the single prompt string sent to the model.
pub fn build_prompt(log: &ConversationLog, question: &str) -> String {
    let current = format!(
        "{}: {question}\n{}:",
        Speaker::User.label(),
        Speaker::Assistant.label()
    );

    if log.is_empty() {
        return current;
    }

    let history = log.render().collect::<Vec<_>>().join("\n");
    format!("{history}\n{current}")
}
