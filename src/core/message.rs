use std::fmt;

/// Wire role of the single message carrying the assembled prompt.
pub const ROLE_USER: &str = "user";

/// Who produced a [`Turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Label used when rendering history into a prompt (`User: ...`).
    pub fn label(self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Assistant => "Assistant",
        }
    }

    pub fn is_user(self) -> bool {
        self == Speaker::User
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One side of an exchange. Turns are never edited after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: Speaker,
    text: String,
    failed: bool,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Speaker::User,
            text: text.into(),
            failed: false,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Speaker::Assistant,
            text: text.into(),
            failed: false,
        }
    }

    /// An assistant turn holding the diagnostic shown after a failed invocation.
    pub fn assistant_failed(diagnostic: impl Into<String>) -> Self {
        Self {
            role: Speaker::Assistant,
            text: diagnostic.into(),
            failed: true,
        }
    }

    pub fn role(&self) -> Speaker {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// `"<Role>: <text>"`, the line form used in prompts and transcripts.
    pub fn render(&self) -> String {
        format!("{}: {}", self.role.label(), self.text)
    }
}
