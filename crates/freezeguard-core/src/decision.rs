//! Enforcement decisions

use freezeguard_config::Behavior;
use std::fmt;

/// Final verdict for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Warn,
    Block,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Allow => "ALLOW",
            Verdict::Warn => "WARN",
            Verdict::Block => "BLOCK",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Verdict::Allow => "✅",
            Verdict::Warn => "⚠️",
            Verdict::Block => "🚫",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationLevel {
    Notice,
    Warning,
    Error,
}

impl AnnotationLevel {
    /// Workflow command name
    pub fn command(&self) -> &'static str {
        match self {
            AnnotationLevel::Notice => "notice",
            AnnotationLevel::Warning => "warning",
            AnnotationLevel::Error => "error",
        }
    }
}

/// A message to surface in the workflow log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub level: AnnotationLevel,
    pub message: String,
}

impl Annotation {
    pub fn new(level: AnnotationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(AnnotationLevel::Warning, message)
    }
}

/// Renders as a workflow command with the message escaped
impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self
            .message
            .replace('%', "%25")
            .replace('\r', "%0D")
            .replace('\n', "%0A");
        write!(f, "::{}::{}", self.level.command(), message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    /// 1 for Block, otherwise 0
    pub exit_code: u8,
    pub annotations: Vec<Annotation>,
}

impl Decision {
    fn new(verdict: Verdict, annotations: Vec<Annotation>) -> Self {
        let exit_code = if verdict == Verdict::Block { 1 } else { 0 };
        Self {
            verdict,
            exit_code,
            annotations,
        }
    }
}

/// Combine freeze state, override state and behavior into a decision
pub fn decide(is_frozen: bool, overridden: bool, behavior: &Behavior, fail_message: &str) -> Decision {
    if !is_frozen || overridden {
        return Decision::new(Verdict::Allow, Vec::new());
    }

    match behavior {
        Behavior::Block => Decision::new(
            Verdict::Block,
            vec![Annotation::new(AnnotationLevel::Error, fail_message)],
        ),
        Behavior::Warn => Decision::new(Verdict::Warn, vec![Annotation::warning(fail_message)]),
        Behavior::Allow => Decision::new(
            Verdict::Allow,
            vec![Annotation::new(
                AnnotationLevel::Notice,
                "Freeze active but behavior is 'allow'.",
            )],
        ),
        Behavior::Unrecognized(value) => Decision::new(
            Verdict::Allow,
            vec![Annotation::warning(format!(
                "Unrecognized behavior '{value}', treating the active freeze as 'allow'."
            ))],
        ),
    }
}
