//! Error types for tree construction and traversal.
//!
//! Every failure the engine can surface is a [`TreeError`]. Errors fall into
//! three classes (see [`ErrorClass`]):
//!
//! - **Structural**: the caller misused a finished sequence or visitor
//! - **Domain**: a task raised an error on purpose (e.g. the `throw` leaf)
//! - **Config**: a node was configured badly or is missing a run-time parameter
//!
//! Only domain errors can be intercepted by a `catch` node. Everything else
//! unwinds the whole tree and reaches the caller of [`Visitor::step`](crate::Visitor::step).

use std::borrow::Cow;
use std::fmt;

/// Classification of a [`TreeError`], used for handling strategies and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// A terminated sequence or visitor was advanced again.
    Structural,

    /// A task raised an error as part of its own logic.
    Domain,

    /// A node was misconfigured. Fatal at construction or first-step time.
    Config,
}

impl ErrorClass {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Domain => "domain",
            Self::Config => "config",
        }
    }
}

/// Name of a family of raised errors.
///
/// `catch` nodes select which raised errors they handle by category.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ErrorCategory(Cow<'static, str>);

impl ErrorCategory {
    /// Catch-all category for errors that need no finer classification.
    pub const GENERIC: ErrorCategory = ErrorCategory(Cow::Borrowed("error"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ErrorCategory {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for ErrorCategory {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

/// A domain error raised by a task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raised {
    pub category: ErrorCategory,
    pub message: String,
}

impl fmt::Display for Raised {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.category)
        } else {
            write!(f, "{}: {}", self.category, self.message)
        }
    }
}

/// Errors surfaced while building or running a tree.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("raised {0}")]
    Raised(Raised),

    #[error("task `{task}` was resumed after it finished")]
    Exhausted { task: &'static str },

    #[error("visitor was stepped after the tree finished")]
    VisitorExhausted,

    #[error("invalid configuration for `{node}`: {reason}")]
    Config { node: &'static str, reason: String },

    #[error("task `{task}` requires run-time parameter `{key}`")]
    MissingParam { task: &'static str, key: String },

    #[error("task `{task}` got an invalid `{key}` parameter: {reason}")]
    InvalidParam {
        task: &'static str,
        key: String,
        reason: String,
    },
}

impl TreeError {
    /// Creates a domain error in the given category.
    pub fn raise(category: impl Into<ErrorCategory>, message: impl Into<String>) -> Self {
        TreeError::Raised(Raised {
            category: category.into(),
            message: message.into(),
        })
    }

    pub fn config(node: &'static str, reason: impl Into<String>) -> Self {
        TreeError::Config {
            node,
            reason: reason.into(),
        }
    }

    /// Returns the raised payload if this is a domain error.
    pub fn raised(&self) -> Option<&Raised> {
        match self {
            TreeError::Raised(raised) => Some(raised),
            _ => None,
        }
    }

    /// Returns the category of a domain error.
    pub fn category(&self) -> Option<&ErrorCategory> {
        self.raised().map(|raised| &raised.category)
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            TreeError::Raised(_) => ErrorClass::Domain,
            TreeError::Exhausted { .. } | TreeError::VisitorExhausted => ErrorClass::Structural,
            TreeError::Config { .. }
            | TreeError::MissingParam { .. }
            | TreeError::InvalidParam { .. } => ErrorClass::Config,
        }
    }

    pub fn is_structural(&self) -> bool {
        self.class() == ErrorClass::Structural
    }

    pub fn is_config(&self) -> bool {
        self.class() == ErrorClass::Config
    }

    /// Returns a static identifier for this error variant.
    pub const fn error_code(&self) -> &'static str {
        match self {
            TreeError::Raised(_) => "raised",
            TreeError::Exhausted { .. } => "exhausted",
            TreeError::VisitorExhausted => "visitor_exhausted",
            TreeError::Config { .. } => "config",
            TreeError::MissingParam { .. } => "missing_param",
            TreeError::InvalidParam { .. } => "invalid_param",
        }
    }
}
