//! Bundler diagnostics.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A single diagnostic reported by a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    /// File the diagnostic belongs to, when known.
    pub path: Option<PathBuf>,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            path: None,
        }
    }

    pub fn at(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            path: Some(path.into()),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path.display(), self.text),
            None => f.write_str(&self.text),
        }
    }
}

/// A build that produced at least one error. Every error the bundler
/// reported is kept, not just the first.
#[derive(Debug, Error)]
#[error("build failed with {} error(s):\n{}", .errors.len(), render(.errors))]
pub struct BuildFailure {
    pub errors: Vec<Message>,
}

impl BuildFailure {
    pub fn single(message: Message) -> Self {
        Self {
            errors: vec![message],
        }
    }

    pub(crate) fn from_diagnostics<D: fmt::Display>(diagnostics: impl IntoIterator<Item = D>) -> Self {
        Self {
            errors: diagnostics
                .into_iter()
                .map(|d| Message::new(d.to_string()))
                .collect(),
        }
    }
}

fn render(errors: &[Message]) -> String {
    errors
        .iter()
        .map(|m| format!("  {m}"))
        .collect::<Vec<_>>()
        .join("\n")
}
