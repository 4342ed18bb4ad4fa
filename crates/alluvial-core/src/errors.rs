//! Error surface of the alluvial engine.
//!
//! Every failure carries a stable kebab-case code plus string context, so the
//! CLI can report it as JSON and tests can match on the code alone.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`AlluvialError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Offending network ids, module paths or parameter names.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Looks up a context entry.
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }
}

/// Canonical error type for the alluvial engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum AlluvialError {
    /// Network lifecycle and input errors.
    #[error("network error: {0}")]
    Network(ErrorInfo),
    /// Invalid or stale node handles.
    #[error("tree error: {0}")]
    Tree(ErrorInfo),
    /// Invalid layout parameters.
    #[error("layout error: {0}")]
    Layout(ErrorInfo),
    /// Serialization and decoding errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl AlluvialError {
    /// Network lifecycle or leaf input failure.
    pub fn network(code: &str, message: impl Into<String>) -> Self {
        AlluvialError::Network(ErrorInfo::new(code, message))
    }

    /// Stale or mismatched node handle.
    pub fn tree(code: &str, message: impl Into<String>) -> Self {
        AlluvialError::Tree(ErrorInfo::new(code, message))
    }

    /// Rejected layout parameter.
    pub fn layout(code: &str, message: impl Into<String>) -> Self {
        AlluvialError::Layout(ErrorInfo::new(code, message))
    }

    /// Encoding or decoding failure.
    pub fn serde(code: &str, message: impl Into<String>) -> Self {
        AlluvialError::Serde(ErrorInfo::new(code, message))
    }

    /// Family tag used in the serialized form.
    pub fn family(&self) -> &'static str {
        match self {
            AlluvialError::Network(_) => "Network",
            AlluvialError::Tree(_) => "Tree",
            AlluvialError::Layout(_) => "Layout",
            AlluvialError::Serde(_) => "Serde",
        }
    }

    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            AlluvialError::Network(info)
            | AlluvialError::Tree(info)
            | AlluvialError::Layout(info)
            | AlluvialError::Serde(info) => info,
        }
    }

    /// Returns the stable error code.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Adds a context entry to the payload regardless of family.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let info = match &mut self {
            AlluvialError::Network(info)
            | AlluvialError::Tree(info)
            | AlluvialError::Layout(info)
            | AlluvialError::Serde(info) => info,
        };
        info.context.insert(key.into(), value.to_string());
        self
    }
}
