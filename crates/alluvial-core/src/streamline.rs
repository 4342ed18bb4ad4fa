//! Identity encoding for streamline nodes.
//!
//! A streamline is identified by its source endpoint (network, module path, highlight
//! group and side) and, when linked, the mirrored endpoint in the neighbouring
//! network. The dangling form keeps only the source, so every dangling streamline
//! derived from the same branch collides to one identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::TreePath;
use crate::Side;

/// Separator between the source and target endpoints of a linked identity.
pub const LINK_SEPARATOR: &str = "--";

/// Encodes one endpoint of a streamline: the branch it hangs from.
pub fn endpoint_key(
    network_id: &str,
    module_path: &TreePath,
    highlight_index: i32,
    insignificant: bool,
    side: Side,
) -> String {
    let marker = if insignificant { "i" } else { "" };
    format!(
        "{network_id}_module{}_group{marker}{highlight_index}_{side}",
        module_path.path_string()
    )
}

/// Identity of a streamline node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamlineId {
    source: String,
    target: Option<String>,
}

impl StreamlineId {
    /// Builds an identity from its endpoints.
    pub fn new(source: impl Into<String>, target: Option<String>) -> Self {
        Self {
            source: source.into(),
            target,
        }
    }

    /// Builds the dangling identity for a source endpoint.
    pub fn dangling(source: impl Into<String>) -> Self {
        Self::new(source, None)
    }

    /// Source endpoint key.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Target endpoint key, if linked.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Whether the identity carries no target.
    pub fn is_dangling(&self) -> bool {
        self.target.is_none()
    }

    /// Mirrored identity as seen from the target endpoint.
    pub fn opposite(&self) -> Option<StreamlineId> {
        self.target
            .as_ref()
            .map(|target| StreamlineId::new(target.clone(), Some(self.source.clone())))
    }

    /// Drops the target, returning the previous one.
    pub fn make_dangling(&mut self) -> Option<String> {
        self.target.take()
    }

    /// Encoded identity string used as registry key.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StreamlineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{}{LINK_SEPARATOR}{}", self.source, target),
            None => f.write_str(&self.source),
        }
    }
}
