//! Hierarchical module paths such as `1:3:2`.
//!
//! A path is a sequence of positive integers. Segments are separated by `:`; a `;`
//! in place of the separator marks the preceding segment as insignificant, so
//! `1;2:1` has three segments and the level-1 module `1` is insignificant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::errors::AlluvialError;

/// Failure to parse a textual tree path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The input held no segments.
    #[error("tree path is empty")]
    Empty,
    /// A segment was not a positive integer.
    #[error("invalid tree path segment `{segment}` in `{path}`")]
    InvalidSegment {
        /// Full input path.
        path: String,
        /// Offending segment text.
        segment: String,
    },
}

impl From<PathError> for AlluvialError {
    fn from(err: PathError) -> Self {
        AlluvialError::network("invalid-path", err.to_string())
    }
}

/// Position of a leaf or module in a partition hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TreePath {
    segments: Vec<u32>,
    insignificant: Vec<bool>,
}

impl TreePath {
    /// The empty path above every top module.
    pub fn root() -> Self {
        Self::default()
    }

    /// Builds a path where every level is significant.
    pub fn from_segments(segments: Vec<u32>) -> Self {
        let insignificant = vec![false; segments.len()];
        Self {
            segments,
            insignificant,
        }
    }

    /// Parses the textual form, accepting `:` and `;` separators.
    pub fn parse(text: &str) -> Result<Self, PathError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }
        let mut segments = Vec::new();
        let mut insignificant = Vec::new();
        let mut current = String::new();
        let mut chars = trimmed.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                ':' | ';' => {
                    segments.push(parse_segment(trimmed, &current)?);
                    insignificant.push(ch == ';');
                    current.clear();
                    if chars.peek().is_none() {
                        return Ok(Self {
                            segments,
                            insignificant,
                        });
                    }
                }
                _ => current.push(ch),
            }
        }
        segments.push(parse_segment(trimmed, &current)?);
        insignificant.push(false);
        Ok(Self {
            segments,
            insignificant,
        })
    }

    /// Returns the integer segments.
    pub fn segments(&self) -> &[u32] {
        &self.segments
    }

    /// Number of segments.
    pub fn level(&self) -> usize {
        self.segments.len()
    }

    /// Returns whether the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether the module at `level` (1-based) along this path is insignificant.
    pub fn is_insignificant_at(&self, level: usize) -> bool {
        level
            .checked_sub(1)
            .and_then(|idx| self.insignificant.get(idx).copied())
            .unwrap_or(false)
    }

    /// Truncates the path to its first `level` segments.
    pub fn ancestor_at_level(&self, level: usize) -> TreePath {
        let level = level.min(self.segments.len());
        Self {
            segments: self.segments[..level].to_vec(),
            insignificant: self.insignificant[..level].to_vec(),
        }
    }

    /// Path one level up, or `None` at the root.
    pub fn parent(&self) -> Option<TreePath> {
        if self.segments.is_empty() {
            None
        } else {
            Some(self.ancestor_at_level(self.segments.len() - 1))
        }
    }

    /// Prefix test: true when `other` lies in the subtree rooted at `self` (or equals it).
    pub fn is_ancestor_of(&self, other: &TreePath) -> bool {
        other.segments.len() >= self.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    /// Colon separated segments without significance markers, used as module key.
    pub fn path_string(&self) -> String {
        let parts: Vec<String> = self.segments.iter().map(|s| s.to_string()).collect();
        parts.join(":")
    }
}

/// Index of the first segment where two paths diverge, or the shorter length when one
/// is a prefix of the other.
pub fn difference_index(a: &[u32], b: &[u32]) -> usize {
    a.iter()
        .zip(b.iter())
        .position(|(x, y)| x != y)
        .unwrap_or_else(|| a.len().min(b.len()))
}

fn parse_segment(path: &str, segment: &str) -> Result<u32, PathError> {
    match segment.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(PathError::InvalidSegment {
            path: path.to_string(),
            segment: segment.to_string(),
        }),
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.segments.len().saturating_sub(1);
        for (idx, segment) in self.segments.iter().enumerate() {
            write!(f, "{segment}")?;
            if idx < last {
                f.write_str(if self.insignificant[idx] { ";" } else { ":" })?;
            } else if self.insignificant[idx] {
                f.write_str(";")?;
            }
        }
        Ok(())
    }
}

impl FromStr for TreePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TreePath::parse(s)
    }
}

impl Serialize for TreePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TreePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        TreePath::parse(&text).map_err(serde::de::Error::custom)
    }
}
