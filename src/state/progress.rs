/// Progress state definitions for tracking detail-fetch outcomes
///
/// This module defines the terminal classification a post URL can carry.
/// A URL with no recorded state has simply not been attempted yet.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal outcome of processing a single post URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressState {
    /// Post was fetched, parsed, and its record stored
    Processed,

    /// Fetch or parse failed after retries; a diagnostic snapshot exists
    Errored,

    /// Page fetched and parsed but carried no usable content
    Empty,
}

impl ProgressState {
    /// Returns true if this state represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Processed)
    }

    /// Returns true if this state represents a failure
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Errored)
    }

    /// Returns true if a URL in this state must have a stored PostRecord
    ///
    /// Errored and Empty URLs must not have one; this predicate is what the
    /// store-consistency checks are written against.
    pub fn requires_record(&self) -> bool {
        matches!(self, Self::Processed)
    }

    /// Converts the state to its storage string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Errored => "errored",
            Self::Empty => "empty",
        }
    }

    /// Parses a state from its storage string representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "processed" => Some(Self::Processed),
            "errored" => Some(Self::Errored),
            "empty" => Some(Self::Empty),
            _ => None,
        }
    }

    /// Returns all possible progress states
    pub fn all_states() -> Vec<Self> {
        vec![Self::Processed, Self::Errored, Self::Empty]
    }
}

impl fmt::Display for ProgressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
