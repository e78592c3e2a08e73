//! Answer values stored in a draft

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single answer
///
/// Serialized untagged so a stored draft reads as plain JSON values
/// (`"pass"`, `true`, `7`, `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Boolean answer
    Bool(bool),
    /// Numeric answer (ratings)
    Number(f64),
    /// Free text, dates and pass/fail tokens
    Text(String),
    /// Unanswered
    #[default]
    Empty,
}

impl AnswerValue {
    /// Text answer
    #[inline]
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Pass/fail answer
    #[inline]
    #[must_use]
    pub fn pass_fail(value: PassFail) -> Self {
        Self::Text(value.as_str().to_string())
    }

    /// True when the value counts as unanswered (null or empty string)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// Interpret the value as a pass/fail token
    #[must_use]
    pub fn as_pass_fail(&self) -> Option<PassFail> {
        match self {
            Self::Text(s) => PassFail::parse(s),
            _ => None,
        }
    }

    /// Numeric view of the value
    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<PassFail> for AnswerValue {
    fn from(value: PassFail) -> Self {
        Self::pass_fail(value)
    }
}

/// Allowed non-empty answers of a boolean pass/fail item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassFail {
    /// Requirement met
    Pass,
    /// Requirement not met
    Fail,
    /// Not applicable to this item
    Na,
}

impl PassFail {
    /// Wire token
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Na => "na",
        }
    }

    /// Parse a wire token
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "pass" => Some(Self::Pass),
            "fail" => Some(Self::Fail),
            "na" => Some(Self::Na),
            _ => None,
        }
    }
}

impl fmt::Display for PassFail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
