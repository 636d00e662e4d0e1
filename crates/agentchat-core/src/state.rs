//! UI-agnostic conversation types
//!
//! These are shared by every front end and don't depend on any specific UI
//! framework.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A single entry in the conversation log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Local::now(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            text: text.into(),
            timestamp: Local::now(),
        }
    }

    pub fn is_agent(&self) -> bool {
        self.role == Role::Agent
    }
}

/// Who sent a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Agent,
}

/// Rating attached to an agent message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feedback {
    Helpful,
    NotHelpful,
}

impl Feedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::Helpful => "helpful",
            Feedback::NotHelpful => "not-helpful",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Feedback::Helpful => "Helpful",
            Feedback::NotHelpful => "Not helpful",
        }
    }
}

/// Per-message feedback sub-state, keyed by message index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackState {
    /// Write-once: never changes after it is set
    pub feedback: Option<Feedback>,
    pub submitting: bool,
    /// Transient "copied" indicator
    pub copied: bool,
}

impl FeedbackState {
    /// Both rating buttons are disabled once a rating exists or one is in flight
    pub fn locked(&self) -> bool {
        self.submitting || self.feedback.is_some()
    }
}
