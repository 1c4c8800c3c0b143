// ABOUTME: Flash messages rendered at the top of the page a handler returns
// ABOUTME: Collects success, error, and info notices produced while processing a request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Flash messages.
//!
//! Handlers re-render a page in the same response instead of redirecting, so a
//! flash lives only as long as the request that created it.

use serde::Serialize;
use std::fmt;

/// Severity of a flash message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    /// Operation succeeded
    Success,
    /// Operation failed
    Error,
    /// Neutral notice
    Info,
}

impl FlashLevel {
    /// CSS class of the message box
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "flash flash-success",
            Self::Error => "flash flash-error",
            Self::Info => "flash flash-info",
        }
    }
}

impl fmt::Display for FlashLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single flash message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashMessage {
    /// Text shown to the user
    pub message: String,
    /// Severity
    pub level: FlashLevel,
}

/// Messages collected while handling a request, in order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Flashes(Vec<FlashMessage>);

impl Flashes {
    /// No messages
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a message
    pub fn push(&mut self, message: impl Into<String>, level: FlashLevel) {
        self.0.push(FlashMessage {
            message: message.into(),
            level,
        });
    }

    /// Add a success message
    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message, FlashLevel::Success);
    }

    /// Add an error message
    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message, FlashLevel::Error);
    }

    /// Add an informational message
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(message, FlashLevel::Info);
    }

    /// Whether there is nothing to show
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &FlashMessage> {
        self.0.iter()
    }
}
