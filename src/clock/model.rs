use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::form::FormError;

pub const DEFAULT_CLOCK_NAME: &str = "untitled clock";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Count {
    Up,
    Down,
}

impl Count {
    pub fn as_token(self) -> &'static str {
        match self {
            Count::Up => "UP",
            Count::Down => "DOWN",
        }
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for Count {
    type Err = FormError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("UP") {
            Ok(Count::Up)
        } else if trimmed.eq_ignore_ascii_case("DOWN") {
            Ok(Count::Down)
        } else {
            Err(FormError::InvalidCount(input.to_string()))
        }
    }
}

/// A named interval that counts up from `start` or down to `end`.
///
/// Clocks without an `id` have never been stored by the service.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Clock {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    pub count: Count,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Clock {
    pub fn counting_up(name: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            start: Some(start),
            end: None,
            count: Count::Up,
            id: None,
        }
    }

    pub fn counting_down(name: impl Into<String>, end: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            start: None,
            end: Some(end),
            count: Count::Down,
            id: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Checks the direction invariant: up needs a start, down needs an end.
    pub fn check(&self) -> Result<(), FormError> {
        match self.count {
            Count::Up if self.start.is_none() => Err(FormError::MissingStart),
            Count::Down if self.end.is_none() => Err(FormError::MissingEnd),
            _ => Ok(()),
        }
    }

    /// Elapsed time since `start` when counting up, remaining time until
    /// `end` when counting down. Never negative.
    pub fn reading(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        let span = match self.count {
            Count::Up => now.signed_duration_since(self.start?),
            Count::Down => self.end?.signed_duration_since(now),
        };
        Some(span.max(chrono::Duration::zero()))
    }
}

pub fn format_reading(reading: chrono::Duration) -> String {
    let total_secs = reading.num_seconds().max(0);
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if days > 0 {
        format!("{days}d {hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}
