use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use thiserror::Error;

use crate::clock::model::{Clock, Count, DEFAULT_CLOCK_NAME};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";
const MIDNIGHT: &str = "00:00";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Boundary {
    Start,
    End,
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boundary::Start => f.write_str("start"),
            Boundary::End => f.write_str("end"),
        }
    }
}

/// Input problems the editor shows inline in place of the preview.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FormError {
    #[error("If clock counts up, a start date is needed.")]
    MissingStart,
    #[error("If clock counts down, an end date is needed.")]
    MissingEnd,
    #[error("The {boundary} date '{input}' is not a valid date (expected YYYY-MM-DD).")]
    InvalidDate { boundary: Boundary, input: String },
    #[error("The {boundary} time '{input}' is not a valid time (expected HH:MM).")]
    InvalidTime { boundary: Boundary, input: String },
    #[error("The {boundary} time {local} does not exist in the local timezone.")]
    NonexistentLocalTime {
        boundary: Boundary,
        local: NaiveDateTime,
    },
    #[error("'{0}' is not a count direction (expected UP or DOWN).")]
    InvalidCount(String),
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("unknown form field '{0}'")]
pub struct UnknownFieldError(pub String);

/// Names of the editor inputs.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FormField {
    Name,
    StartDate,
    StartTime,
    EndDate,
    EndTime,
    Count,
}

impl FromStr for FormField {
    type Err = UnknownFieldError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "name" => Ok(FormField::Name),
            "startdate" => Ok(FormField::StartDate),
            "starttime" => Ok(FormField::StartTime),
            "enddate" => Ok(FormField::EndDate),
            "endtime" => Ok(FormField::EndTime),
            "count" => Ok(FormField::Count),
            other => Err(UnknownFieldError(other.to_string())),
        }
    }
}

/// Raw editor input. Mirrors whatever was typed last, valid or not.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Form {
    pub name: String,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    /// Direction as typed; parsed into a `Count` on every validation.
    pub count: String,
}

impl Default for Form {
    fn default() -> Self {
        Self {
            name: String::new(),
            start_date: String::new(),
            start_time: String::new(),
            end_date: String::new(),
            end_time: String::new(),
            count: Count::Down.as_token().to_string(),
        }
    }
}

impl Form {
    /// Copy of this form with a single field replaced.
    pub fn with_field(&self, field: FormField, value: &str) -> Form {
        let mut form = self.clone();
        match field {
            FormField::Name => form.name = value.to_string(),
            FormField::StartDate => form.start_date = value.to_string(),
            FormField::StartTime => form.start_time = value.to_string(),
            FormField::EndDate => form.end_date = value.to_string(),
            FormField::EndTime => form.end_time = value.to_string(),
            FormField::Count => form.count = value.to_string(),
        }
        form
    }
}

pub fn decompose_to_form<Tz: TimeZone>(clock: &Clock, timezone: &Tz) -> Form {
    let (start_date, start_time) = clock
        .start
        .map(|instant| split_instant(&instant, timezone))
        .unwrap_or_default();
    let (end_date, end_time) = clock
        .end
        .map(|instant| split_instant(&instant, timezone))
        .unwrap_or_default();
    Form {
        name: clock.name.clone(),
        start_date,
        start_time,
        end_date,
        end_time,
        count: clock.count.as_token().to_string(),
    }
}

fn split_instant<Tz: TimeZone>(instant: &DateTime<Utc>, timezone: &Tz) -> (String, String) {
    let local = instant.with_timezone(timezone).naive_local();
    (
        local.format(DATE_FORMAT).to_string(),
        local.format(TIME_FORMAT).to_string(),
    )
}

/// Resolves a date and time typed in `timezone` to an instant.
///
/// A blank date means the boundary is absent, whatever the time says. A
/// blank time means midnight. Ambiguous local times resolve to the earlier
/// instant.
pub fn parse_date_time<Tz: TimeZone>(
    boundary: Boundary,
    date: &str,
    time: &str,
    timezone: &Tz,
) -> Result<Option<DateTime<Utc>>, FormError> {
    let date = date.trim();
    if date.is_empty() {
        return Ok(None);
    }
    let day = NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| FormError::InvalidDate {
        boundary,
        input: date.to_string(),
    })?;

    let time = match time.trim() {
        "" => MIDNIGHT,
        trimmed => trimmed,
    };
    let time_of_day = NaiveTime::parse_from_str(time, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|_| FormError::InvalidTime {
            boundary,
            input: time.to_string(),
        })?;

    let local = NaiveDateTime::new(day, time_of_day);
    match timezone.from_local_datetime(&local) {
        LocalResult::Single(resolved) => Ok(Some(resolved.with_timezone(&Utc))),
        LocalResult::Ambiguous(first, _second) => Ok(Some(first.with_timezone(&Utc))),
        LocalResult::None => Err(FormError::NonexistentLocalTime { boundary, local }),
    }
}

pub fn compose_from_form<Tz: TimeZone>(form: &Form, timezone: &Tz) -> Result<Clock, FormError> {
    let count: Count = form.count.parse()?;
    let start = parse_date_time(Boundary::Start, &form.start_date, &form.start_time, timezone);
    let end = parse_date_time(Boundary::End, &form.end_date, &form.end_time, timezone);

    // Only the boundary of the active direction is required. The other one
    // is kept when it parses and dropped when it does not.
    let (start, end) = match count {
        Count::Up => {
            let start = start?.ok_or(FormError::MissingStart)?;
            (Some(start), end.ok().flatten())
        }
        Count::Down => {
            let end = end?.ok_or(FormError::MissingEnd)?;
            (start.ok().flatten(), Some(end))
        }
    };

    let name = if form.name.trim().is_empty() {
        DEFAULT_CLOCK_NAME.to_string()
    } else {
        form.name.clone()
    };

    Ok(Clock {
        name,
        start,
        end,
        count,
        id: None,
    })
}
