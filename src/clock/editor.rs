use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

use crate::clock::form::{Form, FormField, compose_from_form, decompose_to_form};
use crate::clock::model::Clock;

const NEW_CLOCK_NAME: &str = "New Clock";

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum SubmitError {
    #[error("{0}")]
    Invalid(String),
    #[error("clock '{0}' already exists; updating stored clocks is not supported")]
    AlreadyStored(String),
}

/// What the editor shows below the inputs.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Preview<'a> {
    Clock(&'a Clock),
    Error(&'a str),
}

/// Keeps the form, the clock it last described, and the current inline
/// error in step. Every input change revalidates synchronously.
#[derive(Debug, Clone)]
pub struct ClockEditor<Tz: TimeZone> {
    timezone: Tz,
    clock: Clock,
    form: Form,
    error: Option<String>,
}

impl<Tz: TimeZone> ClockEditor<Tz> {
    /// Opens the editor on `existing`, or on a fresh clock counting up from
    /// `now` with an empty form.
    pub fn new(timezone: Tz, existing: Option<Clock>, now: DateTime<Utc>) -> Self {
        let (clock, form) = match existing {
            Some(clock) => {
                let form = decompose_to_form(&clock, &timezone);
                (clock, form)
            }
            None => (Clock::counting_up(NEW_CLOCK_NAME, now), Form::default()),
        };
        let mut editor = Self {
            timezone,
            clock,
            form: form.clone(),
            error: None,
        };
        editor.validate(form);
        editor
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn preview(&self) -> Preview<'_> {
        match &self.error {
            Some(message) => Preview::Error(message),
            None => Preview::Clock(&self.clock),
        }
    }

    /// Adopts `form`. A form that describes no valid clock leaves the
    /// previous clock in place and records the message instead.
    pub fn validate(&mut self, form: Form) {
        match compose_from_form(&form, &self.timezone) {
            Ok(mut clock) => {
                clock.id = self.clock.id.take();
                self.clock = clock;
                self.error = None;
            }
            Err(err) => self.error = Some(err.to_string()),
        }
        self.form = form;
    }

    pub fn set_field(&mut self, field: FormField, value: &str) {
        let form = self.form.with_field(field, value);
        self.validate(form);
    }

    /// The clock to send on submit. Only new clocks can be submitted.
    pub fn submission(&self) -> Result<&Clock, SubmitError> {
        if let Some(message) = &self.error {
            return Err(SubmitError::Invalid(message.clone()));
        }
        match &self.clock.id {
            Some(id) => Err(SubmitError::AlreadyStored(id.clone())),
            None => Ok(&self.clock),
        }
    }
}
