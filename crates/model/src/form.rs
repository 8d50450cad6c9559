//! The editable preference form.
//!
//! Front ends feed raw field values (strings from a text box, a select, a
//! command line) into [`PreferenceForm::update`]; the form validates them
//! and keeps the last good snapshot.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ValidationError};
use crate::types::{
    parse_ranged, Activity, Diet, Mood, PreferenceInput, HOUR_MAX, HOUR_MIN, HUNGER_MAX,
    HUNGER_MIN,
};

/// The five editable inputs of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceField {
    Hour,
    Mood,
    Hunger,
    Diet,
    Context,
}

impl PreferenceField {
    pub const ALL: [PreferenceField; 5] = [
        PreferenceField::Hour,
        PreferenceField::Mood,
        PreferenceField::Hunger,
        PreferenceField::Diet,
        PreferenceField::Context,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceField::Hour => "hour",
            PreferenceField::Mood => "mood",
            PreferenceField::Hunger => "hunger",
            PreferenceField::Diet => "diet",
            PreferenceField::Context => "context",
        }
    }
}

impl FromStr for PreferenceField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        PreferenceField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownField(s.to_string()))
    }
}

impl fmt::Display for PreferenceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form state: always a fully populated, in-domain [`PreferenceInput`].
#[derive(Debug, Clone, Default)]
pub struct PreferenceForm {
    current: PreferenceInput,
}

impl PreferenceForm {
    /// A form filled with defaults (current local hour).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(input: PreferenceInput) -> Self {
        Self { current: input }
    }

    /// Validate `value` for `field` and, if it is acceptable, apply it.
    ///
    /// Returns the updated snapshot. On error the form is left exactly as it
    /// was; nothing is clamped or coerced.
    pub fn update(&mut self, field: PreferenceField, value: &str) -> Result<PreferenceInput> {
        let mut next = self.current;
        match field {
            PreferenceField::Hour => {
                next.set_hour(parse_ranged("hour", value, HOUR_MIN, HOUR_MAX)?);
            }
            PreferenceField::Mood => next.set_mood(value.parse::<Mood>()?),
            PreferenceField::Hunger => {
                next.set_hunger(parse_ranged("hunger", value, HUNGER_MIN, HUNGER_MAX)?);
            }
            PreferenceField::Diet => next.set_diet(value.parse::<Diet>()?),
            PreferenceField::Context => next.set_context(value.parse::<Activity>()?),
        }
        self.current = next;
        Ok(next)
    }

    /// Snapshot to send to the prediction service. Performs no I/O.
    pub fn submit(&self) -> PreferenceInput {
        self.current
    }

    pub fn current(&self) -> &PreferenceInput {
        &self.current
    }
}
