//! Core domain types shared by the form, the collaborators and the session.
//!
//! Enumerated preferences serialize with the same lowercase spelling the
//! prediction service expects (`non-veg`, `studying`, ...), and parse back
//! from it, so a raw form value and a wire value are the same string.

use std::fmt;
use std::str::FromStr;

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a snack in the service's catalog
pub type SnackId = u32;

/// Ordered recommendations in rank order, as returned by the service
pub type RecommendationList = Vec<Recommendation>;

// =============================================================================
// Field domains
// =============================================================================

pub const HOUR_MIN: u8 = 0;
pub const HOUR_MAX: u8 = 23;
pub const HUNGER_MIN: u8 = 1;
pub const HUNGER_MAX: u8 = 5;

/// Parse `raw` as one of `all`, comparing against each option's wire name.
fn parse_choice<T: Copy>(
    field: &'static str,
    raw: &str,
    all: &[T],
    name: fn(T) -> &'static str,
) -> Result<T> {
    let wanted = raw.trim();
    all.iter()
        .copied()
        .find(|option| name(*option).eq_ignore_ascii_case(wanted))
        .ok_or_else(|| ValidationError::UnknownVariant {
            field,
            value: raw.to_string(),
            expected: all.iter().map(|o| name(*o)).collect::<Vec<_>>().join(", "),
        })
}

/// Parse `raw` as an integer inside `min..=max`.
pub(crate) fn parse_ranged(field: &'static str, raw: &str, min: u8, max: u8) -> Result<u8> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::NotANumber {
            field,
            value: raw.to_string(),
        })?;
    check_range(field, value, min, max)
}

fn check_range(field: &'static str, value: i64, min: u8, max: u8) -> Result<u8> {
    if value < i64::from(min) || value > i64::from(max) {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    // In range of a u8 by the check above
    Ok(value as u8)
}

/// How the user is feeling right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Bored,
    Stressed,
    Energetic,
    Lazy,
}

impl Mood {
    pub const ALL: [Mood; 6] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Bored,
        Mood::Stressed,
        Mood::Energetic,
        Mood::Lazy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Bored => "bored",
            Mood::Stressed => "stressed",
            Mood::Energetic => "energetic",
            Mood::Lazy => "lazy",
        }
    }
}

/// Dietary restriction applied by the service when filtering snacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diet {
    #[serde(rename = "veg")]
    Veg,
    #[serde(rename = "non-veg")]
    NonVeg,
}

impl Diet {
    pub const ALL: [Diet; 2] = [Diet::Veg, Diet::NonVeg];

    pub fn as_str(self) -> &'static str {
        match self {
            Diet::Veg => "veg",
            Diet::NonVeg => "non-veg",
        }
    }
}

/// What the user is doing while snacking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    None,
    Studying,
    Gaming,
    Chilling,
    Gym,
}

impl Activity {
    pub const ALL: [Activity; 5] = [
        Activity::None,
        Activity::Studying,
        Activity::Gaming,
        Activity::Chilling,
        Activity::Gym,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Activity::None => "none",
            Activity::Studying => "studying",
            Activity::Gaming => "gaming",
            Activity::Chilling => "chilling",
            Activity::Gym => "gym",
        }
    }
}

impl FromStr for Mood {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        parse_choice("mood", s, &Mood::ALL, Mood::as_str)
    }
}

impl FromStr for Diet {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        parse_choice("diet", s, &Diet::ALL, Diet::as_str)
    }
}

impl FromStr for Activity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        parse_choice("context", s, &Activity::ALL, Activity::as_str)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Diet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse time bucket the service derives from the hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u8) -> Self {
        match hour {
            7..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// PreferenceInput
// =============================================================================

/// A complete, validated set of user preferences.
///
/// Fields are private: the only ways to obtain a value are the validating
/// constructor, `Default`, and [`crate::PreferenceForm`], so every
/// `PreferenceInput` in existence is within its field domains. It is `Copy`,
/// which makes the snapshot taken at submit time independent of later edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PreferenceInput {
    hour: u8,
    mood: Mood,
    hunger: u8,
    diet: Diet,
    context: Activity,
}

impl PreferenceInput {
    pub fn new(hour: u8, mood: Mood, hunger: u8, diet: Diet, context: Activity) -> Result<Self> {
        Ok(Self {
            hour: check_range("hour", i64::from(hour), HOUR_MIN, HOUR_MAX)?,
            mood,
            hunger: check_range("hunger", i64::from(hunger), HUNGER_MIN, HUNGER_MAX)?,
            diet,
            context,
        })
    }

    /// Defaults for every field except the hour.
    pub fn at_hour(hour: u8) -> Result<Self> {
        Self::new(hour, Mood::Happy, 3, Diet::Veg, Activity::None)
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn hunger(&self) -> u8 {
        self.hunger
    }

    pub fn diet(&self) -> Diet {
        self.diet
    }

    pub fn context(&self) -> Activity {
        self.context
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from_hour(self.hour)
    }

    pub(crate) fn set_hour(&mut self, hour: u8) {
        self.hour = hour;
    }

    pub(crate) fn set_mood(&mut self, mood: Mood) {
        self.mood = mood;
    }

    pub(crate) fn set_hunger(&mut self, hunger: u8) {
        self.hunger = hunger;
    }

    pub(crate) fn set_diet(&mut self, diet: Diet) {
        self.diet = diet;
    }

    pub(crate) fn set_context(&mut self, context: Activity) {
        self.context = context;
    }
}

impl Default for PreferenceInput {
    /// Current local hour, happy, hunger 3, veg, no particular context.
    fn default() -> Self {
        let hour = chrono::Local::now().hour().min(u32::from(HOUR_MAX)) as u8;
        Self {
            hour,
            mood: Mood::Happy,
            hunger: 3,
            diet: Diet::Veg,
            context: Activity::None,
        }
    }
}

impl fmt::Display for PreferenceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hour={} mood={} hunger={} diet={} context={}",
            self.hour, self.mood, self.hunger, self.diet, self.context
        )
    }
}

// =============================================================================
// Recommendation
// =============================================================================

/// One ranked suggestion from the prediction service.
///
/// Acceptance is not stored here; the session tracks it by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: SnackId,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub explanation: String,
    /// Model confidence, nominally in [0, 1]
    pub prob: f32,
}

impl Recommendation {
    /// Confidence as a whole-number percentage for "% Match" labels.
    pub fn match_percent(&self) -> f32 {
        (self.prob * 100.0).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_names_round_trip_through_from_str() {
        for mood in Mood::ALL {
            assert_eq!(mood.as_str().parse::<Mood>().unwrap(), mood);
        }
        assert_eq!("non-veg".parse::<Diet>().unwrap(), Diet::NonVeg);
        assert_eq!(" Studying ".parse::<Activity>().unwrap(), Activity::Studying);
    }

    #[test]
    fn test_unknown_variant_names_field() {
        let err = "hangry".parse::<Mood>().unwrap_err();
        assert_eq!(err.field(), "mood");
        assert!(err.to_string().contains("happy, sad, bored"));

        let err = "vegan".parse::<Diet>().unwrap_err();
        assert_eq!(err.field(), "diet");

        let err = "work".parse::<Activity>().unwrap_err();
        assert_eq!(err.field(), "context");
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        let err = PreferenceInput::new(24, Mood::Sad, 3, Diet::Veg, Activity::Gym).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                field: "hour",
                value: 24,
                min: 0,
                max: 23
            }
        );

        let err = PreferenceInput::new(10, Mood::Sad, 0, Diet::Veg, Activity::Gym).unwrap_err();
        assert_eq!(err.field(), "hunger");
        assert!(PreferenceInput::new(10, Mood::Sad, 6, Diet::Veg, Activity::Gym).is_err());
    }

    #[test]
    fn test_default_is_in_domain() {
        let input = PreferenceInput::default();
        assert!(input.hour() <= HOUR_MAX);
        assert_eq!(input.mood(), Mood::Happy);
        assert_eq!(input.hunger(), 3);
        assert_eq!(input.diet(), Diet::Veg);
        assert_eq!(input.context(), Activity::None);
    }

    #[test]
    fn test_serializes_in_wire_shape() {
        let input =
            PreferenceInput::new(14, Mood::Bored, 4, Diet::NonVeg, Activity::Studying).unwrap();
        let json = serde_json::to_value(input).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "hour": 14,
                "mood": "bored",
                "hunger": 4,
                "diet": "non-veg",
                "context": "studying"
            })
        );
    }

    #[test]
    fn test_time_of_day_buckets() {
        assert_eq!(TimeOfDay::from_hour(7), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(20), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(21), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(3), TimeOfDay::Night);

        let input = PreferenceInput::at_hour(14).unwrap();
        assert_eq!(input.time_of_day().to_string(), "afternoon");
    }

    #[test]
    fn test_recommendation_decodes_service_record() {
        let rec: Recommendation = serde_json::from_value(serde_json::json!({
            "id": 7,
            "name": "Greek Yogurt",
            "prob": 0.42,
            "tags": ["healthy", "sweet"],
            "message": "It's around 14:00...",
            "explanation": "Creamy and protein-packed."
        }))
        .unwrap();
        assert_eq!(rec.id, 7);
        assert_eq!(rec.tags, vec!["healthy", "sweet"]);
        assert!((rec.match_percent() - 42.0).abs() < 1e-3);
    }

    #[test]
    fn test_match_percent_is_clamped() {
        let rec = Recommendation {
            id: 1,
            name: "Boosted".into(),
            tags: vec![],
            message: String::new(),
            explanation: String::new(),
            prob: 1.05,
        };
        assert_eq!(rec.match_percent(), 100.0);
    }
}
