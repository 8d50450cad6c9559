//! # Model Crate
//!
//! Domain types for the VibeSnack client: the preference form the user
//! edits, the validated snapshot sent to the prediction service, and the
//! recommendation records it returns.
//!
//! ## Example Usage
//!
//! ```ignore
//! use model::{PreferenceField, PreferenceForm};
//!
//! let mut form = PreferenceForm::new();
//! form.update(PreferenceField::Mood, "bored")?;
//! form.update(PreferenceField::Hunger, "4")?;
//!
//! // Rejected, names the field, leaves the form unchanged
//! assert!(form.update(PreferenceField::Hour, "25").is_err());
//!
//! let input = form.submit();
//! ```

pub mod error;
pub mod form;
pub mod types;

pub use error::{Result, ValidationError};
pub use form::{PreferenceField, PreferenceForm};
pub use types::{
    // Type aliases
    RecommendationList,
    SnackId,
    // Core types
    PreferenceInput,
    Recommendation,
    // Enums
    Activity,
    Diet,
    Mood,
    TimeOfDay,
    // Domains
    HOUR_MAX,
    HOUR_MIN,
    HUNGER_MAX,
    HUNGER_MIN,
};
