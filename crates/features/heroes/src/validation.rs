//! Field-level checks run before anything is written.

use crate::model::Strength;
use std::borrow::Cow;
use std::str::FromStr;

/// Minimum number of characters in a power description.
pub const MIN_DESCRIPTION_CHARS: usize = 20;

/// A single field that failed its constraint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {message}")]
pub struct InvalidField {
    pub field: &'static str,
    pub message: Cow<'static, str>,
}

impl InvalidField {
    pub fn new(field: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self { field, message: message.into() }
    }
}

/// Accepts any non-empty value. `field` names the column in the error.
pub fn validate_name(field: &'static str, value: Option<&str>) -> Result<String, InvalidField> {
    match value {
        Some(name) if !name.is_empty() => Ok(name.to_owned()),
        _ => Err(InvalidField::new(field, format!("{field} is required"))),
    }
}

/// Accepts strings of at least [`MIN_DESCRIPTION_CHARS`] characters (not bytes).
pub fn validate_description(value: Option<&str>) -> Result<String, InvalidField> {
    match value {
        Some(text) if text.chars().count() >= MIN_DESCRIPTION_CHARS => Ok(text.to_owned()),
        Some(_) => Err(InvalidField::new(
            "description",
            format!("description must be at least {MIN_DESCRIPTION_CHARS} characters long"),
        )),
        None => Err(InvalidField::new("description", "description must be a string")),
    }
}

/// Accepts exactly `Strong`, `Weak` or `Average`.
pub fn validate_strength(value: Option<&str>) -> Result<Strength, InvalidField> {
    value.and_then(|raw| Strength::from_str(raw).ok()).ok_or_else(|| {
        InvalidField::new("strength", "strength must be one of: Strong, Weak, Average")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn names_must_be_present_and_non_empty() {
        assert_eq!(validate_name("name", Some("Kamala Khan")), Ok("Kamala Khan".to_owned()));
        assert_eq!(validate_name("super_name", Some("")).unwrap_err().field, "super_name");
        assert!(validate_name("name", None).is_err());
    }

    #[test]
    fn description_boundary_is_twenty_characters() {
        assert!(validate_description(Some("exactly twenty chars")).is_ok());
        assert!(validate_description(Some("nineteen characters")).is_err());
        assert!(validate_description(None).is_err());
    }

    #[test]
    fn description_counts_characters_not_bytes() {
        // 10 two-byte characters: 20 bytes but only 10 characters.
        assert!(validate_description(Some(&"é".repeat(10))).is_err());
        assert!(validate_description(Some(&"é".repeat(20))).is_ok());
    }

    #[test]
    fn strength_is_case_sensitive() {
        assert_eq!(validate_strength(Some("Strong")), Ok(Strength::Strong));
        assert_eq!(validate_strength(Some("Average")), Ok(Strength::Average));
        assert!(validate_strength(Some("strong")).is_err());
        assert!(validate_strength(Some("Mighty")).is_err());
        assert!(validate_strength(None).is_err());
    }

    proptest! {
        #[test]
        fn description_accepts_iff_long_enough(text in "\\PC{0,40}") {
            let accepted = validate_description(Some(&text)).is_ok();
            prop_assert_eq!(accepted, text.chars().count() >= MIN_DESCRIPTION_CHARS);
        }

        #[test]
        fn strength_rejects_everything_but_the_three_variants(raw in "[A-Za-z]{0,10}") {
            let expected = matches!(raw.as_str(), "Strong" | "Weak" | "Average");
            prop_assert_eq!(validate_strength(Some(&raw)).is_ok(), expected);
        }
    }
}
