//! Records stored in the `heroes`, `powers` and `hero_powers` tables.
//!
//! Heroes and powers own their associations as lists of `HeroPower` ids; a `HeroPower`
//! only names its hero and power by id. Nothing here points back at its owner.

use crate::validation::{InvalidField, validate_description, validate_name};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// How strongly a hero wields a power. Rendered and parsed by exact variant name.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
    ToSchema,
)]
pub enum Strength {
    Strong,
    Weak,
    Average,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hero {
    pub id: i64,
    pub name: String,
    pub super_name: String,
    /// Ids of the loaded `HeroPower` rows of this hero.
    pub hero_powers: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Power {
    pub id: i64,
    pub name: String,
    description: String,
    /// Ids of the loaded `HeroPower` rows of this power.
    pub hero_powers: Vec<i64>,
}

impl Power {
    /// Builds a power from a stored row. The description is trusted as persisted.
    pub(crate) fn from_row(id: i64, name: String, description: String) -> Self {
        Self { id, name, description, hero_powers: Vec::new() }
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Replaces the description after validating it; a rejected value changes nothing.
    pub fn set_description(&mut self, value: Option<&str>) -> Result<(), InvalidField> {
        self.description = validate_description(value)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeroPower {
    pub id: i64,
    pub hero_id: i64,
    pub power_id: i64,
    pub strength: Strength,
}

/// A hero that passed validation and is ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHero {
    name: String,
    super_name: String,
}

impl NewHero {
    pub fn new(name: &str, super_name: &str) -> Result<Self, InvalidField> {
        Ok(Self {
            name: validate_name("name", Some(name))?,
            super_name: validate_name("super_name", Some(super_name))?,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn super_name(&self) -> &str {
        &self.super_name
    }
}

/// A power that passed validation and is ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPower {
    name: String,
    description: String,
}

impl NewPower {
    pub fn new(name: &str, description: &str) -> Result<Self, InvalidField> {
        Ok(Self {
            name: validate_name("name", Some(name))?,
            description: validate_description(Some(description))?,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// An association between existing ids. The typed [`Strength`] is the validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewHeroPower {
    pub hero_id: i64,
    pub power_id: i64,
    pub strength: Strength,
}

impl NewHeroPower {
    #[must_use]
    pub const fn new(hero_id: i64, power_id: i64, strength: Strength) -> Self {
        Self { hero_id, power_id, strength }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn strength_round_trips_through_its_name() {
        for strength in [Strength::Strong, Strength::Weak, Strength::Average] {
            assert_eq!(Strength::from_str(strength.as_ref()).ok(), Some(strength));
        }
        assert_eq!(Strength::Average.to_string(), "Average");
    }

    #[test]
    fn rejected_description_leaves_power_untouched() {
        let mut power = Power::from_row(1, "flight".into(), "lets the wielder fly very fast".into());

        let err = power.set_description(Some("short")).unwrap_err();

        assert_eq!(err.field, "description");
        assert_eq!(power.description(), "lets the wielder fly very fast");
    }

    #[test]
    fn accepted_description_replaces_the_old_one() {
        let mut power = Power::from_row(1, "flight".into(), "lets the wielder fly very fast".into());

        power.set_description(Some("this is a sufficiently long description")).expect("valid");

        assert_eq!(power.description(), "this is a sufficiently long description");
    }

    #[test]
    fn drafts_validate_every_field() {
        assert!(NewHero::new("Kamala Khan", "Ms. Marvel").is_ok());
        assert_eq!(NewHero::new("Kamala Khan", "").unwrap_err().field, "super_name");
        assert_eq!(NewPower::new("", "a description that is long enough").unwrap_err().field, "name");
        assert_eq!(NewPower::new("flight", "too short").unwrap_err().field, "description");
    }
}
