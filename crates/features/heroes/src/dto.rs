//! Request bodies and documented response shapes.
//!
//! Request fields are kept as raw JSON so type mismatches reach validation as
//! `400 {"errors": [..]}` instead of being rejected by the extractor.

use crate::model::{HeroPower, Strength};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Body of `PATCH /powers/{id}`. Only `description` is writable; other keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
pub struct PowerPatch {
    /// `None` when the key is absent, `Some(Value::Null)` when it is an explicit `null`.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Value>,
}

impl PowerPatch {
    #[must_use]
    pub fn description(text: impl Into<String>) -> Self {
        Self { description: Some(Value::String(text.into())) }
    }
}

/// Body of `POST /hero_powers`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
pub struct NewHeroPowerRequest {
    #[serde(default)]
    #[schema(value_type = Strength)]
    pub strength: Option<Value>,
    #[serde(default)]
    #[schema(value_type = i64)]
    pub hero_id: Option<Value>,
    #[serde(default)]
    #[schema(value_type = i64)]
    pub power_id: Option<Value>,
}

impl NewHeroPowerRequest {
    #[must_use]
    pub fn new(strength: &str, hero_id: i64, power_id: i64) -> Self {
        Self {
            strength: Some(Value::from(strength)),
            hero_id: Some(Value::from(hero_id)),
            power_id: Some(Value::from(power_id)),
        }
    }

    /// Strength as text, or `None` when missing or not a string.
    #[must_use]
    pub fn strength_str(&self) -> Option<&str> {
        self.strength.as_ref().and_then(Value::as_str)
    }

    /// Hero id, or `None` when missing or not an integer.
    #[must_use]
    pub fn hero_id(&self) -> Option<i64> {
        self.hero_id.as_ref().and_then(Value::as_i64)
    }

    /// Power id, or `None` when missing or not an integer.
    #[must_use]
    pub fn power_id(&self) -> Option<i64> {
        self.power_id.as_ref().and_then(Value::as_i64)
    }
}

/// Flat response of `POST /hero_powers`: the new row plus hero and power names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HeroPowerSummary {
    pub id: i64,
    pub hero_id: i64,
    pub power_id: i64,
    pub strength: Strength,
    /// Hero name
    pub hero: String,
    /// Power name
    pub power: String,
}

impl HeroPowerSummary {
    #[must_use]
    pub fn new(row: HeroPower, hero: String, power: String) -> Self {
        Self { id: row.id, hero_id: row.hero_id, power_id: row.power_id, strength: row.strength, hero, power }
    }
}

/// Hero as rendered by `GET /heroes/{id}`; lists omit `hero_powers`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HeroView {
    id: i64,
    name: String,
    super_name: String,
    hero_powers: Option<Vec<HeroPowerView>>,
}

/// Power as rendered by the power endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct PowerView {
    id: i64,
    name: String,
    description: String,
}

/// A hero's power entry, nested inside [`HeroView`].
#[derive(Debug, Serialize, ToSchema)]
pub struct HeroPowerView {
    id: i64,
    hero_id: i64,
    power_id: i64,
    strength: Strength,
    power: Option<PowerView>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patch_tells_absent_from_null() {
        let absent: PowerPatch = serde_json::from_value(json!({"name": "ignored"})).expect("absent");
        let null: PowerPatch = serde_json::from_value(json!({"description": null})).expect("null");

        assert_eq!(absent.description, None);
        assert_eq!(null.description, Some(Value::Null));
    }

    #[test]
    fn request_accessors_reject_wrong_types() {
        let request: NewHeroPowerRequest =
            serde_json::from_value(json!({"strength": 3, "hero_id": "1", "power_id": 2})).expect("request");

        assert_eq!(request.strength_str(), None);
        assert_eq!(request.hero_id(), None);
        assert_eq!(request.power_id(), Some(2));
    }

    #[test]
    fn summary_serializes_flat() {
        let row = HeroPower { id: 4, hero_id: 1, power_id: 2, strength: Strength::Strong };

        let value = serde_json::to_value(HeroPowerSummary::new(row, "Kamala Khan".into(), "flight".into()))
            .expect("summary");

        assert_eq!(
            value,
            json!({"id": 4, "hero_id": 1, "power_id": 2, "strength": "Strong", "hero": "Kamala Khan", "power": "flight"})
        );
    }
}
