//! Renders an [`EntityGraph`] into JSON trees, pruning relations by [`Rules`].

use crate::graph::{Cardinality, EntityGraph, EntityRef, expansions};
use crate::rules::Rules;
use serde_json::{Map, Value, json};

/// Default bound on relation nesting.
pub const DEFAULT_MAX_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Serializer {
    max_depth: usize,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl Serializer {
    #[must_use]
    pub const fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Serializes `root` with `rules` on top of the per-kind defaults.
    ///
    /// Returns `None` when `root` is not in the graph.
    #[must_use]
    pub fn serialize(&self, graph: &EntityGraph, root: EntityRef, rules: &Rules) -> Option<Value> {
        self.render(graph, root, rules, 0).map(Value::Object)
    }

    /// Serializes each root in order, skipping the ones missing from the graph.
    #[must_use]
    pub fn serialize_many(&self, graph: &EntityGraph, roots: &[EntityRef], rules: &Rules) -> Value {
        Value::Array(roots.iter().filter_map(|root| self.serialize(graph, *root, rules)).collect())
    }

    fn render(
        &self,
        graph: &EntityGraph,
        entity: EntityRef,
        rules: &Rules,
        depth: usize,
    ) -> Option<Map<String, Value>> {
        let kind = entity.kind();
        let effective = kind.effective_rules(rules);
        let mut object = scalars(graph, entity)?;
        object.retain(|field, _| kind.fields().contains(&field.as_str()) && !effective.excludes(field));

        for expansion in expansions(kind, &effective, depth, self.max_depth) {
            let targets = graph.related(entity, &expansion.relation);
            let value = match expansion.relation.cardinality {
                Cardinality::Many => Value::Array(
                    targets
                        .into_iter()
                        .filter_map(|target| self.render(graph, target, &expansion.rules, depth + 1))
                        .map(Value::Object)
                        .collect(),
                ),
                Cardinality::One => targets
                    .first()
                    .and_then(|target| self.render(graph, *target, &expansion.rules, depth + 1))
                    .map_or(Value::Null, Value::Object),
            };
            object.insert(expansion.relation.name.to_owned(), value);
        }

        Some(object)
    }
}

fn scalars(graph: &EntityGraph, entity: EntityRef) -> Option<Map<String, Value>> {
    let value = match entity {
        EntityRef::Hero(id) => {
            let hero = graph.hero(id)?;
            json!({ "id": hero.id, "name": hero.name, "super_name": hero.super_name })
        },
        EntityRef::Power(id) => {
            let power = graph.power(id)?;
            json!({ "id": power.id, "name": power.name, "description": power.description() })
        },
        EntityRef::HeroPower(id) => {
            let hp = graph.hero_power(id)?;
            json!({
                "id": hp.id,
                "hero_id": hp.hero_id,
                "power_id": hp.power_id,
                "strength": hp.strength.as_ref(),
            })
        },
    };
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Hero, HeroPower, Power, Strength};
    use proptest::prelude::*;

    /// Two heroes sharing powers, wired both ways.
    fn sample() -> EntityGraph {
        let mut graph = EntityGraph::new();
        graph.insert_hero(Hero {
            id: 1,
            name: "Kamala Khan".into(),
            super_name: "Ms. Marvel".into(),
            hero_powers: vec![10, 11],
        });
        graph.insert_hero(Hero {
            id: 2,
            name: "Doreen Green".into(),
            super_name: "Squirrel Girl".into(),
            hero_powers: vec![12],
        });
        let mut strength = Power::from_row(1, "super strength".into(), "gives the wielder super-human strengths".into());
        strength.hero_powers = vec![10, 12];
        let mut flight = Power::from_row(2, "flight".into(), "gives the wielder the ability to fly".into());
        flight.hero_powers = vec![11];
        graph.insert_power(strength);
        graph.insert_power(flight);
        graph.insert_hero_power(HeroPower { id: 10, hero_id: 1, power_id: 1, strength: Strength::Strong });
        graph.insert_hero_power(HeroPower { id: 11, hero_id: 1, power_id: 2, strength: Strength::Average });
        graph.insert_hero_power(HeroPower { id: 12, hero_id: 2, power_id: 1, strength: Strength::Weak });
        graph
    }

    #[test]
    fn hero_detail_nests_powers_without_back_references() {
        let value = Serializer::default()
            .serialize(&sample(), EntityRef::Hero(1), &Rules::parse(["-power.hero", "-hero_powers.hero"]))
            .expect("hero 1");

        assert_eq!(
            value,
            json!({
                "id": 1,
                "name": "Kamala Khan",
                "super_name": "Ms. Marvel",
                "hero_powers": [
                    {
                        "id": 10, "hero_id": 1, "power_id": 1, "strength": "Strong",
                        "power": { "id": 1, "name": "super strength",
                                   "description": "gives the wielder super-human strengths" }
                    },
                    {
                        "id": 11, "hero_id": 1, "power_id": 2, "strength": "Average",
                        "power": { "id": 2, "name": "flight",
                                   "description": "gives the wielder the ability to fly" }
                    }
                ]
            })
        );
    }

    #[test]
    fn list_rules_drop_the_whole_collection() {
        let graph = sample();

        let value = Serializer::default().serialize_many(
            &graph,
            &[EntityRef::Power(1), EntityRef::Power(2), EntityRef::Power(99)],
            &Rules::parse(["-hero_powers"]),
        );

        let powers = value.as_array().expect("array");
        assert_eq!(powers.len(), 2);
        assert!(powers.iter().all(|power| power.get("hero_powers").is_none()));
    }

    #[test]
    fn scalar_fields_can_be_excluded() {
        let value = Serializer::default()
            .serialize(&sample(), EntityRef::Hero(2), &Rules::parse(["-super_name", "-hero_powers"]))
            .expect("hero 2");

        assert_eq!(value, json!({ "id": 2, "name": "Doreen Green" }));
    }

    #[test]
    fn join_row_renders_both_ends_and_null_for_missing_targets() {
        let mut graph = sample();
        graph.insert_hero_power(HeroPower { id: 13, hero_id: 2, power_id: 77, strength: Strength::Weak });

        let value = Serializer::default().serialize(&graph, EntityRef::HeroPower(13), &Rules::new()).expect("join");

        assert_eq!(value["hero"]["super_name"], "Squirrel Girl");
        assert!(value["hero"].get("hero_powers").is_none());
        assert_eq!(value["power"], Value::Null);
    }

    #[test]
    fn depth_limit_stops_expansion() {
        let value =
            Serializer::new(1).serialize(&sample(), EntityRef::Hero(1), &Rules::new()).expect("hero 1");

        let first = &value["hero_powers"][0];
        assert_eq!(first["strength"], "Strong");
        assert!(first.get("power").is_none());
    }

    #[test]
    fn every_kind_renders_exactly_its_fields() {
        let graph = sample();

        for root in [EntityRef::Hero(1), EntityRef::Power(1), EntityRef::HeroPower(10)] {
            let value = Serializer::new(0).serialize(&graph, root, &Rules::new()).expect("root");
            let keys: Vec<&str> = value.as_object().expect("object").keys().map(String::as_str).collect();
            let mut expected = root.kind().fields().to_vec();
            expected.sort_unstable();
            assert_eq!(keys, expected);
        }
    }

    #[test]
    fn missing_root_yields_none() {
        assert!(Serializer::default().serialize(&sample(), EntityRef::Hero(42), &Rules::new()).is_none());
    }

    fn contains_hero_with_powers(value: &Value, inside_join: bool) -> bool {
        match value {
            Value::Object(map) => map.iter().any(|(key, child)| {
                (inside_join && key == "hero" && child.get("hero_powers").is_some())
                    || contains_hero_with_powers(child, key == "hero_powers" || inside_join)
            }),
            Value::Array(items) => items.iter().any(|item| contains_hero_with_powers(item, inside_join)),
            _ => false,
        }
    }

    proptest! {
        #[test]
        fn hero_output_never_cycles_back(
            extra in proptest::collection::vec("-?(hero_powers|power|hero|name)(\\.(hero_powers|power|hero)){0,2}", 0..4),
            depth in 1usize..12,
        ) {
            let value = Serializer::new(depth)
                .serialize(&sample(), EntityRef::Hero(1), &Rules::parse(&extra))
                .expect("hero 1");

            prop_assert!(!contains_hero_with_powers(&value, false));
        }
    }
}
