//! The in-memory entity graph walked by the serializer and filled by the loader.

use crate::model::{Hero, HeroPower, Power};
use crate::rules::Rules;
use cape_domain::constants::{HERO, HERO_POWER, POWER};
use fxhash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Hero,
    Power,
    HeroPower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// A navigable association of an entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub name: &'static str,
    pub target: EntityKind,
    pub cardinality: Cardinality,
}

const HERO_RELATIONS: &[Relation] =
    &[Relation { name: "hero_powers", target: EntityKind::HeroPower, cardinality: Cardinality::Many }];
const POWER_RELATIONS: &[Relation] =
    &[Relation { name: "hero_powers", target: EntityKind::HeroPower, cardinality: Cardinality::Many }];
const HERO_POWER_RELATIONS: &[Relation] = &[
    Relation { name: "hero", target: EntityKind::Hero, cardinality: Cardinality::One },
    Relation { name: "power", target: EntityKind::Power, cardinality: Cardinality::One },
];

impl EntityKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hero => HERO,
            Self::Power => POWER,
            Self::HeroPower => HERO_POWER,
        }
    }

    /// Scalar columns, in storage order.
    #[must_use]
    pub const fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Hero => &["id", "name", "super_name"],
            Self::Power => &["id", "name", "description"],
            Self::HeroPower => &["id", "hero_id", "power_id", "strength"],
        }
    }

    #[must_use]
    pub const fn relations(self) -> &'static [Relation] {
        match self {
            Self::Hero => HERO_RELATIONS,
            Self::Power => POWER_RELATIONS,
            Self::HeroPower => HERO_POWER_RELATIONS,
        }
    }

    /// Exclusions every node of this kind applies to itself, breaking the back-reference cycles.
    #[must_use]
    pub const fn default_exclusions(self) -> &'static [&'static str] {
        match self {
            Self::Hero => &["hero_powers.hero"],
            Self::Power => &["hero_powers.power"],
            Self::HeroPower => &["hero.hero_powers", "power.hero_powers"],
        }
    }

    /// `rules` merged with this kind's defaults.
    #[must_use]
    pub fn effective_rules(self, rules: &Rules) -> Rules {
        rules.union(&Rules::parse(self.default_exclusions()))
    }
}

/// A node of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Hero(i64),
    Power(i64),
    HeroPower(i64),
}

impl EntityRef {
    #[must_use]
    pub const fn kind(self) -> EntityKind {
        match self {
            Self::Hero(_) => EntityKind::Hero,
            Self::Power(_) => EntityKind::Power,
            Self::HeroPower(_) => EntityKind::HeroPower,
        }
    }

    #[must_use]
    pub const fn id(self) -> i64 {
        match self {
            Self::Hero(id) | Self::Power(id) | Self::HeroPower(id) => id,
        }
    }

    #[must_use]
    pub const fn of(kind: EntityKind, id: i64) -> Self {
        match kind {
            EntityKind::Hero => Self::Hero(id),
            EntityKind::Power => Self::Power(id),
            EntityKind::HeroPower => Self::HeroPower(id),
        }
    }
}

/// A relation that will be emitted for a node, with the rules its targets receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub relation: Relation,
    pub rules: Rules,
}

/// Relations of `kind` that survive `effective` rules at `depth`.
///
/// The serializer and the loader both call this, so storage is only asked for what is emitted.
#[must_use]
pub fn expansions(kind: EntityKind, effective: &Rules, depth: usize, max_depth: usize) -> Vec<Expansion> {
    if depth >= max_depth {
        return Vec::new();
    }
    kind.relations()
        .iter()
        .filter(|relation| !effective.excludes(relation.name))
        .map(|relation| Expansion { relation: *relation, rules: effective.descend(relation.name) })
        .collect()
}

/// Identity map of loaded records: at most one entry per id per kind.
#[derive(Debug, Clone, Default)]
pub struct EntityGraph {
    heroes: FxHashMap<i64, Hero>,
    powers: FxHashMap<i64, Power>,
    hero_powers: FxHashMap<i64, HeroPower>,
}

impl EntityGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_hero(&mut self, hero: Hero) -> EntityRef {
        let id = hero.id;
        self.heroes.insert(id, hero);
        EntityRef::Hero(id)
    }

    pub fn insert_power(&mut self, power: Power) -> EntityRef {
        let id = power.id;
        self.powers.insert(id, power);
        EntityRef::Power(id)
    }

    pub fn insert_hero_power(&mut self, hero_power: HeroPower) -> EntityRef {
        let id = hero_power.id;
        self.hero_powers.insert(id, hero_power);
        EntityRef::HeroPower(id)
    }

    #[must_use]
    pub fn hero(&self, id: i64) -> Option<&Hero> {
        self.heroes.get(&id)
    }

    #[must_use]
    pub fn power(&self, id: i64) -> Option<&Power> {
        self.powers.get(&id)
    }

    #[must_use]
    pub fn hero_power(&self, id: i64) -> Option<&HeroPower> {
        self.hero_powers.get(&id)
    }

    /// Records the association ids of a hero or power; other nodes are left alone.
    pub fn set_hero_powers(&mut self, owner: EntityRef, ids: Vec<i64>) {
        match owner {
            EntityRef::Hero(id) => {
                if let Some(hero) = self.heroes.get_mut(&id) {
                    hero.hero_powers = ids;
                }
            },
            EntityRef::Power(id) => {
                if let Some(power) = self.powers.get_mut(&id) {
                    power.hero_powers = ids;
                }
            },
            EntityRef::HeroPower(_) => {},
        }
    }

    #[must_use]
    pub fn contains(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Hero(id) => self.heroes.contains_key(&id),
            EntityRef::Power(id) => self.powers.contains_key(&id),
            EntityRef::HeroPower(id) => self.hero_powers.contains_key(&id),
        }
    }

    /// Targets of `relation` from `entity`, in stored order.
    #[must_use]
    pub fn related(&self, entity: EntityRef, relation: &Relation) -> Vec<EntityRef> {
        let ids: Vec<i64> = match (entity, relation.name) {
            (EntityRef::Hero(id), "hero_powers") => {
                self.hero(id).map(|hero| hero.hero_powers.clone()).unwrap_or_default()
            },
            (EntityRef::Power(id), "hero_powers") => {
                self.power(id).map(|power| power.hero_powers.clone()).unwrap_or_default()
            },
            (EntityRef::HeroPower(id), "hero") => self.hero_power(id).map(|hp| hp.hero_id).into_iter().collect(),
            (EntityRef::HeroPower(id), "power") => {
                self.hero_power(id).map(|hp| hp.power_id).into_iter().collect()
            },
            _ => Vec::new(),
        };
        ids.into_iter().map(|id| EntityRef::of(relation.target, id)).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heroes.len() + self.powers.len() + self.hero_powers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
