//! SQL for the three tables and the rule-aware graph loader.
//!
//! Every function takes a `&mut SqliteConnection`, so callers decide whether it
//! runs on a pooled connection or inside a transaction.

use crate::graph::{Cardinality, EntityGraph, EntityKind, EntityRef, expansions};
use crate::model::{Hero, HeroPower, NewHero, NewHeroPower, NewPower, Power, Strength};
use crate::rules::Rules;
use cape_database::{DatabaseError, DatabaseErrorExt, Migration};
use fxhash::FxHashSet;
use sqlx::{FromRow, SqliteConnection};
use std::collections::VecDeque;
use std::str::FromStr;
use tracing::trace;

/// Schema of the slice, applied by the database builder at startup.
pub const MIGRATIONS: &[Migration] =
    &[Migration::new("heroes", "0001", include_str!("../migrations/0001_schema.sql"))];

#[derive(Debug, FromRow)]
struct HeroRow {
    id: i64,
    name: String,
    super_name: String,
}

impl From<HeroRow> for Hero {
    fn from(row: HeroRow) -> Self {
        Self { id: row.id, name: row.name, super_name: row.super_name, hero_powers: Vec::new() }
    }
}

#[derive(Debug, FromRow)]
struct PowerRow {
    id: i64,
    name: String,
    description: String,
}

impl From<PowerRow> for Power {
    fn from(row: PowerRow) -> Self {
        Self::from_row(row.id, row.name, row.description)
    }
}

#[derive(Debug, FromRow)]
struct HeroPowerRow {
    id: i64,
    hero_id: i64,
    power_id: i64,
    strength: String,
}

impl TryFrom<HeroPowerRow> for HeroPower {
    type Error = DatabaseError;

    fn try_from(row: HeroPowerRow) -> Result<Self, Self::Error> {
        let strength = Strength::from_str(&row.strength).map_err(|_| DatabaseError::Internal {
            message: format!("hero_powers.{} has unknown strength {:?}", row.id, row.strength).into(),
            context: None,
        })?;
        Ok(Self { id: row.id, hero_id: row.hero_id, power_id: row.power_id, strength })
    }
}

pub async fn find_hero(conn: &mut SqliteConnection, id: i64) -> Result<Option<Hero>, DatabaseError> {
    let row = sqlx::query_as::<_, HeroRow>("SELECT id, name, super_name FROM heroes WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .context("Selecting hero")?;
    Ok(row.map(Hero::from))
}

pub async fn find_power(conn: &mut SqliteConnection, id: i64) -> Result<Option<Power>, DatabaseError> {
    let row = sqlx::query_as::<_, PowerRow>("SELECT id, name, description FROM powers WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .context("Selecting power")?;
    Ok(row.map(Power::from))
}

pub async fn find_hero_power(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<HeroPower>, DatabaseError> {
    let row = sqlx::query_as::<_, HeroPowerRow>(
        "SELECT id, hero_id, power_id, strength FROM hero_powers WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .context("Selecting hero power")?;
    row.map(HeroPower::try_from).transpose()
}

pub async fn list_heroes(conn: &mut SqliteConnection) -> Result<Vec<Hero>, DatabaseError> {
    let rows = sqlx::query_as::<_, HeroRow>("SELECT id, name, super_name FROM heroes ORDER BY id")
        .fetch_all(&mut *conn)
        .await
        .context("Listing heroes")?;
    Ok(rows.into_iter().map(Hero::from).collect())
}

pub async fn list_powers(conn: &mut SqliteConnection) -> Result<Vec<Power>, DatabaseError> {
    let rows = sqlx::query_as::<_, PowerRow>("SELECT id, name, description FROM powers ORDER BY id")
        .fetch_all(&mut *conn)
        .await
        .context("Listing powers")?;
    Ok(rows.into_iter().map(Power::from).collect())
}

/// `HeroPower` rows owned by a hero or a power, in insertion order.
pub async fn hero_powers_of(
    conn: &mut SqliteConnection,
    owner: EntityRef,
) -> Result<Vec<HeroPower>, DatabaseError> {
    let sql = match owner {
        EntityRef::Hero(_) => {
            "SELECT id, hero_id, power_id, strength FROM hero_powers WHERE hero_id = ? ORDER BY id"
        },
        EntityRef::Power(_) => {
            "SELECT id, hero_id, power_id, strength FROM hero_powers WHERE power_id = ? ORDER BY id"
        },
        EntityRef::HeroPower(_) => return Ok(Vec::new()),
    };

    let rows = sqlx::query_as::<_, HeroPowerRow>(sql)
        .bind(owner.id())
        .fetch_all(&mut *conn)
        .await
        .context("Selecting hero powers")?;
    rows.into_iter().map(HeroPower::try_from).collect()
}

pub async fn insert_hero(conn: &mut SqliteConnection, draft: &NewHero) -> Result<i64, DatabaseError> {
    sqlx::query_scalar("INSERT INTO heroes (name, super_name) VALUES (?, ?) RETURNING id")
        .bind(draft.name())
        .bind(draft.super_name())
        .fetch_one(&mut *conn)
        .await
        .context("Inserting hero")
}

pub async fn insert_power(conn: &mut SqliteConnection, draft: &NewPower) -> Result<i64, DatabaseError> {
    sqlx::query_scalar("INSERT INTO powers (name, description) VALUES (?, ?) RETURNING id")
        .bind(draft.name())
        .bind(draft.description())
        .fetch_one(&mut *conn)
        .await
        .context("Inserting power")
}

pub async fn insert_hero_power(
    conn: &mut SqliteConnection,
    draft: &NewHeroPower,
) -> Result<HeroPower, DatabaseError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO hero_powers (hero_id, power_id, strength) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(draft.hero_id)
    .bind(draft.power_id)
    .bind(draft.strength.as_ref())
    .fetch_one(&mut *conn)
    .await
    .context("Inserting hero power")?;

    Ok(HeroPower { id, hero_id: draft.hero_id, power_id: draft.power_id, strength: draft.strength })
}

/// Returns `false` when no power has `id`.
pub async fn update_power_description(
    conn: &mut SqliteConnection,
    id: i64,
    description: &str,
) -> Result<bool, DatabaseError> {
    let result = sqlx::query("UPDATE powers SET description = ? WHERE id = ?")
        .bind(description)
        .bind(id)
        .execute(&mut *conn)
        .await
        .context("Updating power description")?;
    Ok(result.rows_affected() > 0)
}

/// Deletes a hero and, through the cascade, its `HeroPower` rows.
pub async fn delete_hero(conn: &mut SqliteConnection, id: i64) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM heroes WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .context("Deleting hero")?;
    Ok(result.rows_affected() > 0)
}

/// Deletes a power and, through the cascade, its `HeroPower` rows.
pub async fn delete_power(conn: &mut SqliteConnection, id: i64) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM powers WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .context("Deleting power")?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_heroes(conn: &mut SqliteConnection) -> Result<i64, DatabaseError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM heroes").fetch_one(&mut *conn).await.context("Counting heroes")
}

pub async fn count_powers(conn: &mut SqliteConnection) -> Result<i64, DatabaseError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM powers").fetch_one(&mut *conn).await.context("Counting powers")
}

pub async fn count_hero_powers(conn: &mut SqliteConnection) -> Result<i64, DatabaseError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM hero_powers")
        .fetch_one(&mut *conn)
        .await
        .context("Counting hero powers")
}

/// Fills `graph` with everything the serializer will emit for `roots` under `rules`.
///
/// Walks breadth-first with the same expansion decisions as the serializer. Each
/// relation of a node is fetched at most once; nodes missing from storage are skipped.
pub async fn load(
    conn: &mut SqliteConnection,
    graph: &mut EntityGraph,
    roots: &[EntityRef],
    rules: &Rules,
    max_depth: usize,
) -> Result<(), DatabaseError> {
    let mut queue: VecDeque<(EntityRef, Rules, usize)> =
        roots.iter().map(|root| (*root, rules.clone(), 0)).collect();
    let mut visited: FxHashSet<(EntityRef, Rules)> = FxHashSet::default();
    let mut expanded: FxHashSet<(EntityRef, &'static str)> = FxHashSet::default();

    while let Some((entity, rules, depth)) = queue.pop_front() {
        if !visited.insert((entity, rules.clone())) {
            continue;
        }
        if !graph.contains(entity) && !fetch(conn, graph, entity).await? {
            trace!(?entity, "Skipping dangling reference");
            continue;
        }

        let kind = entity.kind();
        let effective = kind.effective_rules(&rules);
        for expansion in expansions(kind, &effective, depth, max_depth) {
            let relation = expansion.relation;
            if relation.cardinality == Cardinality::Many && expanded.insert((entity, relation.name)) {
                let rows = hero_powers_of(conn, entity).await?;
                let ids = rows.iter().map(|row| row.id).collect();
                for row in rows {
                    graph.insert_hero_power(row);
                }
                graph.set_hero_powers(entity, ids);
            }

            for target in graph.related(entity, &relation) {
                queue.push_back((target, expansion.rules.clone(), depth + 1));
            }
        }
    }

    Ok(())
}

async fn fetch(
    conn: &mut SqliteConnection,
    graph: &mut EntityGraph,
    entity: EntityRef,
) -> Result<bool, DatabaseError> {
    let found = match entity.kind() {
        EntityKind::Hero => find_hero(conn, entity.id()).await?.map(|hero| graph.insert_hero(hero)),
        EntityKind::Power => find_power(conn, entity.id()).await?.map(|power| graph.insert_power(power)),
        EntityKind::HeroPower => {
            find_hero_power(conn, entity.id()).await?.map(|row| graph.insert_hero_power(row))
        },
    };
    Ok(found.is_some())
}
