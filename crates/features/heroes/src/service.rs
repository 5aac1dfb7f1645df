use crate::dto::{HeroPowerSummary, NewHeroPowerRequest, PowerPatch};
use crate::error::HeroesError;
use crate::graph::{EntityGraph, EntityRef};
use crate::model::{Hero, HeroPower, NewHero, NewHeroPower, NewPower, Power};
use crate::repository;
use crate::rules::Rules;
use crate::serializer::Serializer;
use crate::validation::validate_strength;
use cape_database::{Database, DatabaseErrorExt};
use sqlx::SqliteConnection;
use cape_domain::constants::{HERO, POWER};
use serde_json::Value;
use tracing::{debug, info, instrument};

/// Exclusions of the list endpoints.
pub const LIST_RULES: &[&str] = &["-hero_powers"];
/// Exclusions of `GET /heroes/{id}`.
pub const HERO_DETAIL_RULES: &[&str] = &["-power.hero", "-hero_powers.hero"];
/// Exclusions of `GET /powers/{id}` and `PATCH /powers/{id}`.
pub const POWER_DETAIL_RULES: &[&str] = &["-hero_powers"];

/// Entry point for every read and write of the slice.
///
/// Reads check out a pooled connection; writes run inside a transaction that is
/// committed only after validation and the write succeeded.
#[derive(Debug, Clone)]
pub struct HeroService {
    db: Database,
    serializer: Serializer,
}

impl HeroService {
    #[must_use]
    pub const fn new(db: Database, serializer: Serializer) -> Self {
        Self { db, serializer }
    }

    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }

    pub async fn list_heroes(&self, rules: &Rules) -> Result<Value, HeroesError> {
        let mut conn = self.db.acquire().await?;
        let mut graph = EntityGraph::new();
        let roots: Vec<EntityRef> = repository::list_heroes(&mut conn)
            .await?
            .into_iter()
            .map(|hero| graph.insert_hero(hero))
            .collect();

        repository::load(&mut conn, &mut graph, &roots, rules, self.serializer.max_depth()).await?;
        Ok(self.serializer.serialize_many(&graph, &roots, rules))
    }

    pub async fn list_powers(&self, rules: &Rules) -> Result<Value, HeroesError> {
        let mut conn = self.db.acquire().await?;
        let mut graph = EntityGraph::new();
        let roots: Vec<EntityRef> = repository::list_powers(&mut conn)
            .await?
            .into_iter()
            .map(|power| graph.insert_power(power))
            .collect();

        repository::load(&mut conn, &mut graph, &roots, rules, self.serializer.max_depth()).await?;
        Ok(self.serializer.serialize_many(&graph, &roots, rules))
    }

    pub async fn get_hero(&self, id: i64, rules: &Rules) -> Result<Value, HeroesError> {
        self.get(EntityRef::Hero(id), rules).await
    }

    pub async fn get_power(&self, id: i64, rules: &Rules) -> Result<Value, HeroesError> {
        self.get(EntityRef::Power(id), rules).await
    }

    async fn get(&self, root: EntityRef, rules: &Rules) -> Result<Value, HeroesError> {
        let mut conn = self.db.acquire().await?;
        let mut graph = EntityGraph::new();
        repository::load(&mut conn, &mut graph, &[root], rules, self.serializer.max_depth()).await?;

        self.serializer
            .serialize(&graph, root, rules)
            .ok_or_else(|| HeroesError::not_found(root.kind().name(), Some(root.id())))
    }

    /// Fails with `NotFound` unless power `id` exists.
    pub async fn require_power(&self, id: i64) -> Result<(), HeroesError> {
        let mut conn = self.db.acquire().await?;
        repository::find_power(&mut conn, id)
            .await?
            .map(|_| ())
            .ok_or_else(|| HeroesError::not_found(POWER, Some(id)))
    }

    /// Applies `patch` to power `id` and returns it serialized without `hero_powers`.
    ///
    /// A missing power wins over an invalid body. An absent `description` leaves the power as is.
    #[instrument(skip(self, patch))]
    pub async fn update_power(&self, id: i64, patch: PowerPatch) -> Result<Value, HeroesError> {
        let mut tx = self.db.begin().await?;
        let mut power = repository::find_power(&mut tx, id)
            .await?
            .ok_or_else(|| HeroesError::not_found(POWER, Some(id)))?;

        if let Some(raw) = patch.description {
            power.set_description(raw.as_str())?;
            if !repository::update_power_description(&mut tx, id, power.description()).await? {
                return Err(HeroesError::not_found(POWER, Some(id)));
            }
            tx.commit().await.context("Committing")?;
            info!(power_id = id, "Power description updated");
        } else {
            debug!(power_id = id, "Patch without description, nothing to update");
            drop(tx);
        }

        self.get_power(id, &Rules::parse(POWER_DETAIL_RULES)).await
    }

    /// Links a hero to a power.
    ///
    /// Checks run in order: strength (400), hero (404), power (404). The lookups and
    /// the insert share one transaction.
    #[instrument(skip(self, request))]
    pub async fn create_hero_power(
        &self,
        request: &NewHeroPowerRequest,
    ) -> Result<HeroPowerSummary, HeroesError> {
        let strength = validate_strength(request.strength_str())?;

        let mut tx = self.db.begin().await?;
        let hero = match request.hero_id() {
            Some(id) => repository::find_hero(&mut tx, id).await?,
            None => None,
        }
        .ok_or_else(|| HeroesError::not_found(HERO, request.hero_id()))?;
        let power = match request.power_id() {
            Some(id) => repository::find_power(&mut tx, id).await?,
            None => None,
        }
        .ok_or_else(|| HeroesError::not_found(POWER, request.power_id()))?;

        let row = insert_link(&mut tx, &NewHeroPower::new(hero.id, power.id, strength)).await?;
        tx.commit().await.context("Committing")?;

        info!(hero_power_id = row.id, hero_id = hero.id, power_id = power.id, %strength, "Hero power created");
        Ok(HeroPowerSummary::new(row, hero.name, power.name))
    }

    /// Links existing ids without looking them up first.
    ///
    /// A dangling id is reported by the foreign keys and surfaces as `NotFound`.
    #[instrument(skip(self))]
    pub async fn link(&self, draft: NewHeroPower) -> Result<HeroPower, HeroesError> {
        let mut tx = self.db.begin().await?;
        let row = insert_link(&mut tx, &draft).await?;
        tx.commit().await.context("Committing")?;

        info!(hero_power_id = row.id, hero_id = draft.hero_id, power_id = draft.power_id, "Hero power linked");
        Ok(row)
    }

    #[instrument(skip(self, draft))]
    pub async fn create_hero(&self, draft: &NewHero) -> Result<Hero, HeroesError> {
        let mut tx = self.db.begin().await?;
        let id = repository::insert_hero(&mut tx, draft).await?;
        tx.commit().await.context("Committing")?;

        info!(hero_id = id, name = draft.name(), "Hero created");
        Ok(Hero {
            id,
            name: draft.name().to_owned(),
            super_name: draft.super_name().to_owned(),
            hero_powers: Vec::new(),
        })
    }

    #[instrument(skip(self, draft))]
    pub async fn create_power(&self, draft: &NewPower) -> Result<Power, HeroesError> {
        let mut tx = self.db.begin().await?;
        let id = repository::insert_power(&mut tx, draft).await?;
        tx.commit().await.context("Committing")?;

        info!(power_id = id, name = draft.name(), "Power created");
        Ok(Power::from_row(id, draft.name().to_owned(), draft.description().to_owned()))
    }

    /// Deletes a hero together with its `HeroPower` rows.
    #[instrument(skip(self))]
    pub async fn delete_hero(&self, id: i64) -> Result<(), HeroesError> {
        let mut tx = self.db.begin().await?;
        if !repository::delete_hero(&mut tx, id).await? {
            return Err(HeroesError::not_found(HERO, Some(id)));
        }
        tx.commit().await.context("Committing")?;

        info!(hero_id = id, "Hero deleted");
        Ok(())
    }

    /// Deletes a power together with its `HeroPower` rows.
    #[instrument(skip(self))]
    pub async fn delete_power(&self, id: i64) -> Result<(), HeroesError> {
        let mut tx = self.db.begin().await?;
        if !repository::delete_power(&mut tx, id).await? {
            return Err(HeroesError::not_found(POWER, Some(id)));
        }
        tx.commit().await.context("Committing")?;

        info!(power_id = id, "Power deleted");
        Ok(())
    }
}

/// Inserts a link, turning a foreign key violation into `NotFound` for the missing side.
async fn insert_link(conn: &mut SqliteConnection, draft: &NewHeroPower) -> Result<HeroPower, HeroesError> {
    match repository::insert_hero_power(conn, draft).await {
        Ok(row) => Ok(row),
        Err(error) if error.is_foreign_key_violation() => {
            if repository::find_hero(conn, draft.hero_id).await?.is_none() {
                Err(HeroesError::not_found(HERO, Some(draft.hero_id)))
            } else {
                Err(HeroesError::not_found(POWER, Some(draft.power_id)))
            }
        },
        Err(error) => Err(error.into()),
    }
}
