//! Heroes feature slice: heroes, powers and the strengths linking them.
//!
//! Records are loaded into an [`EntityGraph`] and rendered by the [`Serializer`],
//! which prunes the back-references between heroes, powers and their links
//! according to exclusion [`Rules`]. Writes go through [`HeroService`], which
//! validates every field before anything reaches storage.

pub mod dto;
mod error;
pub mod graph;
mod handlers;
pub mod model;
pub mod repository;
pub mod rules;
pub mod seed;
pub mod serializer;
mod service;
pub mod validation;

pub use crate::error::{HeroesError, HeroesErrorExt};
pub use crate::graph::{EntityGraph, EntityKind, EntityRef};
pub use crate::handlers::router;
pub use crate::rules::Rules;
pub use crate::serializer::Serializer;
pub use crate::service::{HERO_DETAIL_RULES, HeroService, LIST_RULES, POWER_DETAIL_RULES};

use cape_database::{Database, Migration};
use cape_domain::config::ApiConfig;
use cape_kernel::domain::registry::InitializedSlice;
use tracing::info;

/// Heroes feature state
#[cape_derive::cape_slice]
pub struct Heroes {
    pub service: HeroService,
}

/// Migrations the database must run before [`init`].
#[must_use]
pub const fn migrations() -> &'static [Migration] {
    repository::MIGRATIONS
}

/// Initializes the heroes slice on an already migrated database.
///
/// Seeds the sample data set when `database.seed` is enabled.
pub async fn init(config: &ApiConfig, db: &Database) -> Result<InitializedSlice, HeroesError> {
    let service = HeroService::new(db.clone(), Serializer::new(config.heroes.max_depth));

    if config.database.seed {
        seed::seed(db).await.context("Seeding sample data")?;
    }

    info!(max_depth = config.heroes.max_depth, "Heroes slice initialized");
    Ok(InitializedSlice::new(Heroes::new(HeroesInner { service })))
}
