//! Sample data for local runs, inserted only into empty tables.

use crate::error::HeroesError;
use crate::model::{NewHero, NewHeroPower, NewPower, Strength};
use crate::repository;
use cape_database::{Database, DatabaseErrorExt};
use tracing::{debug, info};

const HEROES: &[(&str, &str)] = &[
    ("Kamala Khan", "Ms. Marvel"),
    ("Doreen Green", "Squirrel Girl"),
    ("Gwen Stacy", "Spider-Gwen"),
    ("Janet Van Dyne", "The Wasp"),
    ("Wanda Maximoff", "Scarlet Witch"),
    ("Carol Danvers", "Captain Marvel"),
    ("Jean Grey", "Dark Phoenix"),
    ("Ororo Munroe", "Storm"),
    ("Kitty Pryde", "Shadowcat"),
    ("Elektra Natchios", "Elektra"),
];

const POWERS: &[(&str, &str)] = &[
    ("super strength", "gives the wielder super-human strengths"),
    ("flight", "gives the wielder the ability to fly through the skies at supersonic speed"),
    ("super human senses", "allows the wielder to use her senses at a super-human level"),
    ("elasticity", "can stretch the human body to extreme lengths"),
];

/// `(hero index, power index, strength)` into the tables above.
const LINKS: &[(usize, usize, Strength)] = &[
    (0, 1, Strength::Strong),
    (0, 3, Strength::Average),
    (1, 0, Strength::Weak),
    (2, 2, Strength::Average),
    (4, 3, Strength::Strong),
    (5, 1, Strength::Strong),
    (5, 0, Strength::Average),
    (7, 1, Strength::Average),
];

/// Inserts the sample heroes, powers and links when no hero exists yet.
///
/// Returns `true` when data was inserted. Runs in one transaction.
pub async fn seed(db: &Database) -> Result<bool, HeroesError> {
    let mut tx = db.begin().await?;
    if repository::count_heroes(&mut tx).await? > 0 {
        debug!("Heroes already present, skipping seed");
        return Ok(false);
    }

    let mut hero_ids = Vec::with_capacity(HEROES.len());
    for (name, super_name) in HEROES {
        hero_ids.push(repository::insert_hero(&mut tx, &NewHero::new(name, super_name)?).await?);
    }

    let mut power_ids = Vec::with_capacity(POWERS.len());
    for (name, description) in POWERS {
        power_ids.push(repository::insert_power(&mut tx, &NewPower::new(name, description)?).await?);
    }

    for (hero, power, strength) in LINKS {
        let draft = NewHeroPower::new(hero_ids[*hero], power_ids[*power], *strength);
        repository::insert_hero_power(&mut tx, &draft).await?;
    }

    tx.commit().await.context("Committing seed")?;
    info!(heroes = HEROES.len(), powers = POWERS.len(), links = LINKS.len(), "Seeded sample data");
    Ok(true)
}
