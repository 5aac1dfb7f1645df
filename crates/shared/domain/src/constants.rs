//! Well-known names used in routes, OpenAPI tags, and error messages.

/// OpenAPI tag for the heroes slice.
pub const HEROES_TAG: &str = "Heroes";
/// OpenAPI tag for system endpoints (`/`, `/health`).
pub const SYSTEM_TAG: &str = "System";

pub const HERO: &str = "Hero";
pub const POWER: &str = "Power";
pub const HERO_POWER: &str = "HeroPower";

/// Prefix of environment variables overriding configuration keys.
pub const ENV_PREFIX: &str = "CAPE";
/// Environment variable holding the database URL.
pub const DB_URI_ENV: &str = "DB_URI";
