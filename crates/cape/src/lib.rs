//! Facade crate for `CapeHub` features and shared modules.
//! Re-exports domain/kernel primitives and aggregates feature initialization.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! - Open the database with [`migrations`] registered.
//! - Call [`init`] to build the feature slices and [`router`] to mount their routes.

use cape_database::{Database, Migration};
pub use cape_domain as domain;
use cape_domain::config::ApiConfig;
use cape_domain::registry::InitializedSlice;
pub use cape_kernel as kernel;
use cape_kernel::server::ApiState;
use utoipa_axum::router::OpenApiRouter;

/// Feature registry for runtime introspection.
pub mod features {
    pub use cape_heroes as heroes;

    pub const ENABLED: &[&str] = &["heroes"];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// Migrations of every enabled feature, in application order.
#[must_use]
pub fn migrations() -> Vec<Migration> {
    features::heroes::migrations().to_vec()
}

/// Initializes all enabled features.
///
/// # Errors
/// Returns an error if any feature initialization fails.
pub async fn init(
    config: &ApiConfig,
    database: &Database,
) -> Result<Vec<InitializedSlice>, Box<dyn std::error::Error + Send + Sync>> {
    let mut slices = Vec::new();

    // Heroes
    slices.push(features::heroes::init(config, database).await?);

    Ok(slices)
}

/// System routes plus the routes of every enabled feature.
#[must_use]
pub fn router() -> OpenApiRouter<ApiState> {
    cape_kernel::server::system_router().merge(features::heroes::router())
}
