use crate::validation::InvalidField;
use cape_database::DatabaseError;
use cape_kernel::server::ApiError;
use std::borrow::Cow;
use tracing::warn;

#[cape_derive::cape_error]
pub enum HeroesError {
    /// The referenced record does not exist.
    #[error("{entity} not found{}", format_context(.context))]
    NotFound { entity: &'static str, id: Option<i64>, context: Option<Cow<'static, str>> },

    /// A field failed its constraint; nothing was written.
    #[error("Validation failed{}: {source}", format_context(.context))]
    Validation {
        #[source]
        source: InvalidField,
        context: Option<Cow<'static, str>>,
    },

    #[error("Storage failure{}: {source}", format_context(.context))]
    Storage { source: DatabaseError, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl HeroesError {
    #[must_use]
    pub const fn not_found(entity: &'static str, id: Option<i64>) -> Self {
        Self::NotFound { entity, id, context: None }
    }
}

impl From<HeroesError> for ApiError {
    fn from(error: HeroesError) -> Self {
        match error {
            HeroesError::NotFound { entity, .. } => Self::not_found(format!("{entity} not found")),
            HeroesError::Validation { source, context } => {
                warn!(field = source.field, context = ?context, "Rejected write: {source}");
                Self::validation()
            },
            HeroesError::Storage { source, .. } => Self::internal(source.to_string()),
            HeroesError::Internal { message, .. } => Self::internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use cape_kernel::server::ErrorBody;

    #[test]
    fn not_found_names_the_entity_only() {
        let api: ApiError = HeroesError::not_found("Hero", Some(9)).with_context("Loading hero").into();

        assert_eq!(api.status(), StatusCode::NOT_FOUND);
        assert_eq!(api.body(), &ErrorBody::Error("Hero not found".to_owned()));
    }

    #[test]
    fn validation_maps_to_the_listed_envelope() {
        let error: HeroesError = InvalidField::new("description", "too short").into();

        assert_eq!(ApiError::from(error), ApiError::validation());
    }

    #[test]
    fn storage_failures_surface_their_message() {
        let error: HeroesError =
            DatabaseError::Connection { message: "database is locked".into(), context: None }.into();

        let api = ApiError::from(error);

        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.body(), &ErrorBody::Error("Database connection failed: database is locked".to_owned()));
    }
}
