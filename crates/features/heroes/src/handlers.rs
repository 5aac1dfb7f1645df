use crate::Heroes;
use crate::dto::{HeroPowerSummary, HeroView, NewHeroPowerRequest, PowerPatch, PowerView};
use crate::error::HeroesError;
use crate::rules::Rules;
use crate::service::{HERO_DETAIL_RULES, HeroService, LIST_RULES, POWER_DETAIL_RULES};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use cape_domain::constants::{HERO, HEROES_TAG, POWER};
use cape_kernel::server::{ApiError, ApiState, ErrorBody};
use serde_json::Value;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// `/heroes`, `/powers` and `/hero_powers`.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(list_heroes))
        .routes(routes!(get_hero))
        .routes(routes!(list_powers))
        .routes(routes!(get_power, update_power))
        .routes(routes!(create_hero_power))
}

fn service(state: &ApiState) -> Result<&HeroService, ApiError> {
    state
        .try_get_slice::<Heroes>()
        .map(|heroes| &heroes.service)
        .map_err(|error| ApiError::internal(error.to_string()))
}

/// A path id that is not an integer cannot match any row.
fn path_id(path: Result<Path<i64>, PathRejection>, entity: &'static str) -> Result<i64, ApiError> {
    path.map(|Path(id)| id).map_err(|_| HeroesError::not_found(entity, None).into())
}

#[utoipa::path(
    get,
    path = "/heroes",
    responses(
        (status = OK, description = "All heroes, without their powers", body = [HeroView]),
        (status = INTERNAL_SERVER_ERROR, description = "Storage failure", body = ErrorBody),
    ),
    tag = HEROES_TAG,
)]
pub(crate) async fn list_heroes(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let heroes = service(&state)?.list_heroes(&Rules::parse(LIST_RULES)).await?;
    Ok(Json(heroes))
}

#[utoipa::path(
    get,
    path = "/heroes/{id}",
    params(("id" = i64, Path, description = "Hero id")),
    responses(
        (status = OK, description = "The hero with its powers", body = HeroView),
        (status = NOT_FOUND, description = "No such hero", body = ErrorBody),
    ),
    tag = HEROES_TAG,
)]
pub(crate) async fn get_hero(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = path_id(path, HERO)?;
    let hero = service(&state)?.get_hero(id, &Rules::parse(HERO_DETAIL_RULES)).await?;
    Ok(Json(hero))
}

#[utoipa::path(
    get,
    path = "/powers",
    responses(
        (status = OK, description = "All powers", body = [PowerView]),
        (status = INTERNAL_SERVER_ERROR, description = "Storage failure", body = ErrorBody),
    ),
    tag = HEROES_TAG,
)]
pub(crate) async fn list_powers(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let powers = service(&state)?.list_powers(&Rules::parse(LIST_RULES)).await?;
    Ok(Json(powers))
}

#[utoipa::path(
    get,
    path = "/powers/{id}",
    params(("id" = i64, Path, description = "Power id")),
    responses(
        (status = OK, description = "The power", body = PowerView),
        (status = NOT_FOUND, description = "No such power", body = ErrorBody),
    ),
    tag = HEROES_TAG,
)]
pub(crate) async fn get_power(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = path_id(path, POWER)?;
    let power = service(&state)?.get_power(id, &Rules::parse(POWER_DETAIL_RULES)).await?;
    Ok(Json(power))
}

#[utoipa::path(
    patch,
    path = "/powers/{id}",
    params(("id" = i64, Path, description = "Power id")),
    request_body = PowerPatch,
    responses(
        (status = OK, description = "The updated power", body = PowerView),
        (status = BAD_REQUEST, description = "Invalid description or malformed body", body = ErrorBody),
        (status = NOT_FOUND, description = "No such power", body = ErrorBody),
    ),
    tag = HEROES_TAG,
)]
pub(crate) async fn update_power(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<PowerPatch>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = path_id(path, POWER)?;
    let service = service(&state)?;
    let patch = match body {
        Ok(Json(patch)) => patch,
        Err(rejection) => {
            service.require_power(id).await?;
            return Err(rejection.into());
        },
    };
    let power = service.update_power(id, patch).await?;
    Ok(Json(power))
}

#[utoipa::path(
    post,
    path = "/hero_powers",
    request_body = NewHeroPowerRequest,
    responses(
        (status = OK, description = "The new link with hero and power names", body = HeroPowerSummary),
        (status = BAD_REQUEST, description = "Invalid strength or malformed body", body = ErrorBody),
        (status = NOT_FOUND, description = "Hero or power does not exist", body = ErrorBody),
    ),
    tag = HEROES_TAG,
)]
pub(crate) async fn create_hero_power(
    State(state): State<ApiState>,
    body: Result<Json<NewHeroPowerRequest>, JsonRejection>,
) -> Result<Json<HeroPowerSummary>, ApiError> {
    let Json(request) = body?;
    let summary = service(&state)?.create_hero_power(&request).await.map_err(|error| match error {
        HeroesError::NotFound { .. } => ApiError::from(error).into_listed(),
        other => ApiError::from(other),
    })?;
    Ok(Json(summary))
}
