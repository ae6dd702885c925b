//! App catalogue endpoints.
//!
//! Public:
//! - GET `/apps` - List apps
//! - GET `/apps/{id}` - Get one app
//! - GET `/releases` - Release values in use, for edit forms
//!
//! Admin (bearer token required, mounted under `/admin`):
//! - GET `/apps`, GET `/apps/{id}` - Same as public
//! - POST `/apps/0` - Insert an app
//! - PATCH `/apps/{id}` - Update the given fields of an app
//! - DELETE `/apps/{id}` - Delete an app

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use tracing::info;

use super::error::{ApiError, Envelope, ResultExt, parse_id};
use crate::auth::Session;
use crate::db::{App, AppPatch, Database, NewApp, ReleaseOption};

#[derive(Clone)]
pub struct AppsState {
    pub db: Database,
}

pub fn public_router(state: AppsState) -> Router {
    Router::new()
        .route("/apps", get(list_apps))
        .route("/apps/{id}", get(get_app))
        .route("/releases", get(list_releases))
        .with_state(state)
}

pub fn admin_router(state: AppsState) -> Router {
    Router::new()
        .route("/apps", get(list_apps))
        .route("/apps/0", post(insert_app))
        .route(
            "/apps/{id}",
            get(get_app).patch(update_app).delete(delete_app),
        )
        .with_state(state)
}

async fn list_apps(State(state): State<AppsState>) -> Result<Json<Vec<App>>, ApiError> {
    let apps = state.db.apps().list().await.db_err("Failed to list apps")?;
    Ok(Json(apps))
}

async fn list_releases(
    State(state): State<AppsState>,
) -> Result<Json<Vec<ReleaseOption>>, ApiError> {
    let releases = state
        .db
        .apps()
        .releases()
        .await
        .db_err("Failed to list releases")?;
    Ok(Json(releases))
}

async fn get_app(
    State(state): State<AppsState>,
    Path(id): Path<String>,
) -> Result<Json<App>, ApiError> {
    let id = parse_id(&id)?;
    let app = state
        .db
        .apps()
        .get(id)
        .await
        .db_err("Failed to get app")?
        .ok_or_else(|| ApiError::not_found("app not found"))?;
    Ok(Json(app))
}

async fn insert_app(
    State(state): State<AppsState>,
    Session(claims): Session,
    payload: Result<Json<NewApp>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let Json(app) = payload?;
    if app.name.trim().is_empty() {
        return Err(ApiError::bad_request("app name is required"));
    }

    let id = state
        .db
        .apps()
        .insert(&app, Utc::now().timestamp())
        .await
        .db_err("Failed to insert app")?;

    info!(app_id = id, user_id = claims.user_id, "App inserted");
    Ok((
        StatusCode::ACCEPTED,
        Json(Envelope::ok(format!("app inserted {}", id))),
    ))
}

async fn update_app(
    State(state): State<AppsState>,
    Session(claims): Session,
    Path(id): Path<String>,
    payload: Result<Json<AppPatch>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let id = parse_id(&id)?;
    let Json(patch) = payload?;
    if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::bad_request("app name is required"));
    }

    let apps = state.db.apps();
    let mut app = apps
        .get(id)
        .await
        .db_err("Failed to get app")?
        .ok_or_else(|| ApiError::not_found("app not found"))?;

    app.apply(patch, Utc::now().timestamp());
    if !apps.update(&app).await.db_err("Failed to update app")? {
        return Err(ApiError::not_found("app not found"));
    }

    info!(app_id = id, user_id = claims.user_id, "App updated");
    Ok((StatusCode::ACCEPTED, Json(Envelope::ok("app updated"))))
}

async fn delete_app(
    State(state): State<AppsState>,
    Session(claims): Session,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let id = parse_id(&id)?;
    let deleted = state
        .db
        .apps()
        .delete(id)
        .await
        .db_err("Failed to delete app")?;
    if !deleted {
        return Err(ApiError::not_found("app not found"));
    }

    info!(app_id = id, user_id = claims.user_id, "App deleted");
    Ok((StatusCode::ACCEPTED, Json(Envelope::ok("app deleted"))))
}
