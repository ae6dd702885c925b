mod apps;
mod error;
mod session;
mod status;

use axum::{Router, middleware, routing::get};

use crate::auth::{AuthService, require_bearer};
use crate::db::Database;

pub use apps::AppsState;
pub use error::{ApiError, Envelope, ResultExt, parse_id};
pub use session::SessionState;
pub use status::Status;

/// Create the API router.
pub fn create_api_router(db: Database, auth: AuthService) -> Router {
    let apps_state = AppsState { db };
    let admin = apps::admin_router(apps_state.clone()).route_layer(
        middleware::from_fn_with_state(auth.jwt().clone(), require_bearer),
    );

    Router::new()
        .route("/", get(status::home))
        .merge(session::router(SessionState { auth }))
        .merge(apps::public_router(apps_state))
        .nest("/admin", admin)
}
