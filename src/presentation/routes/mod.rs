use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};

use crate::domain::entities::Role;
use crate::infrastructure::http::health_check;
use crate::presentation::handlers::{self, AppState};
use crate::presentation::middleware::auth::{require_auth, require_roles};
use crate::presentation::middleware::rate_limit::{rate_limit_middleware, PathClass};

/// Create all application routes.
///
/// The public allow-list (login, register, refresh, health) is the route
/// layout itself: only the protected routers carry the authentication
/// filter, so public endpoints bypass it entirely.
pub fn create_routes(state: AppState, trust_proxy_headers: bool) -> Router {
    Router::new()
        .nest("/api/v1/auth", auth_routes(&state, trust_proxy_headers))
        .nest("/api/v1/admin", admin_routes(&state))
        .route("/health", get(health_check))
        .with_state(state)
}

fn auth_routes(state: &AppState, trust_proxy_headers: bool) -> Router<AppState> {
    let login = Router::new().route("/login", post(handlers::auth::login)).route_layer(from_fn(
        rate_limit_middleware(state.limiter.clone(), PathClass::Login, trust_proxy_headers),
    ));

    let register = Router::new().route("/register", post(handlers::auth::register)).route_layer(
        from_fn(rate_limit_middleware(
            state.limiter.clone(),
            PathClass::Register,
            trust_proxy_headers,
        )),
    );

    let refresh = Router::new().route("/refresh", post(handlers::auth::refresh)).route_layer(
        from_fn(rate_limit_middleware(
            state.limiter.clone(),
            PathClass::GeneralAuth,
            trust_proxy_headers,
        )),
    );

    let protected = Router::new()
        .route("/me", get(handlers::auth::me))
        .route("/session", get(handlers::auth::session))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new().merge(login).merge(register).merge(refresh).merge(protected)
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    // Roles run inside authentication: the auth layer is added last, so it
    // executes first.
    Router::new()
        .route("/rate-limits", get(handlers::admin::rate_limit_stats))
        .route_layer(from_fn(require_roles(&[Role::Admin])))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
}
