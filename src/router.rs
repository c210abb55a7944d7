use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::{AppState, middleware::auth_middleware, middleware::log_errors, routes};

/// Arma el router completo: rutas públicas de autenticación y rutas
/// protegidas de pastor y líder, anidadas bajo el prefijo de la API.
pub fn app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/buscar-lider", get(routes::auth::buscar_lider));

    let protected_routes = Router::new()
        // rutas del pastor
        .route(
            "/pastor/celulas",
            get(routes::pastor::get_celulas).post(routes::pastor::create_celula),
        )
        .route(
            "/pastor/celulas/{id}",
            put(routes::pastor::update_celula).delete(routes::pastor::delete_celula),
        )
        .route("/pastor/lideres", post(routes::pastor::create_lider))
        .route("/pastor/estadisticas", get(routes::pastor::get_estadisticas))
        // rutas del líder y colíder
        .route("/lider/mi-celula", get(routes::lider::mi_celula))
        .route(
            "/lider/celulas/{id}/miembros",
            post(routes::lider::add_miembro),
        )
        .route(
            "/lider/celulas/{id}/miembros/{mid}",
            delete(routes::lider::remove_miembro),
        )
        .route(
            "/lider/celulas/{id}/miembros/{mid}/rol",
            put(routes::lider::set_miembro_rol),
        )
        .route(
            "/lider/celulas/{id}/colideres",
            post(routes::lider::add_colider),
        )
        .route(
            "/lider/celulas/{id}/colideres/{cid}",
            delete(routes::lider::remove_colider),
        )
        .route("/lider/asistencia", post(routes::lider::registrar_asistencia))
        .route(
            "/lider/celulas/{id}/asistencias",
            get(routes::lider::get_asistencias),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let router = Router::new().nest(
        &state.config.api_base_uri.clone(),
        Router::new().merge(public_routes).merge(protected_routes),
    );

    let router = router.layer(axum::middleware::from_fn(log_errors));

    // CORS abierto solo para desarrollo.
    #[cfg(debug_assertions)]
    let router = router.layer(tower_http::cors::CorsLayer::permissive());

    router.with_state(state)
}
