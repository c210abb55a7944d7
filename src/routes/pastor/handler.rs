use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    AppState,
    stats::compute_statistics,
    store::model::{AsistenciaRecord, Celula, CelulaUpdate, User, UserRole},
    store::{AttendanceRepository, RosterRepository, StoreError},
    utils::{
        Claims, error_codes, error_to_api_response, success_to_api_response, validate_email,
    },
};

use super::model::{CreateCelulaRequest, CreateLiderRequest, EstadisticasQuery};

fn solo_pastor(claims: &Claims) -> Option<Response> {
    if claims.role != UserRole::Pastor {
        return Some(
            (
                StatusCode::FORBIDDEN,
                error_to_api_response::<()>(
                    error_codes::PERMISSION_DENIED,
                    "solo el pastor puede acceder".to_string(),
                ),
            )
                .into_response(),
        );
    }
    None
}

fn store_not_found(e: StoreError) -> Response {
    (
        StatusCode::NOT_FOUND,
        error_to_api_response::<()>(error_codes::NOT_FOUND, e.to_string()),
    )
        .into_response()
}

#[axum::debug_handler]
pub async fn get_celulas(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    if let Some(resp) = solo_pastor(&claims) {
        return resp;
    }

    (
        StatusCode::OK,
        success_to_api_response(state.store.list_celulas()),
    )
        .into_response()
}

#[axum::debug_handler]
pub async fn create_celula(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCelulaRequest>,
) -> Response {
    if let Some(resp) = solo_pastor(&claims) {
        return resp;
    }
    if req.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response::<()>(
                error_codes::VALIDATION_ERROR,
                "el nombre de la célula es obligatorio".to_string(),
            ),
        )
            .into_response();
    }

    let Some(lider) = state.store.find_user_by_id(&req.lider_id) else {
        return store_not_found(StoreError::UserNotFound);
    };

    // Sin chequeo de unicidad de nombre ni de líder.
    let celula = state.store.add_celula(Celula {
        id: Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        lider_id: lider.id.clone(),
        lider_name: lider.name.clone(),
        miembros: Vec::new(),
        created_at: Utc::now(),
    });

    if let Err(e) = state.store.assign_celula(&lider.id, &celula.id) {
        tracing::warn!("no se pudo asignar la célula al líder: {}", e);
    }

    (StatusCode::CREATED, success_to_api_response(celula)).into_response()
}

#[axum::debug_handler]
pub async fn update_celula(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(update): Json<CelulaUpdate>,
) -> Response {
    if let Some(resp) = solo_pastor(&claims) {
        return resp;
    }

    match state.store.update_celula(&id, update) {
        Ok(celula) => (StatusCode::OK, success_to_api_response(celula)).into_response(),
        Err(e) => store_not_found(e),
    }
}

#[axum::debug_handler]
pub async fn delete_celula(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Response {
    if let Some(resp) = solo_pastor(&claims) {
        return resp;
    }

    match state.store.delete_celula(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => store_not_found(e),
    }
}

/// Alta de un líder precargado: queda sin contraseña hasta que complete
/// su registro desde /auth/register.
#[axum::debug_handler]
pub async fn create_lider(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateLiderRequest>,
) -> Response {
    if let Some(resp) = solo_pastor(&claims) {
        return resp;
    }
    if req.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response::<()>(
                error_codes::VALIDATION_ERROR,
                "el nombre es obligatorio".to_string(),
            ),
        )
            .into_response();
    }
    if !validate_email(&req.email) {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response::<()>(error_codes::VALIDATION_ERROR, "email inválido".to_string()),
        )
            .into_response();
    }
    if state.store.find_user_by_email(&req.email).is_some() {
        return (
            StatusCode::CONFLICT,
            error_to_api_response::<()>(
                error_codes::USER_EXISTS,
                "ya existe un usuario con ese email".to_string(),
            ),
        )
            .into_response();
    }

    let lider = state.store.create_user(User {
        id: Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        email: req.email,
        role: UserRole::Lider,
        celula_id: req.celula_id,
        is_registered: false,
        password_hash: None,
    });

    (StatusCode::CREATED, success_to_api_response(lider)).into_response()
}

#[axum::debug_handler]
pub async fn get_estadisticas(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<EstadisticasQuery>,
) -> Response {
    if let Some(resp) = solo_pastor(&claims) {
        return resp;
    }

    let cutoff = query.timeframe.cutoff(Utc::now());
    let recientes: Vec<AsistenciaRecord> = state
        .store
        .all_asistencias()
        .into_iter()
        .filter(|a| a.date >= cutoff)
        .collect();

    let estadisticas: Vec<_> = state
        .store
        .list_celulas()
        .iter()
        .map(|celula| compute_statistics(celula, &recientes))
        .collect();

    (StatusCode::OK, success_to_api_response(estadisticas)).into_response()
}
