use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    store::model::{User, UserRole},
    utils::{
        error_codes, error_to_api_response, generate_token, hash_password,
        success_to_api_response, validate_email, verify_password,
    },
};

use super::model::{AuthResponse, BuscarLiderQuery, LoginRequest, RegisterRequest};

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let Some(user) = state.store.find_user_by_email(&req.email) else {
        return (
            StatusCode::UNAUTHORIZED,
            error_to_api_response(error_codes::AUTH_FAILED, "usuario no encontrado".to_string()),
        );
    };

    // Los líderes precargados no tienen contraseña hasta registrarse.
    let Some(hash) = user.password_hash.as_deref() else {
        return (
            StatusCode::UNAUTHORIZED,
            error_to_api_response(
                error_codes::AUTH_FAILED,
                "el líder todavía no completó su registro".to_string(),
            ),
        );
    };

    match verify_password(&req.password, hash) {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::UNAUTHORIZED,
                error_to_api_response(
                    error_codes::AUTH_FAILED,
                    "contraseña inválida".to_string(),
                ),
            );
        }
        Err(e) => {
            tracing::error!("fallo al verificar contraseña: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "no se pudo verificar la contraseña".to_string(),
                ),
            );
        }
    }

    match generate_token(&user.id, user.role, &state.config) {
        Ok(token) => (
            StatusCode::OK,
            success_to_api_response(AuthResponse { user, token }),
        ),
        Err(e) => {
            tracing::error!("fallo al generar token: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "no se pudo generar el token".to_string(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "el nombre es obligatorio".to_string(),
            ),
        );
    }
    if !validate_email(&req.email) {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(error_codes::VALIDATION_ERROR, "email inválido".to_string()),
        );
    }
    if req.password.len() < 6 {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "la contraseña debe tener al menos 6 caracteres".to_string(),
            ),
        );
    }

    let password_hash = match hash_password(&req.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("fallo al hashear contraseña: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "no se pudo registrar el usuario".to_string(),
                ),
            );
        }
    };

    // Un líder precargado por el pastor completa su registro; un email ya
    // registrado se rechaza; cualquier otro caso crea un usuario nuevo.
    let (user, status) = match state.store.find_user_by_email(&req.email) {
        Some(existing) if !existing.is_registered => {
            match state.store.complete_registration(&existing.id, password_hash) {
                Ok(user) => (user, StatusCode::OK),
                Err(e) => {
                    return (
                        StatusCode::NOT_FOUND,
                        error_to_api_response(error_codes::NOT_FOUND, e.to_string()),
                    );
                }
            }
        }
        Some(_) => {
            return (
                StatusCode::CONFLICT,
                error_to_api_response(
                    error_codes::USER_EXISTS,
                    "ya existe un usuario con ese email".to_string(),
                ),
            );
        }
        None => {
            let user = state.store.create_user(User {
                id: Uuid::new_v4().to_string(),
                name: req.name.trim().to_string(),
                email: req.email.clone(),
                role: req.role.unwrap_or(UserRole::Lider),
                celula_id: req.celula_id,
                is_registered: true,
                password_hash: Some(password_hash),
            });
            (user, StatusCode::CREATED)
        }
    };

    match generate_token(&user.id, user.role, &state.config) {
        Ok(token) => (status, success_to_api_response(AuthResponse { user, token })),
        Err(e) => {
            tracing::error!("fallo al generar token: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "no se pudo generar el token".to_string(),
                ),
            )
        }
    }
}

/// Búsqueda de líderes precargados que todavía no se registraron. Sin
/// coincidencia devuelve éxito con dato vacío, no un error.
#[axum::debug_handler]
pub async fn buscar_lider(
    State(state): State<AppState>,
    Query(query): Query<BuscarLiderQuery>,
) -> impl IntoResponse {
    let lider = state.store.search_lider_by_nombre(&query.nombre);
    (StatusCode::OK, success_to_api_response(lider))
}
