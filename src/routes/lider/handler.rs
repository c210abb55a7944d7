use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    AppState,
    stats::build_asistencia,
    store::model::{Celula, Miembro, RolMiembro, User, UserRole},
    store::{AttendanceRepository, RosterRepository},
    utils::{
        Claims, error_codes, error_to_api_response, success_to_api_response, validate_email,
        validate_phone,
    },
};

use super::model::{
    AddColiderRequest, AddMiembroRequest, RegistrarAsistenciaRequest, SetRolRequest,
};

fn forbidden(msg: &str) -> Response {
    (
        StatusCode::FORBIDDEN,
        error_to_api_response::<()>(error_codes::PERMISSION_DENIED, msg.to_string()),
    )
        .into_response()
}

fn not_found(msg: String) -> Response {
    (
        StatusCode::NOT_FOUND,
        error_to_api_response::<()>(error_codes::NOT_FOUND, msg),
    )
        .into_response()
}

fn bad_request(msg: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        error_to_api_response::<()>(error_codes::VALIDATION_ERROR, msg.to_string()),
    )
        .into_response()
}

/// Resuelve al usuario autenticado y la célula del path, verificando que
/// sea la suya. El pastor tiene sus propias rutas y no pasa por acá.
fn celula_autorizada(
    state: &AppState,
    claims: &Claims,
    celula_id: &str,
) -> Result<(User, Celula), Response> {
    if claims.role == UserRole::Pastor {
        return Err(forbidden("las rutas de líder no aplican al pastor"));
    }
    let Some(user) = state.store.find_user_by_id(&claims.sub) else {
        return Err((
            StatusCode::UNAUTHORIZED,
            error_to_api_response::<()>(
                error_codes::AUTH_FAILED,
                "el usuario del token ya no existe".to_string(),
            ),
        )
            .into_response());
    };
    let Some(celula) = state.store.find_celula(celula_id) else {
        return Err(not_found("célula no encontrada".to_string()));
    };
    let propia = user.celula_id.as_deref() == Some(celula_id) || celula.lider_id == user.id;
    if !propia {
        return Err(forbidden("no podés operar sobre otra célula"));
    }
    Ok((user, celula))
}

#[axum::debug_handler]
pub async fn mi_celula(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    if claims.role == UserRole::Pastor {
        return forbidden("las rutas de líder no aplican al pastor");
    }
    let Some(user) = state.store.find_user_by_id(&claims.sub) else {
        return not_found("usuario no encontrado".to_string());
    };
    let celula = user
        .celula_id
        .as_deref()
        .and_then(|id| state.store.find_celula(id));

    match celula {
        Some(celula) => (StatusCode::OK, success_to_api_response(celula)).into_response(),
        None => not_found("no tenés una célula asignada".to_string()),
    }
}

#[axum::debug_handler]
pub async fn add_miembro(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(celula_id): Path<String>,
    Json(req): Json<AddMiembroRequest>,
) -> Response {
    if let Err(resp) = celula_autorizada(&state, &claims, &celula_id) {
        return resp;
    }
    if req.name.trim().is_empty() {
        return bad_request("el nombre es obligatorio");
    }
    if let Some(phone) = req.phone.as_deref() {
        if !validate_phone(phone) {
            return bad_request("teléfono inválido");
        }
    }
    if let Some(email) = req.email.as_deref() {
        if !validate_email(email) {
            return bad_request("email inválido");
        }
    }

    let miembro = Miembro {
        id: Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        phone: req.phone,
        email: req.email,
        rol_celula: req.rol_celula.unwrap_or(RolMiembro::Nuevo),
        added_at: Utc::now(),
    };

    match state.store.add_miembro(&celula_id, miembro) {
        Ok(miembro) => (StatusCode::CREATED, success_to_api_response(miembro)).into_response(),
        Err(e) => not_found(e.to_string()),
    }
}

#[axum::debug_handler]
pub async fn remove_miembro(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((celula_id, miembro_id)): Path<(String, String)>,
) -> Response {
    if let Err(resp) = celula_autorizada(&state, &claims, &celula_id) {
        return resp;
    }

    match state.store.remove_miembro(&celula_id, &miembro_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => not_found(e.to_string()),
    }
}

#[axum::debug_handler]
pub async fn set_miembro_rol(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((celula_id, miembro_id)): Path<(String, String)>,
    Json(req): Json<SetRolRequest>,
) -> Response {
    if let Err(resp) = celula_autorizada(&state, &claims, &celula_id) {
        return resp;
    }

    match state
        .store
        .set_miembro_rol(&celula_id, &miembro_id, req.rol_celula)
    {
        Ok(miembro) => (StatusCode::OK, success_to_api_response(miembro)).into_response(),
        Err(e) => not_found(e.to_string()),
    }
}

#[axum::debug_handler]
pub async fn add_colider(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(celula_id): Path<String>,
    Json(req): Json<AddColiderRequest>,
) -> Response {
    let (user, _) = match celula_autorizada(&state, &claims, &celula_id) {
        Ok(ok) => ok,
        Err(resp) => return resp,
    };
    // El conjunto de colíderes lo administra solo el líder principal.
    if user.role != UserRole::Lider {
        return forbidden("solo el líder puede administrar colíderes");
    }
    if req.name.trim().is_empty() {
        return bad_request("el nombre es obligatorio");
    }
    if !validate_email(&req.email) {
        return bad_request("email inválido");
    }

    let colider = Miembro {
        id: Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        phone: None,
        email: Some(req.email),
        rol_celula: RolMiembro::Colider,
        added_at: Utc::now(),
    };

    match state.store.add_colider(&celula_id, colider) {
        Ok(colider) => (StatusCode::CREATED, success_to_api_response(colider)).into_response(),
        Err(e) => not_found(e.to_string()),
    }
}

#[axum::debug_handler]
pub async fn remove_colider(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((celula_id, colider_id)): Path<(String, String)>,
) -> Response {
    let (user, _) = match celula_autorizada(&state, &claims, &celula_id) {
        Ok(ok) => ok,
        Err(resp) => return resp,
    };
    if user.role != UserRole::Lider {
        return forbidden("solo el líder puede administrar colíderes");
    }

    match state.store.remove_colider(&celula_id, &colider_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => not_found(e.to_string()),
    }
}

#[axum::debug_handler]
pub async fn registrar_asistencia(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RegistrarAsistenciaRequest>,
) -> Response {
    let (_, celula) = match celula_autorizada(&state, &claims, &req.celula_id) {
        Ok(ok) => ok,
        Err(resp) => return resp,
    };

    let record = build_asistencia(
        &celula,
        req.date.unwrap_or_else(Utc::now),
        &req.miembros_presentes,
        &claims.sub,
    );
    let record = state.store.record_asistencia(record);

    (StatusCode::CREATED, success_to_api_response(record)).into_response()
}

#[axum::debug_handler]
pub async fn get_asistencias(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(celula_id): Path<String>,
) -> Response {
    if let Err(resp) = celula_autorizada(&state, &claims, &celula_id) {
        return resp;
    }

    (
        StatusCode::OK,
        success_to_api_response(state.store.list_asistencias(&celula_id)),
    )
        .into_response()
}
