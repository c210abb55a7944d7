use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use celulas_backend::{
    AppState,
    config::Config,
    router,
    store::{MemoryStore, SEED_PASSWORD},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn test_app() -> Router {
    let state = AppState {
        store: Arc::new(MemoryStore::seeded()),
        config: Config {
            server_host: "127.0.0.1".into(),
            server_port: 0,
            api_base_uri: "/api".into(),
            jwt_secret: "secreto-de-prueba".into(),
            jwt_expiration_secs: 3600,
        },
    };
    router::app(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    // Los rechazos del extractor de axum (p.ej. 422 por un enum
    // inválido) llegan como texto plano, no como JSON.
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

async fn login(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": SEED_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login de {email} falló: {body}");
    body["resp_data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn login_devuelve_usuario_y_token() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "pastor@renacer.com", "password": SEED_PASSWORD })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    assert_eq!(body["resp_data"]["user"]["role"], "pastor");
    assert!(body["resp_data"]["token"].as_str().is_some());
    // El hash nunca sale por el wire.
    assert!(body["resp_data"]["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn login_con_credenciales_invalidas() {
    let app = test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "pastor@renacer.com", "password": "incorrecta" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "nadie@renacer.com", "password": "loquesea" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // María está precargada pero todavía no se registró.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "maria@renacer.com", "password": SEED_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn las_rutas_protegidas_requieren_token() {
    let app = test_app();

    let (status, body) = send(&app, "GET", "/api/pastor/celulas", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);

    let (status, _) = send(&app, "GET", "/api/lider/mi-celula", Some("basura"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn un_lider_no_accede_a_rutas_de_pastor_ni_al_reves() {
    let app = test_app();
    let lider = login(&app, "juan@renacer.com").await;
    let pastor = login(&app, "pastor@renacer.com").await;

    let (status, body) = send(&app, "GET", "/api/pastor/celulas", Some(&lider), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 1003);

    let (status, _) = send(&app, "GET", "/api/lider/mi-celula", Some(&pastor), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn el_pastor_lista_y_administra_celulas() {
    let app = test_app();
    let pastor = login(&app, "pastor@renacer.com").await;

    let (status, body) = send(&app, "GET", "/api/pastor/celulas", Some(&pastor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resp_data"].as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        "PUT",
        "/api/pastor/celulas/2",
        Some(&pastor),
        Some(json!({ "name": "Célula Matrimonios" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resp_data"]["name"], "Célula Matrimonios");
    assert_eq!(body["resp_data"]["liderName"], "María González");

    let (status, _) = send(&app, "DELETE", "/api/pastor/celulas/2", Some(&pastor), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "DELETE", "/api/pastor/celulas/2", Some(&pastor), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn alta_de_lider_precargado_y_celula_nueva() {
    let app = test_app();
    let pastor = login(&app, "pastor@renacer.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/pastor/lideres",
        Some(&pastor),
        Some(json!({ "name": "Carla Díaz", "email": "carla@renacer.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["resp_data"]["isRegistered"], false);
    let lider_id = body["resp_data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/api/pastor/celulas",
        Some(&pastor),
        Some(json!({ "name": "Célula Norte", "liderId": lider_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["resp_data"]["liderName"], "Carla Díaz");
    assert_eq!(body["resp_data"]["miembros"].as_array().unwrap().len(), 0);

    // Email repetido se rechaza.
    let (status, body) = send(
        &app,
        "POST",
        "/api/pastor/lideres",
        Some(&pastor),
        Some(json!({ "name": "Otra", "email": "carla@renacer.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 1001);
}

#[tokio::test]
async fn registro_nuevo_y_completado_de_precargado() {
    let app = test_app();

    // Contraseña corta.
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": "X", "email": "x@renacer.com", "password": "corta" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 1000);

    // Un registro nuevo crea un líder y devuelve token.
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": "Lucas Vera", "email": "lucas@renacer.com", "password": "lucas-seguro" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["resp_data"]["user"]["role"], "lider");
    assert!(body["resp_data"]["token"].as_str().is_some());

    // La búsqueda de precargados encuentra a María.
    let (status, body) = send(&app, "GET", "/api/auth/buscar-lider?nombre=mar", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resp_data"]["name"], "María González");

    let (status, body) = send(
        &app,
        "GET",
        "/api/auth/buscar-lider?nombre=inexistente",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["resp_data"].is_null());

    // María completa su registro y ya puede loguearse.
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "name": "María González",
            "email": "maria@renacer.com",
            "password": "maria-segura"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resp_data"]["user"]["isRegistered"], true);
    assert_eq!(body["resp_data"]["user"]["celulaId"], "2");

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "maria@renacer.com", "password": "maria-segura" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Un email ya registrado no puede registrarse de nuevo.
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": "Juan", "email": "juan@renacer.com", "password": "otravez123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 1001);
}

#[tokio::test]
async fn roster_de_mi_celula_y_altas_y_bajas_de_miembros() {
    let app = test_app();
    let lider = login(&app, "juan@renacer.com").await;

    let (status, body) = send(&app, "GET", "/api/lider/mi-celula", Some(&lider), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resp_data"]["name"], "Célula Jóvenes");
    assert_eq!(body["resp_data"]["miembros"].as_array().unwrap().len(), 4);

    // Alta con rol por defecto "nuevo".
    let (status, body) = send(
        &app,
        "POST",
        "/api/lider/celulas/1/miembros",
        Some(&lider),
        Some(json!({ "name": "Diego Torres", "phone": "1122334455" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["resp_data"]["rolCelula"], "nuevo");
    let miembro_id = body["resp_data"]["id"].as_str().unwrap().to_string();

    // Teléfono inválido.
    let (status, _) = send(
        &app,
        "POST",
        "/api/lider/celulas/1/miembros",
        Some(&lider),
        Some(json!({ "name": "Mal Teléfono", "phone": "123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Promoción nuevo -> colider y vuelta a miembro.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/lider/celulas/1/miembros/{miembro_id}/rol"),
        Some(&lider),
        Some(json!({ "rolCelula": "colider" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resp_data"]["rolCelula"], "colider");

    // "lider" no es un rol de miembro representable.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/lider/celulas/1/miembros/{miembro_id}/rol"),
        Some(&lider),
        Some(json!({ "rolCelula": "lider" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Baja y re-baja.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/lider/celulas/1/miembros/{miembro_id}"),
        Some(&lider),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/lider/celulas/1/miembros/{miembro_id}"),
        Some(&lider),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 1004);

    // El líder principal no está en el roster: no hay nada que borrar.
    let (status, _) = send(
        &app,
        "DELETE",
        "/api/lider/celulas/1/miembros/2",
        Some(&lider),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Otra célula ajena queda fuera del alcance del líder.
    let (status, _) = send(
        &app,
        "POST",
        "/api/lider/celulas/2/miembros",
        Some(&lider),
        Some(json!({ "name": "Intruso" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn colideres_alta_y_baja_simetricas() {
    let app = test_app();
    let lider = login(&app, "juan@renacer.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/lider/celulas/1/colideres",
        Some(&lider),
        Some(json!({ "name": "Beto Gómez", "email": "beto@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["resp_data"]["rolCelula"], "colider");
    let colider_id = body["resp_data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/lider/celulas/1/colideres/{colider_id}"),
        Some(&lider),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Id desconocido: no-op con error explícito.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/lider/celulas/1/colideres/{colider_id}"),
        Some(&lider),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn asistencia_y_estadisticas_de_punta_a_punta() {
    let app = test_app();
    let lider = login(&app, "juan@renacer.com").await;
    let pastor = login(&app, "pastor@renacer.com").await;

    // Célula Jóvenes tiene 4 en el roster; asisten 3.
    let (status, body) = send(
        &app,
        "POST",
        "/api/lider/asistencia",
        Some(&lider),
        Some(json!({
            "celulaId": "1",
            "miembrosPresentes": ["c1", "m1", "m2"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["resp_data"]["totalPresentes"], 3);
    assert_eq!(body["resp_data"]["totalAusentes"], 1);
    assert_eq!(body["resp_data"]["miembrosAusentes"], json!(["m3"]));
    assert_eq!(body["resp_data"]["registradoPor"], "2");

    let (status, body) = send(
        &app,
        "GET",
        "/api/lider/celulas/1/asistencias",
        Some(&lider),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resp_data"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        "GET",
        "/api/pastor/estadisticas?timeframe=semanal",
        Some(&pastor),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let estadisticas = body["resp_data"].as_array().unwrap();
    assert_eq!(estadisticas.len(), 2);

    let jovenes = estadisticas
        .iter()
        .find(|e| e["celulaId"] == "1")
        .unwrap();
    assert_eq!(jovenes["totalMiembros"], 4);
    assert_eq!(jovenes["cantidadAsistencias"], 1);
    assert_eq!(jovenes["promedioAsistencia"], 75);
    assert_eq!(jovenes["nivel"], "warning");

    // Sin registros, la otra célula promedia 0 y queda en crítico.
    let familias = estadisticas
        .iter()
        .find(|e| e["celulaId"] == "2")
        .unwrap();
    assert_eq!(familias["cantidadAsistencias"], 0);
    assert_eq!(familias["promedioAsistencia"], 0);
    assert_eq!(familias["nivel"], "critical");
}
