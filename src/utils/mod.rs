use axum::Json;
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::store::model::UserRole;

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // id del usuario
    pub role: UserRole, // rol con el que se emitió el token
    pub exp: i64,       // expiración
    pub iat: i64,       // emisión
}

pub fn generate_token(
    user_id: &str,
    role: UserRole,
    config: &Config,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expiration = now + Duration::seconds(config.jwt_expiration().as_secs() as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: expiration.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, config: &Config) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Validación básica de email, equivalente al chequeo del cliente:
/// `algo@dominio.tld` sin espacios ni arrobas de más.
pub fn validate_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            let local_ok = !local.is_empty() && !local.contains(char::is_whitespace);
            let domain_ok = match domain.rsplit_once('.') {
                Some((host, tld)) => {
                    !host.is_empty() && !tld.is_empty() && !domain.contains(char::is_whitespace)
                }
                None => false,
            };
            local_ok && domain_ok
        }
        _ => false,
    }
}

/// Acepta formatos como "+54 9 11 1234-5678" o "1234567890": solo
/// dígitos, espacios y +-(), con al menos 10 dígitos.
pub fn validate_phone(phone: &str) -> bool {
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || " +-()".contains(c));
    allowed && phone.chars().filter(|c| c.is_ascii_digit()).count() >= 10
}

/// Envoltura común de todas las respuestas de la API.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Código de error, 0 en éxito.
    pub code: i32,
    /// Mensaje para el usuario, "success" en éxito.
    pub msg: String,
    /// Datos de la respuesta, None en error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resp_data: Option<T>,
}

pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: 0,
        msg: "success".into(),
        resp_data: Some(data),
    })
}

pub fn error_to_api_response<T>(code: i32, msg: String) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code,
        msg,
        resp_data: None,
    })
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const USER_EXISTS: i32 = 1001;
    pub const AUTH_FAILED: i32 = 1002;
    pub const PERMISSION_DENIED: i32 = 1003;
    pub const NOT_FOUND: i32 = 1004;
    pub const INTERNAL_ERROR: i32 = 5000;
}
