use serde::{Deserialize, Serialize};

use crate::store::model::{User, UserRole};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Por defecto se registra un líder.
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub celula_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct BuscarLiderQuery {
    pub nombre: String,
}
