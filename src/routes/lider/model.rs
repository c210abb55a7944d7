use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::store::model::RolMiembro;

#[derive(Debug, Deserialize)]
pub struct AddMiembroRequest {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Sin rol explícito, un recién agregado entra como "nuevo".
    #[serde(default, rename = "rolCelula")]
    pub rol_celula: Option<RolMiembro>,
}

#[derive(Debug, Deserialize)]
pub struct AddColiderRequest {
    pub name: String,
    pub email: String,
}

/// El rol destino es el enum de tres valores: "lider" no es
/// representable y se rechaza en la deserialización.
#[derive(Debug, Deserialize)]
pub struct SetRolRequest {
    #[serde(rename = "rolCelula")]
    pub rol_celula: RolMiembro,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrarAsistenciaRequest {
    pub celula_id: String,
    /// Fecha de la reunión; por defecto el momento del registro.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub miembros_presentes: Vec<String>,
}
