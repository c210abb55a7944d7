use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rol global de un usuario del sistema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Pastor,
    Lider,
    Colider,
}

/// Rol de un miembro dentro de su célula. El líder principal no es un
/// miembro, por lo que "lider" no es un valor representable acá.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RolMiembro {
    Nuevo,
    Miembro,
    Colider,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub celula_id: Option<String>,
    pub is_registered: bool,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Miembro {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub rol_celula: RolMiembro,
    pub added_at: DateTime<Utc>,
}

/// Una célula con su líder principal y su roster. Los colíderes son
/// miembros con `rol_celula == Colider`, no una colección aparte.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Celula {
    pub id: String,
    pub name: String,
    pub lider_id: String,
    pub lider_name: String,
    pub miembros: Vec<Miembro>,
    pub created_at: DateTime<Utc>,
}

impl Celula {
    pub fn find_miembro(&self, miembro_id: &str) -> Option<&Miembro> {
        self.miembros.iter().find(|m| m.id == miembro_id)
    }

    pub fn colideres(&self) -> impl Iterator<Item = &Miembro> {
        self.miembros
            .iter()
            .filter(|m| m.rol_celula == RolMiembro::Colider)
    }
}

/// Registro de asistencia de una reunión. Los totales se derivan de los
/// conjuntos de presentes/ausentes, nunca se setean por separado.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsistenciaRecord {
    pub id: String,
    pub celula_id: String,
    pub date: DateTime<Utc>,
    pub miembros_presentes: Vec<String>,
    pub miembros_ausentes: Vec<String>,
    pub total_presentes: u32,
    pub total_ausentes: u32,
    pub registrado_por: String,
}

/// Campos opcionales para actualizar una célula; los `None` se ignoran.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CelulaUpdate {
    pub name: Option<String>,
    pub lider_id: Option<String>,
    pub lider_name: Option<String>,
}
