//! Agregación de asistencia: funciones puras sobre una célula y su
//! historial, sin efectos. Los handlers de reporting son los únicos
//! consumidores.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::model::{AsistenciaRecord, Celula};

/// Porcentaje de asistencia redondeado; 0 cuando no hay denominador.
pub fn attendance_percentage(presentes: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((presentes as f64 / total as f64) * 100.0).round() as u32
}

/// Banda de display del porcentaje: >= 80 verde, >= 60 amarillo, el
/// resto rojo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceTier {
    Good,
    Warning,
    Critical,
}

impl AttendanceTier {
    pub fn from_percentage(percentage: u32) -> Self {
        if percentage >= 80 {
            AttendanceTier::Good
        } else if percentage >= 60 {
            AttendanceTier::Warning
        } else {
            AttendanceTier::Critical
        }
    }
}

/// Ventana de reporte del dashboard del pastor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    #[default]
    Semanal,
    Mensual,
    Anual,
}

impl Timeframe {
    pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let window = match self {
            Timeframe::Semanal => Duration::days(7),
            Timeframe::Mensual => Duration::days(30),
            Timeframe::Anual => Duration::days(365),
        };
        now - window
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Estadistica {
    pub celula_id: String,
    pub celula_nombre: String,
    pub lider_nombre: String,
    pub total_miembros: usize,
    pub cantidad_asistencias: usize,
    pub promedio_asistencia: u32,
    pub nivel: AttendanceTier,
}

/// Estadísticas de una célula sobre los registros que le pertenecen.
///
/// El denominador del promedio es la cantidad de miembros que tenía la
/// célula al momento de cada registro (`total_presentes +
/// total_ausentes`), no el tamaño actual del roster, así el promedio
/// sigue siendo correcto aunque el roster cambie entre reuniones. Sin
/// registros, o sin miembros esperados, el promedio es 0 y nunca NaN.
pub fn compute_statistics(celula: &Celula, asistencias: &[AsistenciaRecord]) -> Estadistica {
    let registros: Vec<&AsistenciaRecord> = asistencias
        .iter()
        .filter(|a| a.celula_id == celula.id)
        .collect();

    let total_presentes: u32 = registros.iter().map(|a| a.total_presentes).sum();
    let total_esperados: u32 = registros
        .iter()
        .map(|a| a.total_presentes + a.total_ausentes)
        .sum();
    // Una célula sin miembros promedia 0 aunque conserve registros
    // históricos con presentes.
    let promedio_asistencia = if celula.miembros.is_empty() {
        0
    } else {
        attendance_percentage(total_presentes, total_esperados)
    };

    Estadistica {
        celula_id: celula.id.clone(),
        celula_nombre: celula.name.clone(),
        lider_nombre: celula.lider_name.clone(),
        total_miembros: celula.miembros.len(),
        cantidad_asistencias: registros.len(),
        promedio_asistencia,
        nivel: AttendanceTier::from_percentage(promedio_asistencia),
    }
}

/// Construye un registro de asistencia a partir de los presentes: los
/// ausentes son el complemento dentro del roster actual, y los totales
/// se derivan de ambos conjuntos. Ids desconocidos o repetidos en
/// `presentes` se descartan, así presentes y ausentes siempre
/// particionan el roster.
pub fn build_asistencia(
    celula: &Celula,
    date: DateTime<Utc>,
    presentes: &[String],
    registrado_por: &str,
) -> AsistenciaRecord {
    let mut miembros_presentes: Vec<String> = Vec::new();
    for miembro in &celula.miembros {
        if presentes.iter().any(|id| *id == miembro.id) {
            miembros_presentes.push(miembro.id.clone());
        }
    }
    let miembros_ausentes: Vec<String> = celula
        .miembros
        .iter()
        .filter(|m| !miembros_presentes.contains(&m.id))
        .map(|m| m.id.clone())
        .collect();

    AsistenciaRecord {
        id: Uuid::new_v4().to_string(),
        celula_id: celula.id.clone(),
        date,
        total_presentes: miembros_presentes.len() as u32,
        total_ausentes: miembros_ausentes.len() as u32,
        miembros_presentes,
        miembros_ausentes,
        registrado_por: registrado_por.to_string(),
    }
}
