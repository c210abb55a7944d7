mod memory;
pub mod model;

pub use memory::{MemoryStore, RosterState, SEED_PASSWORD};

use model::{AsistenciaRecord, Celula, CelulaUpdate, Miembro, RolMiembro};

/// Resultado explícito de las mutaciones del roster: un id inexistente
/// devuelve error y deja el estado sin tocar, en lugar de un no-op
/// silencioso.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("célula no encontrada")]
    CelulaNotFound,
    #[error("miembro no encontrado")]
    MiembroNotFound,
    #[error("colíder no encontrado")]
    ColiderNotFound,
    #[error("usuario no encontrado")]
    UserNotFound,
}

/// Fuente de verdad de las células y sus rosters.
pub trait RosterRepository {
    fn list_celulas(&self) -> Vec<Celula>;
    fn find_celula(&self, id: &str) -> Option<Celula>;
    /// Sin chequeo de unicidad de nombre ni de líder: responsabilidad del caller.
    fn add_celula(&self, celula: Celula) -> Celula;
    fn update_celula(&self, id: &str, update: CelulaUpdate) -> Result<Celula, StoreError>;
    /// No borra en cascada los registros de asistencia de la célula.
    fn delete_celula(&self, id: &str) -> Result<(), StoreError>;
    fn add_miembro(&self, celula_id: &str, miembro: Miembro) -> Result<Miembro, StoreError>;
    /// El líder principal no está en el roster, así que nunca es removible por acá.
    fn remove_miembro(&self, celula_id: &str, miembro_id: &str) -> Result<(), StoreError>;
    fn add_colider(&self, celula_id: &str, colider: Miembro) -> Result<Miembro, StoreError>;
    fn remove_colider(&self, celula_id: &str, colider_id: &str) -> Result<(), StoreError>;
    fn set_miembro_rol(
        &self,
        celula_id: &str,
        miembro_id: &str,
        rol: RolMiembro,
    ) -> Result<Miembro, StoreError>;
}

/// Historial de asistencias, append-only: no hay update ni delete.
pub trait AttendanceRepository {
    fn record_asistencia(&self, record: AsistenciaRecord) -> AsistenciaRecord;
    fn list_asistencias(&self, celula_id: &str) -> Vec<AsistenciaRecord>;
    /// Todos los registros, para reporting agregado entre células.
    fn all_asistencias(&self) -> Vec<AsistenciaRecord>;
}
