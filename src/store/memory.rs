use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::utils::hash_password;

use super::model::{
    AsistenciaRecord, Celula, CelulaUpdate, Miembro, RolMiembro, User, UserRole,
};
use super::{AttendanceRepository, RosterRepository, StoreError};

/// Contraseña de los usuarios registrados del seed de desarrollo.
pub const SEED_PASSWORD: &str = "renacer123";

/// Estado completo del backend en memoria. Se persiste recién cuando
/// haya una base de datos real; por ahora se pierde al reiniciar.
#[derive(Debug, Clone, Default)]
pub struct RosterState {
    pub celulas: Vec<Celula>,
    pub asistencias: Vec<AsistenciaRecord>,
    pub users: Vec<User>,
}

/// Store en memoria con semántica de snapshot: cada mutación clona el
/// estado, lo modifica y publica un `Arc` nuevo. Los observadores pueden
/// detectar cambios comparando snapshots con `Arc::ptr_eq`. Una mutación
/// que falla no publica nada y el snapshot vigente queda intacto.
pub struct MemoryStore {
    inner: RwLock<Arc<RosterState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Arc::new(RosterState::default())),
        }
    }

    /// Store precargado con los datos de desarrollo: un pastor,
    /// dos líderes (uno aún sin registrar) y sus dos células.
    pub fn seeded() -> Self {
        let store = Self::new();
        let seed_hash = hash_password(SEED_PASSWORD).ok();
        let now = Utc::now();

        store.mutate(|state| {
            state.users = vec![
                User {
                    id: "1".into(),
                    name: "Pastor Principal".into(),
                    email: "pastor@renacer.com".into(),
                    role: UserRole::Pastor,
                    celula_id: None,
                    is_registered: true,
                    password_hash: seed_hash.clone(),
                },
                User {
                    id: "2".into(),
                    name: "Juan Pérez".into(),
                    email: "juan@renacer.com".into(),
                    role: UserRole::Lider,
                    celula_id: Some("1".into()),
                    is_registered: true,
                    password_hash: seed_hash.clone(),
                },
                User {
                    id: "3".into(),
                    name: "María González".into(),
                    email: "maria@renacer.com".into(),
                    role: UserRole::Lider,
                    celula_id: Some("2".into()),
                    is_registered: false,
                    password_hash: None,
                },
            ];

            state.celulas = vec![
                Celula {
                    id: "1".into(),
                    name: "Célula Jóvenes".into(),
                    lider_id: "2".into(),
                    lider_name: "Juan Pérez".into(),
                    miembros: vec![
                        seed_miembro("c1", "Ana López", None, Some("ana@example.com"), RolMiembro::Colider),
                        seed_miembro("m1", "María García", Some("123456789"), Some("maria@example.com"), RolMiembro::Miembro),
                        seed_miembro("m2", "Pedro López", Some("987654321"), Some("pedro@example.com"), RolMiembro::Miembro),
                        seed_miembro("m3", "Laura Martínez", Some("456789123"), Some("laura@example.com"), RolMiembro::Miembro),
                    ],
                    created_at: now,
                },
                Celula {
                    id: "2".into(),
                    name: "Célula Familias".into(),
                    lider_id: "3".into(),
                    lider_name: "María González".into(),
                    miembros: vec![
                        seed_miembro("m4", "Carlos Rodríguez", Some("789456123"), Some("carlos@example.com"), RolMiembro::Miembro),
                        seed_miembro("m5", "Sofía Fernández", Some("321654987"), Some("sofia@example.com"), RolMiembro::Nuevo),
                    ],
                    created_at: now,
                },
            ];
        });

        store
    }

    /// Snapshot inmutable del estado actual.
    pub fn snapshot(&self) -> Arc<RosterState> {
        Arc::clone(&self.read())
    }

    fn read(&self) -> RwLockReadGuard<'_, Arc<RosterState>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Arc<RosterState>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Mutación infalible: siempre publica un snapshot nuevo.
    fn mutate<T>(&self, f: impl FnOnce(&mut RosterState) -> T) -> T {
        let mut guard = self.write();
        let mut next = RosterState::clone(&guard);
        let out = f(&mut next);
        *guard = Arc::new(next);
        out
    }

    /// Mutación falible: publica el snapshot nuevo solo si la clausura
    /// devuelve `Ok`.
    fn try_mutate<T>(
        &self,
        f: impl FnOnce(&mut RosterState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.write();
        let mut next = RosterState::clone(&guard);
        let out = f(&mut next)?;
        *guard = Arc::new(next);
        Ok(out)
    }

    // --- directorio de usuarios ---

    pub fn find_user_by_id(&self, user_id: &str) -> Option<User> {
        self.read().users.iter().find(|u| u.id == user_id).cloned()
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.read()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    /// Busca un líder precargado (aún sin registrar) por nombre, con
    /// coincidencia parcial e insensible a mayúsculas.
    pub fn search_lider_by_nombre(&self, nombre: &str) -> Option<User> {
        let needle = nombre.to_lowercase();
        self.read()
            .users
            .iter()
            .find(|u| {
                u.role == UserRole::Lider
                    && !u.is_registered
                    && u.name.to_lowercase().contains(&needle)
            })
            .cloned()
    }

    pub fn create_user(&self, user: User) -> User {
        self.mutate(|state| {
            state.users.push(user.clone());
            user
        })
    }

    /// Completa el registro de un líder precargado: guarda el hash de la
    /// contraseña y marca `is_registered`.
    pub fn complete_registration(
        &self,
        user_id: &str,
        password_hash: String,
    ) -> Result<User, StoreError> {
        self.try_mutate(|state| {
            let user = state
                .users
                .iter_mut()
                .find(|u| u.id == user_id)
                .ok_or(StoreError::UserNotFound)?;
            user.password_hash = Some(password_hash);
            user.is_registered = true;
            Ok(user.clone())
        })
    }

    pub fn assign_celula(&self, user_id: &str, celula_id: &str) -> Result<User, StoreError> {
        self.try_mutate(|state| {
            let user = state
                .users
                .iter_mut()
                .find(|u| u.id == user_id)
                .ok_or(StoreError::UserNotFound)?;
            user.celula_id = Some(celula_id.to_string());
            Ok(user.clone())
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn seed_miembro(
    id: &str,
    name: &str,
    phone: Option<&str>,
    email: Option<&str>,
    rol: RolMiembro,
) -> Miembro {
    Miembro {
        id: id.into(),
        name: name.into(),
        phone: phone.map(Into::into),
        email: email.map(Into::into),
        rol_celula: rol,
        added_at: Utc::now(),
    }
}

fn celula_mut<'a>(
    state: &'a mut RosterState,
    celula_id: &str,
) -> Result<&'a mut Celula, StoreError> {
    state
        .celulas
        .iter_mut()
        .find(|c| c.id == celula_id)
        .ok_or(StoreError::CelulaNotFound)
}

impl RosterRepository for MemoryStore {
    fn list_celulas(&self) -> Vec<Celula> {
        self.read().celulas.clone()
    }

    fn find_celula(&self, id: &str) -> Option<Celula> {
        self.read().celulas.iter().find(|c| c.id == id).cloned()
    }

    fn add_celula(&self, celula: Celula) -> Celula {
        self.mutate(|state| {
            state.celulas.push(celula.clone());
            celula
        })
    }

    fn update_celula(&self, id: &str, update: CelulaUpdate) -> Result<Celula, StoreError> {
        self.try_mutate(|state| {
            let celula = celula_mut(state, id)?;
            if let Some(name) = update.name {
                celula.name = name;
            }
            if let Some(lider_id) = update.lider_id {
                celula.lider_id = lider_id;
            }
            if let Some(lider_name) = update.lider_name {
                celula.lider_name = lider_name;
            }
            Ok(celula.clone())
        })
    }

    fn delete_celula(&self, id: &str) -> Result<(), StoreError> {
        self.try_mutate(|state| {
            let before = state.celulas.len();
            state.celulas.retain(|c| c.id != id);
            if state.celulas.len() == before {
                return Err(StoreError::CelulaNotFound);
            }
            // Las asistencias de la célula quedan huérfanas a propósito.
            Ok(())
        })
    }

    fn add_miembro(&self, celula_id: &str, miembro: Miembro) -> Result<Miembro, StoreError> {
        self.try_mutate(|state| {
            let celula = celula_mut(state, celula_id)?;
            celula.miembros.push(miembro.clone());
            Ok(miembro)
        })
    }

    fn remove_miembro(&self, celula_id: &str, miembro_id: &str) -> Result<(), StoreError> {
        self.try_mutate(|state| {
            let celula = celula_mut(state, celula_id)?;
            let before = celula.miembros.len();
            celula.miembros.retain(|m| m.id != miembro_id);
            if celula.miembros.len() == before {
                return Err(StoreError::MiembroNotFound);
            }
            Ok(())
        })
    }

    fn add_colider(&self, celula_id: &str, colider: Miembro) -> Result<Miembro, StoreError> {
        let colider = Miembro {
            rol_celula: RolMiembro::Colider,
            ..colider
        };
        self.add_miembro(celula_id, colider)
    }

    fn remove_colider(&self, celula_id: &str, colider_id: &str) -> Result<(), StoreError> {
        self.try_mutate(|state| {
            let celula = celula_mut(state, celula_id)?;
            let before = celula.miembros.len();
            celula
                .miembros
                .retain(|m| !(m.id == colider_id && m.rol_celula == RolMiembro::Colider));
            if celula.miembros.len() == before {
                return Err(StoreError::ColiderNotFound);
            }
            Ok(())
        })
    }

    fn set_miembro_rol(
        &self,
        celula_id: &str,
        miembro_id: &str,
        rol: RolMiembro,
    ) -> Result<Miembro, StoreError> {
        self.try_mutate(|state| {
            let celula = celula_mut(state, celula_id)?;
            let miembro = celula
                .miembros
                .iter_mut()
                .find(|m| m.id == miembro_id)
                .ok_or(StoreError::MiembroNotFound)?;
            miembro.rol_celula = rol;
            Ok(miembro.clone())
        })
    }
}

impl AttendanceRepository for MemoryStore {
    fn record_asistencia(&self, record: AsistenciaRecord) -> AsistenciaRecord {
        self.mutate(|state| {
            state.asistencias.push(record.clone());
            record
        })
    }

    fn list_asistencias(&self, celula_id: &str) -> Vec<AsistenciaRecord> {
        self.read()
            .asistencias
            .iter()
            .filter(|a| a.celula_id == celula_id)
            .cloned()
            .collect()
    }

    fn all_asistencias(&self) -> Vec<AsistenciaRecord> {
        self.read().asistencias.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn miembro(id: &str, rol: RolMiembro) -> Miembro {
        seed_miembro(id, id, None, None, rol)
    }

    fn celula_de_prueba() -> Celula {
        Celula {
            id: "c-test".into(),
            name: "Célula Prueba".into(),
            lider_id: "lider-1".into(),
            lider_name: "Líder Prueba".into(),
            miembros: vec![
                miembro("m-1", RolMiembro::Nuevo),
                miembro("m-2", RolMiembro::Miembro),
            ],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn remove_miembro_quita_el_id_del_roster() {
        let store = MemoryStore::new();
        store.add_celula(celula_de_prueba());

        store.remove_miembro("c-test", "m-1").unwrap();

        let celula = store.find_celula("c-test").unwrap();
        assert!(celula.find_miembro("m-1").is_none());
        assert_eq!(celula.miembros.len(), 1);
    }

    #[test]
    fn el_lider_principal_no_es_removible_del_roster() {
        let store = MemoryStore::new();
        store.add_celula(celula_de_prueba());

        // El líder vive fuera del roster: removerlo por id falla siempre.
        assert_eq!(
            store.remove_miembro("c-test", "lider-1"),
            Err(StoreError::MiembroNotFound)
        );
        assert_eq!(store.find_celula("c-test").unwrap().miembros.len(), 2);
    }

    #[test]
    fn set_miembro_rol_promueve_y_degrada() {
        let store = MemoryStore::new();
        store.add_celula(celula_de_prueba());

        let promovido = store
            .set_miembro_rol("c-test", "m-1", RolMiembro::Colider)
            .unwrap();
        assert_eq!(promovido.rol_celula, RolMiembro::Colider);

        let degradado = store
            .set_miembro_rol("c-test", "m-1", RolMiembro::Miembro)
            .unwrap();
        assert_eq!(degradado.rol_celula, RolMiembro::Miembro);

        assert_eq!(
            store.set_miembro_rol("c-test", "nadie", RolMiembro::Nuevo),
            Err(StoreError::MiembroNotFound)
        );
    }

    #[test]
    fn colider_agregar_y_remover_vuelve_al_tamano_previo() {
        let store = MemoryStore::new();
        store.add_celula(celula_de_prueba());

        let antes = store.find_celula("c-test").unwrap().colideres().count();

        // add_colider fuerza el rol aunque el caller mande otro.
        store
            .add_colider("c-test", miembro("co-1", RolMiembro::Nuevo))
            .unwrap();
        assert_eq!(
            store.find_celula("c-test").unwrap().colideres().count(),
            antes + 1
        );

        store.remove_colider("c-test", "co-1").unwrap();
        assert_eq!(
            store.find_celula("c-test").unwrap().colideres().count(),
            antes
        );

        // Remover un id desconocido falla y no toca el conjunto.
        assert_eq!(
            store.remove_colider("c-test", "co-1"),
            Err(StoreError::ColiderNotFound)
        );
        assert_eq!(
            store.find_celula("c-test").unwrap().colideres().count(),
            antes
        );
    }

    #[test]
    fn remove_colider_no_remueve_miembros_comunes() {
        let store = MemoryStore::new();
        store.add_celula(celula_de_prueba());

        assert_eq!(
            store.remove_colider("c-test", "m-2"),
            Err(StoreError::ColiderNotFound)
        );
        assert!(store.find_celula("c-test").unwrap().find_miembro("m-2").is_some());
    }

    #[test]
    fn las_mutaciones_publican_un_snapshot_nuevo() {
        let store = MemoryStore::new();
        let antes = store.snapshot();

        store.add_celula(celula_de_prueba());
        let despues = store.snapshot();
        assert!(!Arc::ptr_eq(&antes, &despues));

        // Una mutación fallida no publica snapshot.
        assert!(store.remove_miembro("no-existe", "m-1").is_err());
        assert!(Arc::ptr_eq(&despues, &store.snapshot()));
    }

    #[test]
    fn delete_celula_deja_asistencias_huerfanas() {
        let store = MemoryStore::new();
        store.add_celula(celula_de_prueba());
        store.record_asistencia(AsistenciaRecord {
            id: "a-1".into(),
            celula_id: "c-test".into(),
            date: Utc::now(),
            miembros_presentes: vec!["m-1".into()],
            miembros_ausentes: vec!["m-2".into()],
            total_presentes: 1,
            total_ausentes: 1,
            registrado_por: "lider-1".into(),
        });

        store.delete_celula("c-test").unwrap();

        assert!(store.find_celula("c-test").is_none());
        assert_eq!(store.list_asistencias("c-test").len(), 1);
        assert_eq!(store.all_asistencias().len(), 1);
    }

    #[test]
    fn update_celula_mergea_solo_los_campos_presentes() {
        let store = MemoryStore::new();
        store.add_celula(celula_de_prueba());

        let actualizada = store
            .update_celula(
                "c-test",
                CelulaUpdate {
                    name: Some("Célula Renombrada".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(actualizada.name, "Célula Renombrada");
        assert_eq!(actualizada.lider_id, "lider-1");
        assert_eq!(actualizada.miembros.len(), 2);
    }

    #[test]
    fn registro_de_lider_precargado() {
        let store = MemoryStore::seeded();

        let maria = store.search_lider_by_nombre("maría").unwrap();
        assert!(!maria.is_registered);

        let registrada = store
            .complete_registration(&maria.id, "hash".into())
            .unwrap();
        assert!(registrada.is_registered);

        // Ya registrada, la búsqueda de precargados no la devuelve más.
        assert!(store.search_lider_by_nombre("maría").is_none());
    }
}
