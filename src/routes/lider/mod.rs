mod handler;
mod model;

pub use handler::{
    add_colider,
    add_miembro,
    get_asistencias,
    mi_celula,
    registrar_asistencia,
    remove_colider,
    remove_miembro,
    set_miembro_rol,
};
