mod handler;
mod model;

pub use handler::{
    create_celula,
    create_lider,
    delete_celula,
    get_celulas,
    get_estadisticas,
    update_celula,
};
