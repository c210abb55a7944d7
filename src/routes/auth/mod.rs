mod handler;
mod model;

pub use handler::{buscar_lider, login, register};
