pub mod auth;
pub mod lider;
pub mod pastor;
