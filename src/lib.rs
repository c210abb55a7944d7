use std::sync::Arc;

use config::Config;
use store::MemoryStore;

pub mod config;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod stats;
pub mod store;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub config: Config,
}
