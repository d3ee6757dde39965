use std::sync::Arc;

use image_optimizer_core::Engine;

use crate::config::ServerConfig;
use crate::loader::Loader;
use crate::storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub storage: Arc<Storage>,
    pub loader: Arc<Loader>,
    pub config: Arc<ServerConfig>,
}
