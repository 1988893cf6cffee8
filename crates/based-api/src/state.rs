use std::sync::Arc;

use based_persist::PersistenceClient;

use crate::config::Config;
use crate::service::ChatService;

/// Shared application state passed to all handlers
///
/// Every service is built once at startup and shared through `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub persist: Arc<dyn PersistenceClient>,
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(config: Config, persist: Arc<dyn PersistenceClient>, chat: ChatService) -> Self {
        Self {
            config: Arc::new(config),
            persist,
            chat: Arc::new(chat),
        }
    }
}
