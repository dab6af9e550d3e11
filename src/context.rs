use courier_config::Config;
use std::sync::Arc;

use crate::service::MessageService;

/// Shared state handed to every HTTP handler
#[derive(Clone)]
pub struct AppContext {
    pub service: Arc<MessageService>,
    pub config: Arc<Config>,
}

impl AppContext {
    pub fn new(service: Arc<MessageService>, config: Arc<Config>) -> Self {
        Self { service, config }
    }
}
