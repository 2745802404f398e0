//! Shared application state handed to every handler, the teacher's
//! `AppState { config, engine_registry }` pattern generalized to the
//! engine runtime's coordinator/manager/reload/state-publisher quartet.

use std::sync::Arc;

use engine_core::{Coordinator, ReloadManager, StatePublisher};

use crate::config::Config;

pub struct AppState {
    pub config: Config,
    pub coordinator: Arc<Coordinator>,
    pub reload: Arc<ReloadManager>,
    pub state_publisher: Arc<StatePublisher>,
}

impl AppState {
    pub fn new(
        config: Config,
        coordinator: Arc<Coordinator>,
        reload: Arc<ReloadManager>,
        state_publisher: Arc<StatePublisher>,
    ) -> Self {
        Self {
            config,
            coordinator,
            reload,
            state_publisher,
        }
    }
}
