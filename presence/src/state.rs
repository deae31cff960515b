use std::sync::Arc;

use crate::config::Config;
use crate::services::reaper::OrphanReaper;
use crate::services::session_log::SessionLogReader;
use crate::services::termination::TerminationService;
use crate::store::PresenceStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PresenceStore>,
    pub termination: Arc<TerminationService>,
    pub reaper: Arc<OrphanReaper>,
    pub session_logs: Arc<SessionLogReader>,
    pub config: Config,
}

impl AppState {
    /// Wires the administrative services around one shared store handle.
    pub fn new(store: Arc<dyn PresenceStore>, config: Config) -> Self {
        let termination = Arc::new(TerminationService::new(Arc::clone(&store)));
        let reaper = Arc::new(OrphanReaper::new(
            Arc::clone(&store),
            Arc::clone(&termination),
            config.abandoned_after(),
        ));
        let session_logs = Arc::new(SessionLogReader::new(
            Arc::clone(&store),
            config.session_log_page_size,
        ));
        Self {
            store,
            termination,
            reaper,
            session_logs,
            config,
        }
    }
}
