use std::sync::Arc;

use crate::scheduler::{Notifier, SqliteMaintenanceStore};

use super::config::ServiceConfig;

#[derive(Clone)]
pub(super) struct AppState {
    pub(super) config: Arc<ServiceConfig>,
    pub(super) store: Arc<SqliteMaintenanceStore>,
    pub(super) notifier: Arc<dyn Notifier>,
}
