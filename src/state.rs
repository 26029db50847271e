use std::sync::Arc;

use crate::report::ReportGenerator;
use crate::services::{SessionService, StoreService, SyncService};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<StoreService>,
    pub sync: Arc<SyncService>,
    pub session: Arc<SessionService>,
    pub reports: Arc<dyn ReportGenerator>,
    /// Default syahriah amount for payment requests that omit one.
    pub monthly_fee: u64,
}
