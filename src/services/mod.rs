pub mod session_service;
pub mod store_service;
pub mod sync_service;

pub use session_service::SessionService;
pub use store_service::StoreService;
pub use sync_service::{PullOutcome, PushOutcome, SyncService, SyncStatus};
