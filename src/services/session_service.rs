use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::verify_login;
use crate::config::AdminAccount;
use crate::db::{SESSION_KEY, StoragePort};
use crate::error::AppError;
use crate::models::{LoginRequest, User};
use crate::services::StoreService;

/// The logged-in user, persisted next to the business collections.
pub struct SessionService {
    storage: Arc<dyn StoragePort>,
    admin: AdminAccount,
}

impl SessionService {
    pub fn new(storage: Arc<dyn StoragePort>, admin: AdminAccount) -> Self {
        Self { storage, admin }
    }

    pub async fn login(&self, store: &StoreService, req: LoginRequest) -> Result<User, AppError> {
        let user = store
            .read(|s| verify_login(&req, s.students(), s.asatidz(), &self.admin))
            .await
            .ok_or(AppError::Unauthorized)?;

        let raw = serde_json::to_string(&user)?;
        self.storage.save(SESSION_KEY, &raw).await?;
        info!("{} logged in as {:?}", user.username, user.role);
        Ok(user)
    }

    /// The stored session, if any. A session that no longer parses is
    /// discarded.
    pub async fn current(&self) -> Result<Option<User>, AppError> {
        let Some(raw) = self.storage.load(SESSION_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!("stored session is unreadable, clearing it: {}", e);
                self.storage.remove(SESSION_KEY).await?;
                Ok(None)
            }
        }
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.storage.remove(SESSION_KEY).await
    }
}
