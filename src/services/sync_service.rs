use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::cloud::BlobStore;
use crate::db::SYNC_ID_KEY;
use crate::error::AppError;
use crate::services::StoreService;
use crate::store::{RemoteSnapshot, SnapshotPatch};
use crate::sync::{MergeReport, SyncStrategy};

const MIN_SYNC_ID_LEN: usize = 5;

/// Cloud mirror of the entity store through a shared blob.
///
/// Only one create/push/pull runs at a time; a second call while one is in
/// flight fails with `SyncInProgress` instead of queueing. Nothing is retried.
pub struct SyncService {
    store: Arc<StoreService>,
    remote: Arc<dyn BlobStore>,
    strategy: Arc<dyn SyncStrategy>,
    busy: AtomicBool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushOutcome {
    pub sync_id: String,
    pub last_updated: DateTime<Utc>,
    pub students: usize,
    pub payments: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullOutcome {
    pub sync_id: String,
    pub strategy: &'static str,
    pub report: MergeReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub sync_id: Option<String>,
    pub is_syncing: bool,
    /// Size of the full local snapshot, photos included.
    pub data_size_kb: f64,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SyncService {
    pub fn new(
        store: Arc<StoreService>,
        remote: Arc<dyn BlobStore>,
        strategy: Arc<dyn SyncStrategy>,
    ) -> Self {
        Self {
            store,
            remote,
            strategy,
            busy: AtomicBool::new(false),
        }
    }

    pub fn strategy(&self) -> &dyn SyncStrategy {
        self.strategy.as_ref()
    }

    pub fn is_syncing(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<BusyGuard<'_>, AppError> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| AppError::SyncInProgress)?;
        Ok(BusyGuard(&self.busy))
    }

    pub async fn sync_id(&self) -> Result<Option<String>, AppError> {
        self.store.storage().load(SYNC_ID_KEY).await
    }

    pub async fn status(&self) -> Result<SyncStatus, AppError> {
        let data_size_kb = self.store.snapshot().await.size_kb()?;
        Ok(SyncStatus {
            sync_id: self.sync_id().await?,
            is_syncing: self.is_syncing(),
            data_size_kb: (data_size_kb * 100.0).round() / 100.0,
        })
    }

    /// Forgets the sync key. Local data stays as it is.
    pub async fn disconnect(&self) -> Result<(), AppError> {
        self.store.storage().remove(SYNC_ID_KEY).await?;
        info!("sync key removed");
        Ok(())
    }

    async fn remote_body(&self) -> Result<(serde_json::Value, RemoteSnapshot), AppError> {
        let payload = RemoteSnapshot {
            snapshot: self.store.reduced_snapshot().await,
            last_updated: Utc::now(),
        };
        let body = serde_json::to_value(&payload).map_err(|e| {
            tracing::error!("failed to encode remote snapshot: {}", e);
            AppError::InternalServerError
        })?;
        Ok((body, payload))
    }

    /// Uploads the reduced snapshot as a new blob and keeps its id as this
    /// device's sync key.
    pub async fn create_remote(&self) -> Result<String, AppError> {
        let _guard = self.begin()?;
        info!("Creating remote blob");

        let (body, _) = self.remote_body().await?;
        let sync_id = self.remote.create(&body).await?;
        self.store.storage().save(SYNC_ID_KEY, &sync_id).await?;

        info!("Remote blob created, sync key {}", sync_id);
        Ok(sync_id)
    }

    /// Overwrites the remote blob with the reduced local snapshot.
    pub async fn push(&self, sync_id: Option<&str>) -> Result<PushOutcome, AppError> {
        let _guard = self.begin()?;
        let sync_id = self.resolve_id(sync_id).await?;
        info!("Pushing local snapshot to {}", sync_id);

        let (body, payload) = self.remote_body().await?;
        self.remote.write(&sync_id, &body).await?;

        let outcome = PushOutcome {
            sync_id,
            last_updated: payload.last_updated,
            students: payload.snapshot.students.len(),
            payments: payload.snapshot.payments.len(),
        };
        info!("Push completed: {:?}", outcome);
        Ok(outcome)
    }

    /// Fetches the remote blob and merges it into local state with the
    /// configured strategy. Supplying a key joins that blob: the key is kept
    /// as this device's sync key, but only after the pull succeeded.
    pub async fn pull(&self, sync_id: Option<&str>) -> Result<PullOutcome, AppError> {
        let _guard = self.begin()?;
        let joining = sync_id.is_some();
        let sync_id = self.resolve_id(sync_id).await?;
        info!("Pulling remote snapshot from {}", sync_id);

        let body = self.remote.read(&sync_id).await?;
        let patch: SnapshotPatch = serde_json::from_value(body).map_err(|e| {
            warn!("remote blob {} has an unexpected shape: {}", sync_id, e);
            AppError::RemoteRead(format!("unexpected payload: {}", e))
        })?;

        let report = self.store.apply(patch, self.strategy.as_ref()).await?;
        if joining {
            self.store.storage().save(SYNC_ID_KEY, &sync_id).await?;
        }

        info!(
            "Pull completed: replaced {:?}, kept {} local photos",
            report.replaced, report.photos_preserved
        );
        Ok(PullOutcome {
            sync_id,
            strategy: self.strategy.name(),
            report,
        })
    }

    async fn resolve_id(&self, explicit: Option<&str>) -> Result<String, AppError> {
        match explicit {
            Some(raw) => {
                let id = raw.trim();
                if id.chars().count() < MIN_SYNC_ID_LEN {
                    return Err(AppError::BadRequest("sync key is not valid".to_string()));
                }
                Ok(id.to_string())
            }
            None => self
                .sync_id()
                .await?
                .ok_or_else(|| AppError::BadRequest("no sync key configured".to_string())),
        }
    }
}
