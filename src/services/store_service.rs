use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::db::StoragePort;
use crate::error::AppError;
use crate::models::*;
use crate::store::{
    Collection, EntityStore, ExportedSnapshot, Period, Snapshot, SnapshotPatch, StudentRemoval,
};
use crate::sync::{MergeReport, SyncStrategy};

/// Owns the entity store and writes all six collections back to storage
/// after every mutation.
///
/// The mutex is held across the write, so one mutation and its persistence
/// cycle complete before the next mutation starts.
pub struct StoreService {
    store: Mutex<EntityStore>,
    storage: Arc<dyn StoragePort>,
}

impl StoreService {
    /// Restores every collection from storage. A missing or unreadable
    /// collection falls back to its default (seed roster or empty) without
    /// failing the boot.
    pub async fn load(storage: Arc<dyn StoragePort>) -> Result<Self, AppError> {
        let mut store = EntityStore::default();

        for collection in Collection::ALL {
            let key = collection.storage_key();
            match storage.load(key).await? {
                Some(raw) => {
                    if let Err(e) = store.restore_collection(collection, &raw) {
                        warn!("stored {} is unreadable, using defaults: {}", key, e);
                        store.restore_default(collection);
                    }
                }
                None => {
                    debug!("no stored {}, using defaults", key);
                    store.restore_default(collection);
                }
            }
        }

        info!(
            "loaded {} students, {} asatidz, {} attendance, {} progress, {} payments",
            store.students().len(),
            store.asatidz().len(),
            store.attendance().len(),
            store.progress().len(),
            store.payments().len()
        );

        Ok(Self {
            store: Mutex::new(store),
            storage,
        })
    }

    pub fn storage(&self) -> Arc<dyn StoragePort> {
        self.storage.clone()
    }

    pub async fn read<R>(&self, f: impl FnOnce(&EntityStore) -> R) -> R {
        let store = self.store.lock().await;
        f(&store)
    }

    /// Applies `f` to a working copy and persists it. The copy replaces the
    /// live store only once the write succeeded, so a failed write leaves
    /// memory and storage agreeing on the previous state.
    pub async fn mutate<R>(&self, f: impl FnOnce(&mut EntityStore) -> R) -> Result<R, AppError> {
        self.try_mutate(|s| Ok(f(s))).await
    }

    /// Like `mutate`, but skips the write when `f` fails.
    async fn try_mutate<R>(
        &self,
        f: impl FnOnce(&mut EntityStore) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let mut store = self.store.lock().await;
        let mut next = store.clone();
        let result = f(&mut next)?;
        if let Err(e) = persist(self.storage.as_ref(), &next).await {
            warn!("persisting failed, change discarded: {}", e);
            return Err(e);
        }
        *store = next;
        Ok(result)
    }

    pub async fn add_student(&self, profile: StudentProfile) -> Result<Student, AppError> {
        self.mutate(|s| s.add_student(profile)).await
    }

    pub async fn update_student(&self, student: Student) -> Result<Student, AppError> {
        self.try_mutate(|s| {
            if s.update_student(student.clone()) {
                Ok(student)
            } else {
                Err(AppError::NotFound)
            }
        })
        .await
    }

    pub async fn delete_student(&self, id: &str) -> Result<StudentRemoval, AppError> {
        let removal = self
            .try_mutate(|s| s.delete_student(id).ok_or(AppError::NotFound))
            .await?;
        info!("deleted student {}: {:?}", id, removal);
        Ok(removal)
    }

    pub async fn add_asatidz(&self, profile: AsatidzProfile) -> Result<Asatidz, AppError> {
        self.mutate(|s| s.add_asatidz(profile)).await
    }

    pub async fn update_asatidz(&self, ustadz: Asatidz) -> Result<Asatidz, AppError> {
        self.try_mutate(|s| {
            if s.update_asatidz(ustadz.clone()) {
                Ok(ustadz)
            } else {
                Err(AppError::NotFound)
            }
        })
        .await
    }

    pub async fn delete_asatidz(&self, id: &str) -> Result<usize, AppError> {
        let removed = self
            .try_mutate(|s| s.delete_asatidz(id).ok_or(AppError::NotFound))
            .await?;
        info!("deleted asatidz {} with {} attendance records", id, removed);
        Ok(removed)
    }

    pub async fn mark_attendance(&self, req: MarkAttendanceRequest) -> Result<AttendanceRecord, AppError> {
        self.mutate(|s| s.mark_attendance(&req.person_id, req.date, req.status).clone())
            .await
    }

    pub async fn mark_asatidz_attendance(
        &self,
        req: MarkAttendanceRequest,
    ) -> Result<AsatidzAttendanceRecord, AppError> {
        self.mutate(|s| {
            s.mark_asatidz_attendance(&req.person_id, req.date, req.status)
                .clone()
        })
        .await
    }

    pub async fn append_progress(&self, req: NewProgressRequest) -> Result<ProgressRecord, AppError> {
        self.mutate(|s| s.append_progress(req).clone()).await
    }

    pub async fn toggle_payment(
        &self,
        req: TogglePaymentRequest,
        default_amount: u64,
    ) -> Result<PaymentRecord, AppError> {
        let period = period(req.month, req.year)?;
        let amount = req.amount.unwrap_or(default_amount);
        self.mutate(|s| s.toggle_payment(&req.student_id, period, amount).clone())
            .await
    }

    /// Validates every month before touching anything, so a bad month in the
    /// list settles nothing.
    pub async fn bulk_settle(
        &self,
        req: BulkSettleRequest,
        default_amount: u64,
    ) -> Result<Vec<PaymentRecord>, AppError> {
        if req.months.is_empty() {
            return Err(AppError::BadRequest("no months selected".to_string()));
        }
        let periods = req
            .months
            .iter()
            .map(|&m| period(m, req.year))
            .collect::<Result<Vec<_>, _>>()?;
        let amount = req.monthly_amount.unwrap_or(default_amount);

        self.mutate(|s| {
            s.bulk_settle(&req.student_id, &periods, amount);
            periods
                .iter()
                .filter_map(|&p| s.payment_for(&req.student_id, p).cloned())
                .collect()
        })
        .await
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.read(EntityStore::snapshot).await
    }

    pub async fn reduced_snapshot(&self) -> Snapshot {
        self.read(EntityStore::reduced_snapshot).await
    }

    pub async fn export_snapshot(&self) -> ExportedSnapshot {
        ExportedSnapshot {
            snapshot: self.snapshot().await,
            exported_at: Utc::now(),
        }
    }

    /// Restores from a backup file. Anything unreadable is rejected before
    /// local state is touched.
    pub async fn import_snapshot(
        &self,
        raw: &str,
        strategy: &dyn SyncStrategy,
    ) -> Result<MergeReport, AppError> {
        let patch: SnapshotPatch = serde_json::from_str(raw)?;
        if patch.is_empty() {
            return Err(AppError::Deserialization(
                "file contains no TPQ collections".to_string(),
            ));
        }
        let report = self.apply(patch, strategy).await?;
        info!("imported backup: {:?}", report.replaced);
        Ok(report)
    }

    pub async fn apply(
        &self,
        patch: SnapshotPatch,
        strategy: &dyn SyncStrategy,
    ) -> Result<MergeReport, AppError> {
        self.mutate(|s| strategy.merge(s, patch)).await
    }
}

fn period(month: u8, year: i32) -> Result<Period, AppError> {
    Period::new(month, year)
        .ok_or_else(|| AppError::BadRequest(format!("month must be 0-11, got {}", month)))
}

async fn persist(storage: &dyn StoragePort, store: &EntityStore) -> Result<(), AppError> {
    let mut entries = Vec::with_capacity(Collection::ALL.len());
    for collection in Collection::ALL {
        let json = store.collection_json(collection).map_err(|e| {
            error!("failed to serialize {}: {}", collection.storage_key(), e);
            AppError::InternalServerError
        })?;
        entries.push((collection.storage_key(), json));
    }
    storage.save_many(&entries).await
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::db::MemoryStorage;
    use crate::sync::LastWriterWins;

    async fn service() -> (StoreService, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let service = StoreService::load(storage.clone()).await.unwrap();
        (service, storage)
    }

    #[tokio::test]
    async fn test_boot_falls_back_to_seed_and_empty() {
        let (service, _) = service().await;
        let (students, attendance) = service
            .read(|s| (s.students().len(), s.attendance().len()))
            .await;
        assert_eq!(students, 5);
        assert_eq!(attendance, 0);
    }

    #[tokio::test]
    async fn test_corrupt_collection_does_not_block_boot() {
        let storage = Arc::new(
            MemoryStorage::with_entries([
                ("tpq_students", "[{\"broken\""),
                ("tpq_payments", "[]"),
            ])
            .await,
        );
        let service = StoreService::load(storage).await.unwrap();
        assert_eq!(service.read(|s| s.students().len()).await, 5);
    }

    #[tokio::test]
    async fn test_every_mutation_persists_all_collections() {
        let (service, storage) = service().await;
        service
            .mark_attendance(MarkAttendanceRequest {
                person_id: "1".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
                status: AttendanceStatus::Present,
            })
            .await
            .unwrap();

        for collection in Collection::ALL {
            assert!(
                storage.load(collection.storage_key()).await.unwrap().is_some(),
                "{} was not written",
                collection.storage_key()
            );
        }

        let reloaded = StoreService::load(storage).await.unwrap();
        assert_eq!(reloaded.snapshot().await, service.snapshot().await);
    }

    #[tokio::test]
    async fn test_invalid_month_is_rejected_without_writing() {
        let (service, storage) = service().await;
        let result = service
            .bulk_settle(
                BulkSettleRequest {
                    student_id: "1".to_string(),
                    months: vec![0, 12],
                    year: 2025,
                    monthly_amount: None,
                },
                50000,
            )
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(storage.load("tpq_payments").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_toggle_uses_default_fee_when_amount_missing() {
        let (service, _) = service().await;
        let record = service
            .toggle_payment(
                TogglePaymentRequest {
                    student_id: "2".to_string(),
                    month: 6,
                    year: 2025,
                    amount: None,
                },
                45000,
            )
            .await
            .unwrap();
        assert_eq!(record.amount, 45000);
        assert_eq!(record.status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_update_missing_student_is_not_found() {
        let (service, _) = service().await;
        let ghost = Student {
            id: "ghost".to_string(),
            profile: StudentProfile::default(),
        };
        assert!(matches!(
            service.update_student(ghost).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            service.delete_asatidz("ghost").await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_corrupt_import_leaves_state_untouched() {
        let (service, _) = service().await;
        let before = service.snapshot().await;

        let garbage = service.import_snapshot("not json", &LastWriterWins).await;
        assert!(matches!(garbage, Err(AppError::Deserialization(_))));

        let wrong_shape = service
            .import_snapshot(r#"{"students": [{"id": 1}]}"#, &LastWriterWins)
            .await;
        assert!(matches!(wrong_shape, Err(AppError::Deserialization(_))));

        let unrelated = service
            .import_snapshot(r#"{"hello": "world"}"#, &LastWriterWins)
            .await;
        assert!(matches!(unrelated, Err(AppError::Deserialization(_))));

        assert_eq!(service.snapshot().await, before);
    }

    /// Storage that can be switched to reject every write.
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        failing: AtomicBool,
    }

    #[async_trait]
    impl StoragePort for FlakyStorage {
        async fn load(&self, key: &str) -> Result<Option<String>, AppError> {
            self.inner.load(key).await
        }

        async fn save(&self, key: &str, value: &str) -> Result<(), AppError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(AppError::InternalServerError);
            }
            self.inner.save(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), AppError> {
            self.inner.remove(key).await
        }
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_the_change() {
        let storage = Arc::new(FlakyStorage::default());
        let service = StoreService::load(storage.clone()).await.unwrap();
        let toggle = || TogglePaymentRequest {
            student_id: "1".to_string(),
            month: 3,
            year: 2025,
            amount: None,
        };

        storage.failing.store(true, Ordering::SeqCst);
        assert!(service.toggle_payment(toggle(), 50000).await.is_err());
        assert!(service.read(|s| s.payments().is_empty()).await);
        assert!(service.delete_student("1").await.is_err());
        assert_eq!(service.read(|s| s.students().len()).await, 5);

        // Retrying once storage is back settles the month instead of undoing it.
        storage.failing.store(false, Ordering::SeqCst);
        let record = service.toggle_payment(toggle(), 50000).await.unwrap();
        assert_eq!(record.status, PaymentStatus::Paid);

        let reloaded = StoreService::load(storage).await.unwrap();
        assert_eq!(reloaded.snapshot().await, service.snapshot().await);
    }
}
