use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::BlobStore;
use crate::error::AppError;

/// `BlobStore` held in memory, with switches to imitate an unreachable or
/// size-limited service.
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<HashMap<String, Value>>,
    next_id: AtomicUsize,
    offline: AtomicBool,
    size_limit: Option<usize>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects any body whose JSON encoding exceeds `bytes`.
    pub fn with_size_limit(bytes: usize) -> Self {
        Self {
            size_limit: Some(bytes),
            ..Self::default()
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn get(&self, id: &str) -> Option<Value> {
        self.blobs.lock().await.get(id).cloned()
    }

    /// Stores `body` under `id` directly, as another device would.
    pub async fn put(&self, id: &str, body: Value) {
        self.blobs.lock().await.insert(id.to_string(), body);
    }

    fn check(&self, body: Option<&Value>) -> Result<(), String> {
        if self.offline.load(Ordering::SeqCst) {
            return Err("network unreachable".to_string());
        }
        if let (Some(limit), Some(body)) = (self.size_limit, body) {
            let size = serde_json::to_vec(body).map(|b| b.len()).unwrap_or(usize::MAX);
            if size > limit {
                return Err(format!("status 413: payload of {} bytes too large", size));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn create(&self, body: &Value) -> Result<String, AppError> {
        self.check(Some(body)).map_err(AppError::RemoteInit)?;
        let id = format!("blob-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.blobs.lock().await.insert(id.clone(), body.clone());
        Ok(id)
    }

    async fn write(&self, id: &str, body: &Value) -> Result<(), AppError> {
        self.check(Some(body)).map_err(AppError::RemoteWrite)?;
        let mut blobs = self.blobs.lock().await;
        match blobs.get_mut(id) {
            Some(slot) => {
                *slot = body.clone();
                Ok(())
            }
            None => Err(AppError::RemoteWrite(format!("status 404: no blob {}", id))),
        }
    }

    async fn read(&self, id: &str) -> Result<Value, AppError> {
        self.check(None).map_err(AppError::RemoteRead)?;
        self.blobs
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::RemoteRead(format!("status 404: no blob {}", id)))
    }
}
