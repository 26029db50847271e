use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    Asatidz, AsatidzAttendanceRecord, AttendanceRecord, PaymentRecord, ProgressRecord, Student,
};

/// Every business collection at one instant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub students: Vec<Student>,
    pub asatidz: Vec<Asatidz>,
    pub attendance: Vec<AttendanceRecord>,
    pub asatidz_attendance: Vec<AsatidzAttendanceRecord>,
    pub progress: Vec<ProgressRecord>,
    pub payments: Vec<PaymentRecord>,
}

impl Snapshot {
    pub fn size_kb(&self) -> Result<f64, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?.len();
        Ok(bytes as f64 / 1024.0)
    }
}

/// Backup file written by a manual export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedSnapshot {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub exported_at: DateTime<Utc>,
}

/// Body stored in the remote blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSnapshot {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub last_updated: DateTime<Utc>,
}

/// Incoming state from a pull or an import. A collection that is absent from
/// the payload stays `None` and the local copy is kept.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPatch {
    pub students: Option<Vec<Student>>,
    pub asatidz: Option<Vec<Asatidz>>,
    pub attendance: Option<Vec<AttendanceRecord>>,
    pub asatidz_attendance: Option<Vec<AsatidzAttendanceRecord>>,
    pub progress: Option<Vec<ProgressRecord>>,
    pub payments: Option<Vec<PaymentRecord>>,
}

impl SnapshotPatch {
    pub fn is_empty(&self) -> bool {
        self.students.is_none()
            && self.asatidz.is_none()
            && self.attendance.is_none()
            && self.asatidz_attendance.is_none()
            && self.progress.is_none()
            && self.payments.is_none()
    }
}

impl From<Snapshot> for SnapshotPatch {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            students: Some(snapshot.students),
            asatidz: Some(snapshot.asatidz),
            attendance: Some(snapshot.attendance),
            asatidz_attendance: Some(snapshot.asatidz_attendance),
            progress: Some(snapshot.progress),
            payments: Some(snapshot.payments),
        }
    }
}
