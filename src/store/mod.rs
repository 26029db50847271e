pub mod attendance;
pub mod ledger;
pub mod payments;
pub mod progress;
pub mod roster;
pub mod seed;
pub mod snapshot;

use serde::{Deserialize, Serialize};

use crate::models::{
    Asatidz, AsatidzAttendanceRecord, AttendanceRecord, PaymentRecord, ProgressRecord, Student,
};

pub use ledger::{Keyed, UniqueLedger};
pub use payments::Period;
pub use roster::StudentRemoval;
pub use snapshot::{ExportedSnapshot, RemoteSnapshot, Snapshot, SnapshotPatch};

/// The six business collections, each persisted under its own key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Students,
    Asatidz,
    Attendance,
    AsatidzAttendance,
    Progress,
    Payments,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Students,
        Collection::Asatidz,
        Collection::Attendance,
        Collection::AsatidzAttendance,
        Collection::Progress,
        Collection::Payments,
    ];

    pub fn storage_key(&self) -> &'static str {
        match self {
            Collection::Students => "tpq_students",
            Collection::Asatidz => "tpq_asatidz",
            Collection::Attendance => "tpq_attendance",
            Collection::AsatidzAttendance => "tpq_asatidz_attendance",
            Collection::Progress => "tpq_progress",
            Collection::Payments => "tpq_payments",
        }
    }
}

/// In-memory state of the institution: roster plus every record keyed to it.
///
/// All mutation goes through the engines in the submodules. Foreign keys are
/// plain id strings; the only integrity rule is the cascade performed by the
/// roster deletes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityStore {
    pub(crate) students: Vec<Student>,
    pub(crate) asatidz: Vec<Asatidz>,
    pub(crate) attendance: UniqueLedger<AttendanceRecord>,
    pub(crate) asatidz_attendance: UniqueLedger<AsatidzAttendanceRecord>,
    /// Most recent entry first.
    pub(crate) progress: Vec<ProgressRecord>,
    pub(crate) payments: UniqueLedger<PaymentRecord>,
}

impl EntityStore {
    /// A fresh store holding the built-in roster and no records.
    pub fn seeded() -> Self {
        Self {
            students: seed::students(),
            asatidz: seed::asatidz(),
            ..Self::default()
        }
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn asatidz(&self) -> &[Asatidz] {
        &self.asatidz
    }

    pub fn attendance(&self) -> &[AttendanceRecord] {
        self.attendance.as_slice()
    }

    pub fn asatidz_attendance(&self) -> &[AsatidzAttendanceRecord] {
        self.asatidz_attendance.as_slice()
    }

    pub fn progress(&self) -> &[ProgressRecord] {
        &self.progress
    }

    pub fn payments(&self) -> &[PaymentRecord] {
        self.payments.as_slice()
    }

    pub fn find_student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn find_asatidz(&self, id: &str) -> Option<&Asatidz> {
        self.asatidz.iter().find(|u| u.id == id)
    }

    /// JSON array for one collection, as written to durable storage.
    pub fn collection_json(&self, collection: Collection) -> Result<String, serde_json::Error> {
        match collection {
            Collection::Students => serde_json::to_string(&self.students),
            Collection::Asatidz => serde_json::to_string(&self.asatidz),
            Collection::Attendance => serde_json::to_string(&self.attendance),
            Collection::AsatidzAttendance => serde_json::to_string(&self.asatidz_attendance),
            Collection::Progress => serde_json::to_string(&self.progress),
            Collection::Payments => serde_json::to_string(&self.payments),
        }
    }

    /// Replaces one collection from its stored JSON. On error the collection
    /// is left as it was.
    pub fn restore_collection(
        &mut self,
        collection: Collection,
        raw: &str,
    ) -> Result<(), serde_json::Error> {
        match collection {
            Collection::Students => self.students = serde_json::from_str(raw)?,
            Collection::Asatidz => self.asatidz = serde_json::from_str(raw)?,
            Collection::Attendance => self.attendance = serde_json::from_str(raw)?,
            Collection::AsatidzAttendance => self.asatidz_attendance = serde_json::from_str(raw)?,
            Collection::Progress => self.progress = serde_json::from_str(raw)?,
            Collection::Payments => self.payments = serde_json::from_str(raw)?,
        }
        Ok(())
    }

    /// Resets one collection to its boot default: the seed roster for
    /// students and staff, empty for the record collections.
    pub fn restore_default(&mut self, collection: Collection) {
        match collection {
            Collection::Students => self.students = seed::students(),
            Collection::Asatidz => self.asatidz = seed::asatidz(),
            Collection::Attendance => self.attendance = UniqueLedger::default(),
            Collection::AsatidzAttendance => self.asatidz_attendance = UniqueLedger::default(),
            Collection::Progress => self.progress = Vec::new(),
            Collection::Payments => self.payments = UniqueLedger::default(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            students: self.students.clone(),
            asatidz: self.asatidz.clone(),
            attendance: self.attendance.to_vec(),
            asatidz_attendance: self.asatidz_attendance.to_vec(),
            progress: self.progress.clone(),
            payments: self.payments.to_vec(),
        }
    }

    /// Snapshot with every photo stripped, small enough for the remote blob.
    pub fn reduced_snapshot(&self) -> Snapshot {
        Snapshot {
            students: self.students.iter().map(Student::without_photo).collect(),
            asatidz: self.asatidz.iter().map(Asatidz::without_photo).collect(),
            ..self.snapshot()
        }
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            students: snapshot.students,
            asatidz: snapshot.asatidz,
            attendance: snapshot.attendance.into(),
            asatidz_attendance: snapshot.asatidz_attendance.into(),
            progress: snapshot.progress,
            payments: snapshot.payments.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, StudentProfile};
    use chrono::NaiveDate;

    #[test]
    fn test_restore_collection_rejects_corrupt_json_without_touching_state() {
        let mut store = EntityStore::seeded();
        let before = store.students().to_vec();

        let result = store.restore_collection(Collection::Students, "{not json");
        assert!(result.is_err());
        assert_eq!(store.students(), before.as_slice());
    }

    #[test]
    fn test_collection_json_keeps_numeric_fields_numeric() {
        let mut store = EntityStore::seeded();
        let period = Period::new(2, 2025).unwrap();
        store.toggle_payment("1", period, 50000);

        let raw = store.collection_json(Collection::Payments).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value[0]["month"].is_u64());
        assert!(value[0]["year"].is_i64());
        assert!(value[0]["amount"].is_u64());

        let mut restored = EntityStore::default();
        restored.restore_collection(Collection::Payments, &raw).unwrap();
        assert_eq!(restored.payments(), store.payments());
    }

    #[test]
    fn test_reduced_snapshot_strips_photos_only() {
        let mut store = EntityStore::default();
        let student = store.add_student(StudentProfile {
            name: "Hasan".to_string(),
            class_name: "Iqra 2".to_string(),
            join_date: "2024-07-01".to_string(),
            photo: Some("data:image/png;base64,AAAA".to_string()),
            ..StudentProfile::default()
        });
        let day = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        store.mark_attendance(&student.id, day, AttendanceStatus::Present);

        let reduced = store.reduced_snapshot();
        assert_eq!(reduced.students[0].profile.photo, None);
        assert_eq!(reduced.students[0].profile.name, "Hasan");
        assert_eq!(reduced.attendance.len(), 1);
        assert!(store.students()[0].profile.photo.is_some());
    }
}
