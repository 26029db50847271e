use chrono::NaiveDate;

use super::roster::new_id;
use super::{EntityStore, Keyed};
use crate::models::{AsatidzAttendanceRecord, AttendanceRecord, AttendanceStatus};

impl Keyed for AttendanceRecord {
    type Key = (String, NaiveDate);

    fn key(&self) -> Self::Key {
        (self.student_id.clone(), self.date)
    }
}

impl Keyed for AsatidzAttendanceRecord {
    type Key = (String, NaiveDate);

    fn key(&self) -> Self::Key {
        (self.asatidz_id.clone(), self.date)
    }
}

impl EntityStore {
    /// Records a student's status for a day. A second mark for the same
    /// (student, day) overwrites the status of the existing record.
    pub fn mark_attendance(
        &mut self,
        student_id: &str,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> &AttendanceRecord {
        self.attendance.upsert_with(
            (student_id.to_string(), date),
            || AttendanceRecord {
                id: new_id(),
                student_id: student_id.to_string(),
                date,
                status,
            },
            |existing| existing.status = status,
        )
    }

    pub fn mark_asatidz_attendance(
        &mut self,
        asatidz_id: &str,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> &AsatidzAttendanceRecord {
        self.asatidz_attendance.upsert_with(
            (asatidz_id.to_string(), date),
            || AsatidzAttendanceRecord {
                id: new_id(),
                asatidz_id: asatidz_id.to_string(),
                date,
                status,
            },
            |existing| existing.status = status,
        )
    }

    pub fn attendance_on(&self, date: NaiveDate) -> Vec<&AttendanceRecord> {
        self.attendance.iter().filter(|a| a.date == date).collect()
    }

    pub fn asatidz_attendance_on(&self, date: NaiveDate) -> Vec<&AsatidzAttendanceRecord> {
        self.asatidz_attendance
            .iter()
            .filter(|a| a.date == date)
            .collect()
    }

    pub fn attendance_for_student(&self, student_id: &str) -> Vec<&AttendanceRecord> {
        self.attendance
            .iter()
            .filter(|a| a.student_id == student_id)
            .collect()
    }
}
