use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[serde(rename = "Hadir")]
    Present,
    #[serde(rename = "Izin")]
    Excused,
    #[serde(rename = "Sakit")]
    Sick,
    #[serde(rename = "Alpa")]
    Absent,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Excused,
        AttendanceStatus::Sick,
        AttendanceStatus::Absent,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Hadir",
            AttendanceStatus::Excused => "Izin",
            AttendanceStatus::Sick => "Sakit",
            AttendanceStatus::Absent => "Alpa",
        }
    }
}

/// One student's presence on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub student_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

/// One staff member's presence on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsatidzAttendanceRecord {
    pub id: String,
    pub asatidz_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceRequest {
    pub person_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}
